//! Camera seam

use std::fmt;

use async_trait::async_trait;
use image::RgbaImage;
use thiserror::Error;

/// Pixel size of a video frame or raster surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Creates a new size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either side is zero, as reported by a stream whose metadata has not loaded yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which kinds of track to request from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    /// Request a video track
    pub video: bool,
    /// Request an audio track
    pub audio: bool,
}

impl MediaConstraints {
    /// Video without audio
    #[must_use]
    pub const fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }
}

/// Reasons a camera stream could not be acquired
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The user or the host refused camera access
    #[error("camera permission denied")]
    PermissionDenied,

    /// No camera is attached
    #[error("no camera device found")]
    NotFound,

    /// The host has no media devices API at all
    #[error("media devices are not supported on this host")]
    Unsupported,

    /// Any other device failure
    #[error("camera device error: {0}")]
    Device(String),
}

/// A live camera stream holding a hardware handle until its tracks are stopped
pub trait MediaStream: Send + Sync {
    /// Stable identifier of the stream
    fn id(&self) -> String;

    /// Intrinsic size of the video track, `None` until known
    fn video_dimensions(&self) -> Option<Dimensions>;

    /// Current video frame, `None` once the stream has stopped
    fn read_frame(&self) -> Option<RgbaImage>;

    /// Stops every track and releases the hardware handle
    fn stop_all_tracks(&self);

    /// Whether any track is still running
    fn is_live(&self) -> bool;
}

/// Source of camera streams
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Requests a new stream, suspending until the host grants or refuses access
    ///
    /// # Errors
    ///
    /// Returns `CameraError` when access is refused or no device is available
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}
