//! Hardware camera backed by `nokhwa`
//!
//! `nokhwa` cameras are not `Send`, so every stream gets a dedicated capture
//! thread that owns the device handle. The thread keeps the latest decoded frame
//! in a shared slot and closes the device once the stream is stopped or dropped.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
};

use async_trait::async_trait;
use image::{DynamicImage, RgbImage, RgbaImage};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera, NokhwaError,
};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::device::{CameraDevice, CameraError, Dimensions, MediaConstraints, MediaStream};

/// Camera attached to the host, opened through the platform capture API
#[derive(Debug)]
pub struct NativeCamera {
    index: u32,
    next_stream: AtomicU64,
}

impl NativeCamera {
    /// Camera at `index` in the platform's device list, `0` being the default one
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            next_stream: AtomicU64::new(1),
        }
    }
}

impl Default for NativeCamera {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl CameraDevice for NativeCamera {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        if !constraints.video {
            return Err(CameraError::Device("no video track requested".to_string()));
        }

        let id = format!(
            "native-{}-{}",
            self.index,
            self.next_stream.fetch_add(1, Ordering::SeqCst)
        );
        let shared = Arc::new(SharedFrame::default());
        let (opened_tx, opened_rx) = oneshot::channel();

        let index = self.index;
        let worker_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name(id.clone())
            .spawn(move || run_capture(index, &worker_shared, opened_tx))
            .map_err(|e| CameraError::Device(e.to_string()))?;

        let dimensions = opened_rx
            .await
            .map_err(|_| CameraError::Device("capture thread exited".to_string()))??;

        debug!(%id, %dimensions, "Opened native camera stream");
        Ok(Box::new(NativeStream {
            id,
            dimensions,
            shared,
        }))
    }
}

/// Frame slot shared between a stream and its capture thread
#[derive(Default)]
struct SharedFrame {
    stopped: AtomicBool,
    latest: Mutex<Option<RgbaImage>>,
}

/// Stream handed out by [`NativeCamera`]
pub struct NativeStream {
    id: String,
    dimensions: Dimensions,
    shared: Arc<SharedFrame>,
}

impl MediaStream for NativeStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn video_dimensions(&self) -> Option<Dimensions> {
        Some(self.dimensions)
    }

    fn read_frame(&self) -> Option<RgbaImage> {
        if !self.is_live() {
            return None;
        }
        self.shared
            .latest
            .lock()
            .ok()
            .and_then(|frame| frame.clone())
    }

    fn stop_all_tracks(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            debug!(id = %self.id, "Stopping native camera stream");
        }
    }

    fn is_live(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

/// Body of the capture thread
fn run_capture(
    index: u32,
    shared: &SharedFrame,
    opened: oneshot::Sender<Result<Dimensions, CameraError>>,
) {
    let mut camera = match open_camera(index) {
        Ok(camera) => camera,
        Err(err) => {
            let _ = opened.send(Err(err));
            return;
        }
    };

    let resolution = camera.resolution();
    let dimensions = Dimensions::new(resolution.width(), resolution.height());
    if opened.send(Ok(dimensions)).is_err() {
        // Requester went away before the device opened
        shared.stopped.store(true, Ordering::SeqCst);
    }

    while !shared.stopped.load(Ordering::SeqCst) {
        let decoded = camera
            .frame()
            .and_then(|buffer| buffer.decode_image::<RgbFormat>());

        match decoded {
            Ok(rgb) => {
                let (width, height) = (rgb.width(), rgb.height());
                if let (Some(frame), Ok(mut latest)) =
                    (rgb_to_rgba(width, height, rgb.into_raw()), shared.latest.lock())
                {
                    *latest = Some(frame);
                }
            }
            Err(err) => {
                warn!(index, "Camera frame read failed, closing stream: {err}");
                shared.stopped.store(true, Ordering::SeqCst);
            }
        }
    }

    if let Err(err) = camera.stop_stream() {
        warn!(index, "Failed to close camera: {err}");
    }
    debug!(index, "Released native camera");
}

fn open_camera(index: u32) -> Result<Camera, CameraError> {
    if !nokhwa::nokhwa_check() {
        return Err(CameraError::PermissionDenied);
    }

    let devices = nokhwa::query(ApiBackend::Auto).map_err(camera_error)?;
    if usize::try_from(index).map_or(true, |index| index >= devices.len()) {
        return Err(CameraError::NotFound);
    }

    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = Camera::new(CameraIndex::Index(index), requested).map_err(camera_error)?;
    camera.open_stream().map_err(camera_error)?;
    Ok(camera)
}

fn camera_error(err: NokhwaError) -> CameraError {
    match err {
        NokhwaError::OpenDeviceError(..) => CameraError::NotFound,
        NokhwaError::UnsupportedOperationError(_) | NokhwaError::NotImplementedError(_) => {
            CameraError::Unsupported
        }
        other => CameraError::Device(other.to_string()),
    }
}

/// Widens a packed RGB frame to RGBA, `None` when the buffer does not match the size
fn rgb_to_rgba(width: u32, height: u32, raw: Vec<u8>) -> Option<RgbaImage> {
    RgbImage::from_raw(width, height, raw).map(|rgb| DynamicImage::ImageRgb8(rgb).into_rgba8())
}
