//! Capture lifecycle: acquire a stream, freeze a frame, restart

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::device::{CameraDevice, CameraError, MediaConstraints, MediaStream};
use crate::frame::{CapturedFrame, Download};
use crate::notifier::{Notifier, CAMERA_UNAVAILABLE_ALERT};

/// Where the session is in its lifecycle
///
/// `Initializing` and `Streaming` both show the live preview; a failed acquisition
/// also ends in `Streaming`, just without a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Waiting for camera access
    Initializing,
    /// Showing the live feed
    Streaming,
    /// Holding a still frame
    Captured,
}

/// Result of one camera acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The stream is attached to the session
    Streaming,
    /// The camera could not be opened
    Failed(CameraError),
    /// A newer acquisition superseded this one; its stream was stopped
    Stale,
}

struct SessionState {
    generation: u64,
    state: CaptureState,
    stream: Option<Box<dyn MediaStream>>,
    frame: Option<CapturedFrame>,
}

impl SessionState {
    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_all_tracks();
            debug!(id = %stream.id(), "Released camera stream");
        }
    }
}

/// One camera view with at most one stream and at most one still frame
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct CaptureSession {
    device: Arc<dyn CameraDevice>,
    notifier: Arc<dyn Notifier>,
    inner: Arc<Mutex<SessionState>>,
}

impl CaptureSession {
    /// Creates an unmounted session
    #[must_use]
    pub fn new(device: Arc<dyn CameraDevice>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            device,
            notifier,
            inner: Arc::new(Mutex::new(SessionState {
                generation: 0,
                state: CaptureState::Initializing,
                stream: None,
                frame: None,
            })),
        }
    }

    /// Requests the camera for the first time
    pub async fn mount(&self) -> AcquireOutcome {
        self.acquire().await
    }

    /// Discards the held still and requests a fresh stream
    pub async fn restart(&self) -> AcquireOutcome {
        info!("Restarting camera");
        self.acquire().await
    }

    /// Releases the stream and drops the still; in-flight acquisitions become stale
    pub async fn unmount(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.release_stream();
        inner.frame = None;
        inner.state = CaptureState::Initializing;
    }

    #[instrument(skip(self))]
    async fn acquire(&self) -> AcquireOutcome {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            // Never hold two device handles at once
            inner.release_stream();
            inner.frame = None;
            inner.state = CaptureState::Initializing;
            inner.generation
        };

        debug!(generation, "Requesting camera access");
        let result = self
            .device
            .get_user_media(MediaConstraints::video_only())
            .await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            if let Ok(stream) = result {
                stream.stop_all_tracks();
            }
            debug!(
                generation,
                current = inner.generation,
                "Discarding stale camera acquisition"
            );
            return AcquireOutcome::Stale;
        }

        inner.state = CaptureState::Streaming;
        match result {
            Ok(stream) => {
                info!(id = %stream.id(), dimensions = ?stream.video_dimensions(), "Camera stream attached");
                inner.stream = Some(stream);
                AcquireOutcome::Streaming
            }
            Err(CameraError::Unsupported) => {
                warn!("Media devices unsupported, live preview stays empty");
                AcquireOutcome::Failed(CameraError::Unsupported)
            }
            Err(err) => {
                drop(inner);
                warn!("Camera unavailable: {err}");
                self.notifier.alert(CAMERA_UNAVAILABLE_ALERT);
                AcquireOutcome::Failed(err)
            }
        }
    }

    /// Freezes the current video frame
    ///
    /// Does nothing and returns `None` unless the session is streaming from a live
    /// stream with known, non-zero dimensions. On success the stream is released.
    pub async fn capture(&self) -> Option<CapturedFrame> {
        let mut inner = self.inner.lock().await;

        if inner.frame.is_some() {
            debug!("Capture ignored, a still is already held");
            return None;
        }
        let Some(stream) = inner.stream.as_ref().filter(|stream| stream.is_live()) else {
            debug!("Capture ignored, no live stream");
            return None;
        };
        let Some(dimensions) = stream.video_dimensions().filter(|d| !d.is_empty()) else {
            debug!("Capture ignored, video dimensions not known yet");
            return None;
        };
        let Some(pixels) = stream.read_frame() else {
            debug!("Capture ignored, stream produced no frame");
            return None;
        };

        let frame = match CapturedFrame::from_video_frame(&pixels, dimensions, Utc::now()) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Capture failed: {err}");
                return None;
            }
        };

        inner.release_stream();
        inner.frame = Some(frame.clone());
        inner.state = CaptureState::Captured;
        info!(%dimensions, size = frame.png_bytes().len(), "Captured still frame");

        Some(frame)
    }

    /// The held still packaged for saving, only while captured
    pub async fn download(&self) -> Option<Download> {
        self.inner
            .lock()
            .await
            .frame
            .as_ref()
            .map(CapturedFrame::download)
    }

    /// Current lifecycle state
    pub async fn state(&self) -> CaptureState {
        self.inner.lock().await.state
    }

    /// The held still, if any
    pub async fn frame(&self) -> Option<CapturedFrame> {
        self.inner.lock().await.frame.clone()
    }

    /// Whether a stream is attached
    pub async fn has_stream(&self) -> bool {
        self.inner.lock().await.stream.is_some()
    }

    /// Identifier of the attached stream
    pub async fn stream_id(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .stream
            .as_ref()
            .map(|stream| stream.id())
    }

    /// Number of acquisitions started so far, including unmounts
    pub async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }
}
