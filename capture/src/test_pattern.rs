//! Software camera producing a gradient test pattern

use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use image::{ImageBuffer, Rgba, RgbaImage};
use tracing::debug;

use crate::device::{CameraDevice, CameraError, Dimensions, MediaConstraints, MediaStream};

/// Camera that renders a gradient instead of reading hardware
///
/// Used for development hosts without a camera and for exercising the capture
/// lifecycle. It counts live streams so callers can check that every stream it
/// handed out was eventually stopped.
#[derive(Debug)]
pub struct TestPatternCamera {
    width: AtomicU32,
    height: AtomicU32,
    permission_granted: AtomicBool,
    requests: AtomicUsize,
    next_stream: AtomicU64,
    live_streams: Arc<AtomicUsize>,
}

impl TestPatternCamera {
    /// Camera that grants access and streams at `dimensions`
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            width: AtomicU32::new(dimensions.width),
            height: AtomicU32::new(dimensions.height),
            permission_granted: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
            next_stream: AtomicU64::new(1),
            live_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Camera whose permission prompt is always refused
    #[must_use]
    pub fn denied() -> Self {
        let camera = Self::new(Dimensions::new(640, 480));
        camera.set_permission_granted(false);
        camera
    }

    /// Grants or refuses subsequent requests
    pub fn set_permission_granted(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }

    /// Changes the size of streams handed out from now on
    pub fn set_dimensions(&self, dimensions: Dimensions) {
        self.width.store(dimensions.width, Ordering::SeqCst);
        self.height.store(dimensions.height, Ordering::SeqCst);
    }

    /// Number of `get_user_media` calls so far
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of streams whose tracks have not been stopped
    #[must_use]
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    /// Opens a stream directly, bypassing the permission check
    #[must_use]
    pub fn open_stream(&self) -> TestPatternStream {
        let id = self.next_stream.fetch_add(1, Ordering::SeqCst);
        self.live_streams.fetch_add(1, Ordering::SeqCst);

        TestPatternStream {
            id: format!("test-pattern-{id}"),
            dimensions: Dimensions::new(
                self.width.load(Ordering::SeqCst),
                self.height.load(Ordering::SeqCst),
            ),
            live: AtomicBool::new(true),
            live_streams: Arc::clone(&self.live_streams),
        }
    }
}

#[async_trait]
impl CameraDevice for TestPatternCamera {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if !constraints.video {
            return Err(CameraError::Device("no video track requested".to_string()));
        }
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }

        let stream = self.open_stream();
        debug!(id = %stream.id, dimensions = %stream.dimensions, "Opened test pattern stream");
        Ok(Box::new(stream))
    }
}

/// Stream handed out by [`TestPatternCamera`]
#[derive(Debug)]
pub struct TestPatternStream {
    id: String,
    dimensions: Dimensions,
    live: AtomicBool,
    live_streams: Arc<AtomicUsize>,
}

impl MediaStream for TestPatternStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn video_dimensions(&self) -> Option<Dimensions> {
        Some(self.dimensions)
    }

    fn read_frame(&self) -> Option<RgbaImage> {
        if !self.is_live() || self.dimensions.is_empty() {
            return None;
        }

        let dimensions = self.dimensions;
        Some(ImageBuffer::from_fn(
            dimensions.width,
            dimensions.height,
            |x, y| gradient_pixel(x, y, dimensions),
        ))
    }

    fn stop_all_tracks(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
            debug!(id = %self.id, "Stopped test pattern stream");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Colour of the test pattern at `(x, y)` on a non-empty surface
fn gradient_pixel(x: u32, y: u32, dimensions: Dimensions) -> Rgba<u8> {
    let scale = |offset: u64, extent: u64| u8::try_from(offset * 255 / extent).unwrap_or(u8::MAX);

    let (x, y) = (u64::from(x), u64::from(y));
    let (width, height) = (u64::from(dimensions.width), u64::from(dimensions.height));
    Rgba([
        scale(x, width),
        scale(y, height),
        scale(x + y, width + height),
        255,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_denied_camera_refuses_access() {
        let camera = TestPatternCamera::denied();

        let result = camera.get_user_media(MediaConstraints::video_only()).await;

        assert!(matches!(result, Err(CameraError::PermissionDenied)));
        assert_eq!(camera.requests(), 1);
        assert_eq!(camera.live_streams(), 0);
    }

    #[tokio::test]
    async fn test_stream_reports_configured_dimensions() {
        let camera = TestPatternCamera::new(Dimensions::new(320, 240));

        let stream = camera
            .get_user_media(MediaConstraints::video_only())
            .await
            .unwrap();

        assert_eq!(stream.video_dimensions(), Some(Dimensions::new(320, 240)));
        assert_eq!(stream.read_frame().unwrap().dimensions(), (320, 240));
    }

    #[test]
    fn test_gradient_spans_the_surface() {
        let dimensions = Dimensions::new(4, 2);

        assert_eq!(gradient_pixel(0, 0, dimensions), Rgba([0, 0, 0, 255]));
        assert_eq!(gradient_pixel(2, 1, dimensions), Rgba([127, 127, 127, 255]));
    }

    #[test]
    fn test_gradient_handles_largest_surface() {
        let dimensions = Dimensions::new(u32::MAX, u32::MAX);

        assert_eq!(
            gradient_pixel(u32::MAX - 1, u32::MAX - 1, dimensions),
            Rgba([254, 254, 254, 255])
        );
    }

    #[test]
    fn test_stopping_is_idempotent() {
        let camera = TestPatternCamera::new(Dimensions::new(8, 8));
        let stream = camera.open_stream();
        assert_eq!(camera.live_streams(), 1);

        stream.stop_all_tracks();
        stream.stop_all_tracks();

        assert_eq!(camera.live_streams(), 0);
        assert!(stream.read_frame().is_none());
    }
}
