//! Camera capture for `MycoSCAN`
//!
//! A [`CaptureSession`] owns one camera stream at a time, freezes a single still
//! frame on request, and hands that frame out as a downloadable PNG. The camera
//! itself sits behind [`CameraDevice`]. The `native-camera` feature adds
//! `NativeCamera` for hardware attached to the host, and the bundled
//! [`TestPatternCamera`] covers development machines and tests.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

mod device;
mod frame;
#[cfg(feature = "native-camera")]
mod native;
mod notifier;
mod session;
mod test_pattern;

pub use device::{CameraDevice, CameraError, Dimensions, MediaConstraints, MediaStream};
pub use frame::{CaptureError, CapturedFrame, Download};
#[cfg(feature = "native-camera")]
pub use native::{NativeCamera, NativeStream};
pub use notifier::{Notifier, TracingNotifier, CAMERA_UNAVAILABLE_ALERT};
pub use session::{AcquireOutcome, CaptureSession, CaptureState};
pub use test_pattern::{TestPatternCamera, TestPatternStream};
