/// Message shown when the camera cannot be opened
pub const CAMERA_UNAVAILABLE_ALERT: &str = "Camera access denied or not available.";

/// Blocking user-facing notifications
pub trait Notifier: Send + Sync {
    /// Shows `message` to the user
    fn alert(&self, message: &str);
}

/// Notifier that only writes the alert to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(target: "mycoscan_capture::alert", "{message}");
    }
}
