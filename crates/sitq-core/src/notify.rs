/// Human-visible notifications
///
/// Implementations must never fail the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that only writes a log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!("Notification: {} - {}", title, message);
    }
}
