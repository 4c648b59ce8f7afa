use notify_rust::Notification;
use sitq_core::Notifier;

/// Logs each notification and raises a desktop alert for it
///
/// Failing to show the alert (no notification daemon, headless box) only
/// shows up in debug logs; the log line is always written.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!("Notification: {} - {}", title, message);

        if let Err(e) = Notification::new()
            .summary(title)
            .body(message)
            .appname("sitq")
            .show()
        {
            tracing::debug!("Desktop notification not shown: {}", e);
        }
    }
}
