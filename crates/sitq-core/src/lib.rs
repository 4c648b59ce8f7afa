pub mod availability;
pub mod booking;
pub mod config;
pub mod driver;
pub mod error;
pub mod login;
pub mod monitor;
pub mod notify;
pub mod session;

#[cfg(test)]
mod test_support;

pub use booking::{AttemptOutcome, StepFailure};
pub use config::{Config, ConfigIssue, Severity};
pub use driver::{PageDriver, PageElement};
pub use error::{Error, Result};
pub use monitor::{MonitorReport, StopReason};
pub use notify::{LogNotifier, Notifier};
pub use session::{RunContext, RunReport, SessionController};
