use crate::{Notifier, PageDriver, Result};
use std::time::Duration;

/// Open the login page and wait for the user to finish logging in
///
/// Returns `Ok(false)` without waiting when no `logged_in_selector` is
/// configured, since completion cannot be detected. Otherwise waits once,
/// up to `timeout`, for the selector to appear. A single notification is
/// emitted on success; expiry is only logged.
pub async fn await_login<D: PageDriver>(
    driver: &D,
    notifier: &dyn Notifier,
    login_url: &str,
    logged_in_selector: Option<&str>,
    timeout: Duration,
) -> Result<bool> {
    tracing::info!("Opening login page: {}", login_url);
    driver.navigate(login_url).await?;

    let Some(selector) = logged_in_selector else {
        tracing::warn!(
            "logged_in_selector is not configured, cannot detect login completion; set it in the config"
        );
        return Ok(false);
    };

    tracing::info!(
        "Log in through the browser window. Waiting up to {}s for {}...",
        timeout.as_secs(),
        selector
    );

    if driver.wait_for_presence(selector, timeout).await? {
        tracing::info!("Found {}, login complete", selector);
        notifier.notify("SitQ", "Login detected");
        Ok(true)
    } else {
        tracing::error!("Timed out waiting for login after {}s", timeout.as_secs());
        Ok(false)
    }
}
