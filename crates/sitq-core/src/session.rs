use crate::login::await_login;
use crate::monitor::{MonitorReport, run_monitor};
use crate::{Config, Notifier, PageDriver, Result};
use std::future::Future;

/// Everything a run step needs, borrowed from the [`SessionController`]
pub struct RunContext<'a, D: PageDriver> {
    pub driver: &'a D,
    pub config: &'a Config,
    pub notifier: &'a dyn Notifier,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Login was not detected; polling never started
    LoginFailed,
    /// The monitor loop reached a stop condition
    Stopped(MonitorReport),
    /// The run was interrupted (Ctrl-C) before reaching a stop condition
    Interrupted,
}

/// Owns the page session for the lifetime of a run
///
/// The driver is closed exactly once when [`SessionController::run`]
/// finishes, whatever the result.
pub struct SessionController<D: PageDriver> {
    driver: D,
    config: Config,
    notifier: Box<dyn Notifier>,
}

impl<D: PageDriver> SessionController<D> {
    pub fn new(driver: D, config: Config, notifier: Box<dyn Notifier>) -> Self {
        Self {
            driver,
            config,
            notifier,
        }
    }

    /// Wait for login, then monitor until a stop condition, a fault or Ctrl-C
    pub async fn run(self) -> Result<RunReport> {
        self.run_until(ctrl_c()).await
    }

    /// Like [`run`](Self::run), but stop as soon as `interrupt` completes
    ///
    /// The step in flight is abandoned; the session is still closed.
    pub async fn run_until<F>(mut self, interrupt: F) -> Result<RunReport>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            result = self.drive() => result,
            () = interrupt => {
                tracing::info!("Interrupted, stopping");
                Ok(RunReport::Interrupted)
            }
        };

        match &result {
            Ok(report) => tracing::info!("Run finished: {:?}", report),
            Err(e) => tracing::error!("Run aborted: {}", e),
        }

        tracing::info!("Closing browser session");
        if let Err(e) = self.driver.close().await {
            tracing::warn!("Failed to close browser session cleanly: {}", e);
        }

        result
    }

    async fn drive(&self) -> Result<RunReport> {
        let ctx = RunContext {
            driver: &self.driver,
            config: &self.config,
            notifier: self.notifier.as_ref(),
        };

        let logged_in = await_login(
            ctx.driver,
            ctx.notifier,
            self.config.login_url(),
            self.config.logged_in_selector(),
            self.config.login_timeout(),
        )
        .await?;

        if !logged_in {
            tracing::error!("Login failed or timed out, exiting");
            return Ok(RunReport::LoginFailed);
        }

        let report = run_monitor(&ctx).await?;
        Ok(RunReport::Stopped(report))
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
