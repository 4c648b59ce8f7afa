//! The polling loop.
//!
//! Each cycle reloads the monitor page, lets it settle, checks
//! availability and, when the target is available, runs one booking
//! attempt. The loop stops on the configured outcome policy or when
//! `max_attempts` cycles have run. Cycles never overlap: every step of a
//! cycle finishes before the stop conditions are evaluated.

use crate::availability::is_available;
use crate::booking::{AttemptOutcome, attempt_booking};
use crate::session::RunContext;
use crate::{Config, PageDriver, Result};

/// Why the monitor loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A submission went through and `stop_after_success` is set
    Booked,
    /// An attempt was blocked or failed and `stop_on_intervention` is set
    AttemptUnfinished(AttemptOutcome),
    /// `max_attempts` cycles ran without another stop condition
    AttemptsExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorReport {
    /// Monitor cycles executed
    pub cycles: u32,
    /// Booking attempts started
    pub booking_attempts: u32,
    pub stop: StopReason,
}

#[derive(Debug, Default)]
struct LoopState {
    cycles: u32,
    booking_attempts: u32,
}

impl LoopState {
    fn stop(self, stop: StopReason) -> MonitorReport {
        MonitorReport {
            cycles: self.cycles,
            booking_attempts: self.booking_attempts,
            stop,
        }
    }
}

/// Poll until a stop condition is reached
///
/// Requires `monitor_url` and `availability_selector`; their absence is a
/// configuration error raised before the page is touched. Driver faults
/// end the loop with an error, except a failed reload which is retried
/// once as a fresh navigation.
pub async fn run_monitor<D: PageDriver>(ctx: &RunContext<'_, D>) -> Result<MonitorReport> {
    let config = ctx.config;
    let monitor_url = config.require_monitor_url()?;
    let availability_selector = config.require_availability_selector()?;

    tracing::info!("Opening monitor page: {}", monitor_url);
    ctx.driver.navigate(monitor_url).await?;

    let mut state = LoopState::default();

    loop {
        state.cycles += 1;
        tracing::info!("Check #{}...", state.cycles);

        refresh(ctx.driver, monitor_url).await?;
        tokio::time::sleep(config.after_refresh_delay()).await;

        let available = is_available(
            ctx.driver,
            availability_selector,
            config.availability_positive_text(),
        )
        .await?;
        tracing::info!("Available: {}", available);

        if available {
            ctx.notifier
                .notify("SitQ", "Target is available, starting booking sequence");
            state.booking_attempts += 1;

            let outcome = attempt_booking(ctx).await?;
            tracing::info!("Booking attempt {}: {}", state.booking_attempts, outcome);

            if let Some(stop) = stop_after(outcome, config) {
                tracing::info!("Stopping monitor: {:?}", stop);
                return Ok(state.stop(stop));
            }
            tracing::info!("Continuing to monitor");
        }

        if config.max_attempts() > 0 && state.cycles >= config.max_attempts() {
            tracing::info!("Reached max_attempts ({}), stopping", config.max_attempts());
            return Ok(state.stop(StopReason::AttemptsExhausted));
        }

        tokio::time::sleep(config.poll_interval()).await;
    }
}

/// Reload the monitor page, falling back to a fresh navigation
async fn refresh<D: PageDriver>(driver: &D, monitor_url: &str) -> Result<()> {
    if let Err(e) = driver.reload().await {
        tracing::warn!("Reload failed ({}), loading {} again", e, monitor_url);
        driver.navigate(monitor_url).await?;
    }
    Ok(())
}

/// Apply the stop policy to an attempt outcome
fn stop_after(outcome: AttemptOutcome, config: &Config) -> Option<StopReason> {
    match outcome {
        AttemptOutcome::Submitted if config.stop_after_success() => Some(StopReason::Booked),
        AttemptOutcome::Submitted => None,
        unfinished if config.stop_on_intervention() => {
            Some(StopReason::AttemptUnfinished(unfinished))
        }
        _ => None,
    }
}
