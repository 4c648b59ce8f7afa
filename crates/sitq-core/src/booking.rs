use crate::session::RunContext;
use crate::{PageDriver, PageElement, Result};
use std::fmt;
use thiserror::Error;

/// Result of one booking attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The submit element was clicked
    Submitted,
    /// A blocking element was visible; nothing was submitted
    NeedsIntervention { selector: String },
    /// A step the submission depends on could not run
    StepFailed(StepFailure),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    #[error("no submit selector configured")]
    NoSubmitSelector,

    #[error("submit button not found")]
    SubmitNotFound { selector: String },
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Submitted => f.write_str("submitted"),
            AttemptOutcome::NeedsIntervention { selector } => {
                write!(f, "needs intervention ({})", selector)
            }
            AttemptOutcome::StepFailed(reason) => write!(f, "step failed: {}", reason),
        }
    }
}

/// Run the booking sequence once on the current session
///
/// Steps run in a fixed order: optional navigation, field filling,
/// optional pre-submit click, the human-intervention gate, then submission.
/// Missing fields and a missing pre-submit button are skipped; only the
/// gate and the submit step decide the outcome.
pub async fn attempt_booking<D: PageDriver>(ctx: &RunContext<'_, D>) -> Result<AttemptOutcome> {
    let config = ctx.config;
    let driver = ctx.driver;

    if let Some(url) = config.booking_url() {
        tracing::info!("Navigating to booking page: {}", url);
        driver.navigate(url).await?;
        tokio::time::sleep(config.after_nav_delay()).await;
    }

    for (selector, text) in config.fill_fields().iter() {
        match driver.find_element(selector).await? {
            Some(field) => {
                field.clear().await?;
                field.type_text(text).await?;
                tracing::info!("Filled field {} -> {}", selector, text);
            }
            None => tracing::warn!("Field {} not found, skipping", selector),
        }
    }

    if let Some(selector) = config.pre_submit_click() {
        match driver.find_element(selector).await? {
            Some(button) => {
                button.click().await?;
                tracing::info!("Clicked {}", selector);
            }
            None => tracing::warn!("Button {} not found, skipping click", selector),
        }
        tokio::time::sleep(config.after_click_delay()).await;
    }

    if let Some(selector) = config.human_intervention_selector() {
        if let Some(blocker) = driver.find_element(selector).await? {
            if blocker.is_visible().await? {
                tracing::warn!(
                    "Element {} needs human intervention, pausing before submit",
                    selector
                );
                ctx.notifier.notify(
                    "SitQ - human intervention required",
                    &format!("Detected {}, please complete it manually", selector),
                );
                return Ok(AttemptOutcome::NeedsIntervention {
                    selector: selector.to_string(),
                });
            }
            tracing::debug!("Intervention element {} present but hidden", selector);
        }
    }

    let Some(selector) = config.submit_selector() else {
        tracing::error!("submit_selector is not configured, cannot submit");
        return Ok(AttemptOutcome::StepFailed(StepFailure::NoSubmitSelector));
    };

    let Some(submit) = driver.find_element(selector).await? else {
        tracing::error!("Submit button {} not found, cannot submit", selector);
        return Ok(AttemptOutcome::StepFailed(StepFailure::SubmitNotFound {
            selector: selector.to_string(),
        }));
    };

    submit.click().await?;
    tracing::info!("Clicked submit {}", selector);
    tokio::time::sleep(config.after_submit_delay()).await;
    ctx.notifier
        .notify("SitQ", "Submission attempted, please check whether it succeeded");

    Ok(AttemptOutcome::Submitted)
}
