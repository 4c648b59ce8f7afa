use crate::notifier::DesktopNotifier;
use anyhow::{Context, Result};
use sitq_browser::{BrowserLauncher, CdpPage, ChromeFinder, LaunchOptions, ProfileManager};
use sitq_core::{
    Config, ConfigIssue, LogNotifier, Notifier, RunReport, SessionController, Severity,
    StopReason,
};
use std::path::PathBuf;

/// Flags of `sitq run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub headless: bool,
    pub user_data_dir: Option<PathBuf>,
    pub profile: Option<String>,
    pub chrome_path: Option<PathBuf>,
    pub attach: Option<u16>,
    pub desktop_notify: bool,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let config = Config::from_file(&options.config)?;
    log_issues(&config.check());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config, options))
}

async fn run(config: Config, options: RunOptions) -> Result<()> {
    let notifier: Box<dyn Notifier> = if options.desktop_notify {
        Box::new(DesktopNotifier)
    } else {
        Box::new(LogNotifier)
    };

    // The profile directory has to outlive the browser using it
    let (page, _profile) = open_page(&options).await?;

    let controller = SessionController::new(page, config, notifier);
    match controller.run().await {
        Ok(report) => print_summary(&report),
        // The session is already closed here; a fault still ends the run normally
        Err(e) => tracing::error!("Run ended by an unexpected fault: {}", e),
    }

    Ok(())
}

async fn open_page(options: &RunOptions) -> Result<(CdpPage, Option<ProfileManager>)> {
    if let Some(port) = options.attach {
        let page = BrowserLauncher::attach(port)
            .await
            .with_context(|| format!("Failed to attach to Chrome on port {}", port))?;
        return Ok((page, None));
    }

    let chrome = ChromeFinder::new(options.chrome_path.clone()).find()?;
    tracing::info!("Found Chrome at {}", chrome.display());

    let profile = select_profile(options)?;
    if profile.is_temporary() {
        tracing::info!("Using a temporary profile, the login will not be cached");
    } else {
        tracing::info!("Using profile {}", profile.path().display());
    }

    let launch = LaunchOptions::new(chrome, profile.path().to_path_buf())
        .headless(options.headless);
    let page = BrowserLauncher::launch(&launch)
        .await
        .context("Failed to launch Chrome")?;

    Ok((page, Some(profile)))
}

fn select_profile(options: &RunOptions) -> Result<ProfileManager> {
    let profile = match (&options.user_data_dir, &options.profile) {
        (Some(dir), _) => ProfileManager::persistent(dir.clone())?,
        (None, Some(name)) => ProfileManager::named(name)?,
        (None, None) => ProfileManager::temporary()?,
    };
    Ok(profile)
}

fn log_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => tracing::error!("Config {}: {}", issue.field, issue.message),
            Severity::Warning => tracing::warn!("Config {}: {}", issue.field, issue.message),
        }
    }
}

fn print_summary(report: &RunReport) {
    match report {
        RunReport::LoginFailed => {
            tracing::info!("Stopped: login was not detected");
        }
        RunReport::Interrupted => {
            tracing::info!("Stopped: interrupted");
        }
        RunReport::Stopped(monitor) => {
            let reason = match &monitor.stop {
                StopReason::Booked => "submission attempted".to_string(),
                StopReason::AttemptUnfinished(outcome) => outcome.to_string(),
                StopReason::AttemptsExhausted => "max_attempts reached".to_string(),
            };
            tracing::info!(
                "Stopped after {} cycle(s) and {} booking attempt(s): {}",
                monitor.cycles,
                monitor.booking_attempts,
                reason
            );
        }
    }
}
