use crate::page::{CdpPage, SessionKind};
use crate::{Error, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Handler;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// How to start Chrome for a run
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_path: PathBuf,
    pub user_data_dir: PathBuf,
    pub headless: bool,
    pub window_size: (u32, u32),
}

impl LaunchOptions {
    pub fn new(chrome_path: PathBuf, user_data_dir: PathBuf) -> Self {
        Self {
            chrome_path,
            user_data_dir,
            headless: false,
            window_size: (1200, 900),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Flags passed to Chrome on top of what the CDP launcher sets itself
    fn extra_args(&self) -> Vec<String> {
        vec![
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ]
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let (width, height) = self.window_size;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .user_data_dir(&self.user_data_dir)
            .window_size(width, height)
            .no_sandbox()
            .args(self.extra_args());

        if !self.headless {
            builder = builder.with_head();
        }

        builder.build().map_err(Error::Launch)
    }
}

/// Starts or attaches to Chrome and opens the page the run will drive
pub struct BrowserLauncher;

impl BrowserLauncher {
    /// Launch a Chrome process owned by the session
    pub async fn launch(options: &LaunchOptions) -> Result<CdpPage> {
        tracing::info!(
            "Launching Chrome {} (profile: {}, headless: {})",
            options.chrome_path.display(),
            options.user_data_dir.display(),
            options.headless
        );

        let config = options.browser_config()?;
        let (browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Launch(e.to_string()))?;
        let handler_task = spawn_handler(handler);

        let page = browser.new_page("about:blank").await?;
        tracing::info!("Chrome ready");

        Ok(CdpPage::new(browser, page, handler_task, SessionKind::Launched))
    }

    /// Attach to a Chrome already running with `--remote-debugging-port`
    ///
    /// The run gets its own tab; closing the session closes only that tab.
    pub async fn attach(port: u16) -> Result<CdpPage> {
        let endpoint = format!("http://localhost:{}", port);
        tracing::info!("Attaching to Chrome on {}", endpoint);

        let mut attempts_left = CONNECT_ATTEMPTS;
        let (browser, handler) = loop {
            match Browser::connect(&endpoint).await {
                Ok(connection) => break connection,
                Err(e) => {
                    attempts_left -= 1;
                    if attempts_left == 0 {
                        return Err(Error::Cdp(format!(
                            "Failed to connect to Chrome after {} attempts: {}",
                            CONNECT_ATTEMPTS, e
                        )));
                    }
                    tracing::info!(
                        "CDP connection attempt failed, retrying... ({} left)",
                        attempts_left
                    );
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                }
            }
        };
        let handler_task = spawn_handler(handler);

        let page = browser.new_page("about:blank").await?;
        tracing::info!("Attached to Chrome, opened a new tab");

        Ok(CdpPage::new(browser, page, handler_task, SessionKind::Attached))
    }
}

/// Drive the CDP message stream; nothing on the page works without it
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!("CDP handler event error (continuing): {}", e);
            }
        }
    })
}
