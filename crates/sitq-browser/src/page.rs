//! [`PageDriver`] over a Chrome DevTools Protocol page.
//!
//! Lookups go through `querySelectorAll`, so a selector that matches
//! nothing is an empty result rather than a protocol error.

use crate::Error;
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use sitq_core::{PageDriver, PageElement};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const PRESENCE_POLL_START: Duration = Duration::from_millis(100);
const PRESENCE_POLL_MAX: Duration = Duration::from_secs(1);

const IS_VISIBLE_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && style.opacity !== '0'
        && (rect.width > 0 || rect.height > 0);
}"#;

const CLEAR_JS: &str = r#"function() {
    if ('value' in this) {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
    }
}"#;

/// Whether closing the session should take the whole browser down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionKind {
    Launched,
    Attached,
}

/// The single page a run drives
pub struct CdpPage {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    kind: SessionKind,
    closed: bool,
}

impl CdpPage {
    pub(crate) fn new(
        browser: Browser,
        page: Page,
        handler_task: JoinHandle<()>,
        kind: SessionKind,
    ) -> Self {
        Self {
            browser: Mutex::new(browser),
            page,
            handler_task,
            kind,
            closed: false,
        }
    }

    async fn shutdown(&mut self) -> crate::Result<()> {
        match self.kind {
            SessionKind::Launched => {
                let browser = self.browser.get_mut();
                browser.close().await?;
                browser.wait().await?;
                tracing::debug!("Chrome process exited");
            }
            SessionKind::Attached => {
                self.page.clone().close().await?;
                tracing::debug!("Closed attached tab");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    type Element = CdpElement;

    async fn navigate(&self, url: &str) -> sitq_core::Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(Error::from)?;
        Ok(())
    }

    async fn reload(&self) -> sitq_core::Result<()> {
        self.page.reload().await.map_err(Error::from)?;
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> sitq_core::Result<Option<CdpElement>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(Error::from)?;
        Ok(elements.into_iter().next().map(|element| CdpElement { element }))
    }

    async fn wait_for_presence(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> sitq_core::Result<bool> {
        let deadline = presence_deadline(timeout);
        let mut interval = PRESENCE_POLL_START;

        loop {
            // Lookups can fail while the page is mid-navigation; only a
            // failure on the final poll is reported.
            let last_error = match self.find_element(selector).await {
                Ok(Some(_)) => return Ok(true),
                Ok(None) => None,
                Err(e) => {
                    tracing::debug!("Lookup of {} failed while waiting: {}", selector, e);
                    Some(e)
                }
            };

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return match last_error {
                            Some(e) => Err(e),
                            None => Ok(false),
                        };
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };

            tokio::time::sleep(pause).await;
            interval = (interval * 2).min(PRESENCE_POLL_MAX);
        }
    }

    async fn close(&mut self) -> sitq_core::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.shutdown().await;
        self.handler_task.abort();
        result.map_err(sitq_core::Error::from)
    }
}

/// `None` when the timeout reaches past what `Instant` can represent
fn presence_deadline(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

pub struct CdpElement {
    element: Element,
}

impl CdpElement {
    async fn eval_bool(&self, function: &str) -> crate::Result<bool> {
        let returns = self.element.call_js_fn(function, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait]
impl PageElement for CdpElement {
    async fn text(&self) -> sitq_core::Result<String> {
        let text = self.element.inner_text().await.map_err(Error::from)?;
        Ok(text.unwrap_or_default())
    }

    async fn is_visible(&self) -> sitq_core::Result<bool> {
        Ok(self.eval_bool(IS_VISIBLE_JS).await?)
    }

    async fn clear(&self) -> sitq_core::Result<()> {
        self.element
            .call_js_fn(CLEAR_JS, false)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> sitq_core::Result<()> {
        self.element.focus().await.map_err(Error::from)?;
        self.element.type_str(text).await.map_err(Error::from)?;
        Ok(())
    }

    async fn click(&self) -> sitq_core::Result<()> {
        self.element.click().await.map_err(Error::from)?;
        Ok(())
    }
}
