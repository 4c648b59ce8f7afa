//! Page driver interface consumed by the core.
//!
//! Element absence is a normal outcome while polling, so
//! [`PageDriver::find_element`] reports it as `Ok(None)`. Every method may
//! still fail with [`crate::Error::Driver`] when the browser or its
//! transport misbehaves.

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One live browser page
#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: PageElement;

    /// Load `url` in the page
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Reload the current page
    async fn reload(&self) -> Result<()>;

    /// Find the first element matching `selector`
    async fn find_element(&self, selector: &str) -> Result<Option<Self::Element>>;

    /// Wait up to `timeout` for `selector` to be present; `false` on expiry
    async fn wait_for_presence(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Release the page and everything behind it
    async fn close(&mut self) -> Result<()>;
}

/// A handle to an element found on the page
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered text of the element
    async fn text(&self) -> Result<String>;

    async fn is_visible(&self) -> Result<bool>;

    async fn clear(&self) -> Result<()>;

    async fn type_text(&self, text: &str) -> Result<()>;

    async fn click(&self) -> Result<()>;
}
