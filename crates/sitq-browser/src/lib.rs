// Chrome-backed page driver for the SitQ monitor

mod chrome_finder;
mod error;
mod launcher;
mod page;
mod profile;

pub use chrome_finder::ChromeFinder;
pub use error::{Error, Result};
pub use launcher::{BrowserLauncher, LaunchOptions};
pub use page::{CdpElement, CdpPage};
pub use profile::ProfileManager;
