use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    ChromeNotFound(String),

    #[error("Failed to start browser: {0}")]
    Launch(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

/// Anything that goes wrong inside a live session is a driver fault to the core
impl From<Error> for sitq_core::Error {
    fn from(err: Error) -> Self {
        sitq_core::Error::Driver(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
