use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Chrome user-data directory for a run
///
/// A persistent profile keeps cookies between runs, so a QR-code login
/// survives restarts. A temporary profile is removed when dropped.
pub struct ProfileManager {
    location: Location,
}

enum Location {
    Temporary(TempDir),
    Persistent(PathBuf),
}

impl ProfileManager {
    /// Fresh profile that is deleted on drop
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("sitq-profile-").tempdir()?;
        tracing::debug!("Created temporary profile at {}", dir.path().display());

        Ok(Self {
            location: Location::Temporary(dir),
        })
    }

    /// Profile at an explicit directory, created if missing
    pub fn persistent(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Creating profile directory {}", path.display());
            std::fs::create_dir_all(&path)?;
        }

        Ok(Self {
            location: Location::Persistent(path),
        })
    }

    /// Persistent profile stored as `~/.sitq/profiles/<name>`
    pub fn named(name: &str) -> Result<Self> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(Error::Profile(format!("Invalid profile name '{}'", name)));
        }

        Self::persistent(Self::profiles_dir()?.join(name))
    }

    /// Directory holding named profiles
    pub fn profiles_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Profile("Could not determine home directory".to_string()))?;
        Ok(home.join(".sitq").join("profiles"))
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Temporary(dir) => dir.path(),
            Location::Persistent(path) => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.location, Location::Temporary(_))
    }
}
