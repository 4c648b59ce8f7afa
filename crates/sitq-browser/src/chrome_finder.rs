use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable that may point at a Chrome binary
pub const CHROME_ENV: &str = "SITQ_CHROME";

/// Binary names looked up on PATH, most specific first
const PATH_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Locates the Chrome binary to drive
///
/// Lookup order: explicit path, `SITQ_CHROME`, PATH, platform install
/// locations. An explicit path is never silently replaced by a fallback.
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return validate_chrome_path(path);
        }

        if let Some(path) = std::env::var_os(CHROME_ENV) {
            tracing::debug!("Using Chrome from {}", CHROME_ENV);
            return validate_chrome_path(Path::new(&path));
        }

        for name in PATH_CANDIDATES {
            if let Ok(path) = which::which(name) {
                tracing::debug!("Found {} on PATH at {}", name, path.display());
                return Ok(path);
            }
        }

        for path in default_paths() {
            if let Ok(valid_path) = validate_chrome_path(&path) {
                return Ok(valid_path);
            }
        }

        Err(Error::ChromeNotFound(format!(
            "Chrome not found. Checked PATH for {} and {}. Use --chrome-path or {} to specify location.",
            PATH_CANDIDATES.join(", "),
            default_paths()
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            CHROME_ENV
        )))
    }
}

fn default_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    return vec![
        PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
        PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
    ];

    #[cfg(target_os = "linux")]
    return vec![
        PathBuf::from("/usr/bin/google-chrome"),
        PathBuf::from("/usr/bin/chromium"),
        PathBuf::from("/snap/bin/chromium"),
    ];

    #[cfg(target_os = "windows")]
    return vec![
        PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
    ];

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    return vec![];
}

fn validate_chrome_path(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::ChromeNotFound(format!(
            "Chrome not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)?.permissions().mode();
        if mode & 0o111 == 0 {
            return Err(Error::ChromeNotFound(format!(
                "Chrome binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
