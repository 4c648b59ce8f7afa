//! Run configuration.
//!
//! A [`Config`] is loaded once from a JSON document and never mutated
//! afterwards. Selectors are opaque CSS locators handed straight to the
//! page driver. Optional selectors that are present but empty are treated
//! as absent.

use crate::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Immutable run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    login_url: String,
    monitor_url: Option<String>,
    booking_url: Option<String>,

    logged_in_selector: Option<String>,
    availability_selector: Option<String>,
    availability_positive_text: Option<String>,
    #[serde(default)]
    fill_fields: FillFields,
    pre_submit_click: Option<String>,
    human_intervention_selector: Option<String>,
    submit_selector: Option<String>,

    #[serde(default = "default_login_timeout")]
    login_timeout: f64,
    #[serde(default = "default_poll_interval")]
    poll_interval_seconds: f64,
    #[serde(default = "default_after_nav_delay")]
    after_nav_delay: f64,
    #[serde(default = "default_after_click_delay")]
    after_click_delay: f64,
    #[serde(default = "default_after_refresh_delay")]
    after_refresh_delay: f64,
    #[serde(default = "default_after_submit_delay")]
    after_submit_delay: f64,
    #[serde(default)]
    max_attempts: u32,
    #[serde(default = "default_true")]
    stop_after_success: bool,
    #[serde(default = "default_true")]
    stop_on_intervention: bool,
}

fn default_login_timeout() -> f64 {
    300.0
}

fn default_poll_interval() -> f64 {
    2.0
}

fn default_after_nav_delay() -> f64 {
    1.0
}

fn default_after_click_delay() -> f64 {
    0.5
}

fn default_after_refresh_delay() -> f64 {
    0.5
}

fn default_after_submit_delay() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Treat `Some("")` and `Some("   ")` the same as a missing value
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Convert a seconds value to a Duration
///
/// Negative and NaN values become zero; values too large for a `Duration`
/// saturate at `Duration::MAX`.
fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

impl Config {
    /// Load and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        tracing::debug!("Reading config from: {}", path.display());

        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;

        tracing::info!(
            "Loaded config from {} ({} fill fields)",
            path.display(),
            config.fill_fields.len()
        );

        Ok(config)
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn monitor_url(&self) -> Option<&str> {
        non_empty(&self.monitor_url)
    }

    pub fn booking_url(&self) -> Option<&str> {
        non_empty(&self.booking_url)
    }

    pub fn logged_in_selector(&self) -> Option<&str> {
        non_empty(&self.logged_in_selector)
    }

    pub fn availability_selector(&self) -> Option<&str> {
        non_empty(&self.availability_selector)
    }

    /// Matched as a substring, so surrounding whitespace is significant
    pub fn availability_positive_text(&self) -> Option<&str> {
        self.availability_positive_text
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    pub fn fill_fields(&self) -> &FillFields {
        &self.fill_fields
    }

    pub fn pre_submit_click(&self) -> Option<&str> {
        non_empty(&self.pre_submit_click)
    }

    pub fn human_intervention_selector(&self) -> Option<&str> {
        non_empty(&self.human_intervention_selector)
    }

    pub fn submit_selector(&self) -> Option<&str> {
        non_empty(&self.submit_selector)
    }

    pub fn login_timeout(&self) -> Duration {
        seconds(self.login_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        seconds(self.poll_interval_seconds)
    }

    pub fn after_nav_delay(&self) -> Duration {
        seconds(self.after_nav_delay)
    }

    pub fn after_click_delay(&self) -> Duration {
        seconds(self.after_click_delay)
    }

    pub fn after_refresh_delay(&self) -> Duration {
        seconds(self.after_refresh_delay)
    }

    pub fn after_submit_delay(&self) -> Duration {
        seconds(self.after_submit_delay)
    }

    /// Maximum number of monitor cycles; 0 means unbounded
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn stop_after_success(&self) -> bool {
        self.stop_after_success
    }

    pub fn stop_on_intervention(&self) -> bool {
        self.stop_on_intervention
    }

    /// The monitor URL, required before polling can start
    pub fn require_monitor_url(&self) -> Result<&str> {
        self.monitor_url()
            .ok_or_else(|| Error::Config("monitor_url is not configured".to_string()))
    }

    /// The availability selector, required before polling can start
    pub fn require_availability_selector(&self) -> Result<&str> {
        self.availability_selector().ok_or_else(|| {
            Error::Config("availability_selector is not configured".to_string())
        })
    }

    /// Report configuration deficiencies without failing
    ///
    /// Errors prevent the monitor loop from running at all; warnings
    /// describe steps that will be skipped or attempts that cannot succeed.
    pub fn check(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        check_url(&mut issues, "login_url", Some(self.login_url.as_str()));
        check_url(&mut issues, "monitor_url", self.monitor_url.as_deref());
        check_url(&mut issues, "booking_url", self.booking_url.as_deref());

        if self.monitor_url().is_none() {
            issues.push(ConfigIssue::error(
                "monitor_url",
                "required to start monitoring",
            ));
        }
        if self.availability_selector().is_none() {
            issues.push(ConfigIssue::error(
                "availability_selector",
                "required to detect availability",
            ));
        }
        if self.logged_in_selector().is_none() {
            issues.push(ConfigIssue::warning(
                "logged_in_selector",
                "login cannot be verified; the run will stop after opening the login page",
            ));
        }
        if self.submit_selector().is_none() {
            issues.push(ConfigIssue::warning(
                "submit_selector",
                "every booking attempt will fail before submitting",
            ));
        }
        if let Some(text) = self.availability_positive_text() {
            if text.chars().any(char::is_uppercase) {
                issues.push(ConfigIssue::warning(
                    "availability_positive_text",
                    "page text is lower-cased before matching, so uppercase letters never match",
                ));
            }
        }

        let timings = [
            ("login_timeout", self.login_timeout),
            ("poll_interval_seconds", self.poll_interval_seconds),
            ("after_nav_delay", self.after_nav_delay),
            ("after_click_delay", self.after_click_delay),
            ("after_refresh_delay", self.after_refresh_delay),
            ("after_submit_delay", self.after_submit_delay),
        ];
        for (field, value) in timings {
            if !value.is_finite() || value < 0.0 {
                issues.push(ConfigIssue::error(
                    field,
                    format!("must be a non-negative number of seconds, got {}", value),
                ));
            } else if Duration::try_from_secs_f64(value).is_err() {
                issues.push(ConfigIssue::error(
                    field,
                    format!("{} seconds is too large", value),
                ));
            }
        }

        issues
    }
}

fn check_url(issues: &mut Vec<ConfigIssue>, field: &'static str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return;
    };
    if let Err(e) = Url::parse(value) {
        issues.push(ConfigIssue::error(
            field,
            format!("'{}' is not an absolute URL ({})", value, e),
        ));
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Selector → text pairs, kept in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillFields(Vec<(String, String)>);

impl FillFields {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FillFields {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FillFieldsVisitor;

        impl<'de> Visitor<'de> for FillFieldsVisitor {
            type Value = FillFields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping selectors to text")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<FillFields, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields: Vec<(String, String)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((selector, text)) = map.next_entry::<String, String>()? {
                    // A repeated key keeps its first position and its last value.
                    match fields.iter_mut().find(|(s, _)| *s == selector) {
                        Some(existing) => existing.1 = text,
                        None => fields.push((selector, text)),
                    }
                }
                Ok(FillFields(fields))
            }
        }

        deserializer.deserialize_map(FillFieldsVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single finding from [`Config::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{ "login_url": "https://example.com/login" }"#;

    #[test]
    fn test_defaults_applied() {
        let config: Config = MINIMAL.parse().unwrap();

        assert_eq!(config.login_timeout(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.after_nav_delay(), Duration::from_secs(1));
        assert_eq!(config.after_click_delay(), Duration::from_millis(500));
        assert_eq!(config.after_refresh_delay(), Duration::from_millis(500));
        assert_eq!(config.after_submit_delay(), Duration::from_secs(2));
        assert_eq!(config.max_attempts(), 0);
        assert!(config.stop_after_success());
        assert!(config.stop_on_intervention());
        assert!(config.fill_fields().is_empty());
        assert!(config.submit_selector().is_none());
    }

    #[test]
    fn test_fill_fields_keep_document_order() {
        let config: Config = r##"{
            "login_url": "https://example.com/login",
            "fill_fields": {
                "#zeta": "last-alphabetically",
                "#alpha": "first-alphabetically",
                "#mid": "middle"
            }
        }"##
        .parse()
        .unwrap();

        let selectors: Vec<&str> = config.fill_fields().iter().map(|(s, _)| s).collect();
        assert_eq!(selectors, vec!["#zeta", "#alpha", "#mid"]);
    }

    #[test]
    fn test_fill_fields_duplicate_key_keeps_last_value() {
        let config: Config = r##"{
            "login_url": "https://example.com/login",
            "fill_fields": { "#name": "old", "#phone": "123", "#name": "new" }
        }"##
        .parse()
        .unwrap();

        let fields: Vec<(&str, &str)> = config.fill_fields().iter().collect();
        assert_eq!(fields, vec![("#name", "new"), ("#phone", "123")]);
    }

    #[test]
    fn test_fill_fields_reject_non_string_values() {
        let result = r##"{
            "login_url": "https://example.com/login",
            "fill_fields": { "#count": 3 }
        }"##
        .parse::<Config>();

        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_fractional_timings() {
        let config: Config = r#"{
            "login_url": "https://example.com/login",
            "poll_interval_seconds": 0.25,
            "login_timeout": 5
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.login_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_empty_selectors_are_absent() {
        let config: Config = r#"{
            "login_url": "https://example.com/login",
            "logged_in_selector": "",
            "submit_selector": "   "
        }"#
        .parse()
        .unwrap();

        assert!(config.logged_in_selector().is_none());
        assert!(config.submit_selector().is_none());
    }

    #[test]
    fn test_polling_requirements() {
        let config: Config = MINIMAL.parse().unwrap();

        assert!(matches!(config.require_monitor_url(), Err(Error::Config(_))));
        assert!(matches!(
            config.require_availability_selector(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_check_reports_missing_fields() {
        let config: Config = MINIMAL.parse().unwrap();
        let issues = config.check();

        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.field)
            .collect();
        let warnings: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .map(|i| i.field)
            .collect();

        assert_eq!(errors, vec!["monitor_url", "availability_selector"]);
        assert_eq!(warnings, vec!["logged_in_selector", "submit_selector"]);
    }

    #[test]
    fn test_check_rejects_bad_url_and_negative_delay() {
        let config: Config = r##"{
            "login_url": "example.com/login",
            "monitor_url": "https://example.com/tickets",
            "availability_selector": ".buy",
            "logged_in_selector": "#avatar",
            "submit_selector": "#submit",
            "after_click_delay": -1
        }"##
        .parse()
        .unwrap();

        let issues = config.check();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "login_url");
        assert_eq!(issues[1].field, "after_click_delay");
        assert_eq!(config.after_click_delay(), Duration::ZERO);
    }

    #[test]
    fn test_huge_timings_saturate() {
        let config: Config = r#"{
            "login_url": "https://example.com/login",
            "poll_interval_seconds": 1e20,
            "login_timeout": 1e300
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.poll_interval(), Duration::MAX);
        assert_eq!(config.login_timeout(), Duration::MAX);

        let flagged: Vec<&str> = config
            .check()
            .into_iter()
            .filter(|i| i.severity == Severity::Error && i.message.contains("too large"))
            .map(|i| i.field)
            .collect();
        assert_eq!(flagged, vec!["login_timeout", "poll_interval_seconds"]);
    }

    #[test]
    fn test_whitespace_positive_text_is_kept() {
        let config: Config = r#"{
            "login_url": "https://example.com/login",
            "availability_positive_text": " "
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.availability_positive_text(), Some(" "));

        let empty: Config = r#"{
            "login_url": "https://example.com/login",
            "availability_positive_text": ""
        }"#
        .parse()
        .unwrap();
        assert_eq!(empty.availability_positive_text(), None);
    }

    #[test]
    fn test_check_warns_on_uppercase_positive_text() {
        let config: Config = r#"{
            "login_url": "https://example.com/login",
            "availability_positive_text": "Book Now"
        }"#
        .parse()
        .unwrap();

        assert!(
            config
                .check()
                .iter()
                .any(|i| i.field == "availability_positive_text" && i.severity == Severity::Warning)
        );
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(Path::new("/nonexistent/sitq/config.json"));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_from_file_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "login_url": "https://example.com/login", "max_attempts": 7 }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.login_url(), "https://example.com/login");
        assert_eq!(config.max_attempts(), 7);
    }

    #[test]
    fn test_from_file_missing_login_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "monitor_url": "https://example.com" }}"#).unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
