//! Logging setup and the connectivity report for the billing CLI.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.

use std::io;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log format configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format for development.
    Pretty,
    /// JSON format for production log aggregation.
    Json,
}

impl LogFormat {
    /// Determines log format from the `LOG_FORMAT` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_FORMAT").ok().as_deref())
    }

    /// `json` (any case) selects JSON; anything else, or nothing, is pretty.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initializes structured logging.
///
/// Configures tracing-subscriber with:
/// - Configurable output format (pretty for dev, JSON for production)
/// - Environment-based log level filtering (`RUST_LOG`, default `warn`)
/// - Span close events, which time each dispatch
pub fn init_observability(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
        LogFormat::Json => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_span_list(true)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_thread_names(false)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_writer(io::stderr),
                )
                .init();
        }
    }
}

/// Overall result of `tenant-billing check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Every check passed.
    Healthy,
    /// Something is off but requests can still succeed.
    Degraded,
    /// Requests will fail.
    Unhealthy,
}

impl CheckStatus {
    /// Returns string representation for JSON serialization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Check passed.
    Pass,
    /// Check failed.
    Fail,
    /// Degraded but operational.
    Warn,
}

impl Outcome {
    /// Returns string representation for JSON serialization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
        }
    }
}

/// One named check with an optional detail message.
#[derive(Debug, Clone)]
pub struct Check {
    /// Check name.
    pub name: &'static str,
    /// Check outcome.
    pub outcome: Outcome,
    /// Optional message with details.
    pub message: Option<String>,
}

impl Check {
    /// A passing check with a message.
    #[must_use]
    pub fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self { name, outcome: Outcome::Pass, message: Some(message.into()) }
    }

    /// A failing check with an error message.
    #[must_use]
    pub fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self { name, outcome: Outcome::Fail, message: Some(message.into()) }
    }

    /// A warning with a message.
    #[must_use]
    pub fn warn(name: &'static str, message: impl Into<String>) -> Self {
        Self { name, outcome: Outcome::Warn, message: Some(message.into()) }
    }
}

/// Connectivity report printed by `tenant-billing check`.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Overall status.
    pub status: CheckStatus,
    /// CLI version.
    pub version: &'static str,
    /// Service base URL checked.
    pub base_url: String,
    /// Individual checks.
    pub checks: Vec<Check>,
}

impl CheckReport {
    /// Builds a report, deriving the overall status from `checks`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, checks: Vec<Check>) -> Self {
        Self {
            status: Self::compute_status(&checks),
            version: env!("CARGO_PKG_VERSION"),
            base_url: base_url.into(),
            checks,
        }
    }

    /// Serializes the report to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::json!({
            "status": self.status.as_str(),
            "version": self.version,
            "base_url": self.base_url,
            "checks": self.checks.iter().map(|c| {
                let mut obj = serde_json::json!({
                    "name": c.name,
                    "status": c.outcome.as_str(),
                });
                if let Some(msg) = &c.message {
                    obj["message"] = serde_json::Value::String(msg.clone());
                }
                obj
            }).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&json)
    }

    /// Overall status from individual checks.
    #[must_use]
    pub fn compute_status(checks: &[Check]) -> CheckStatus {
        if checks.iter().any(|c| c.outcome == Outcome::Fail) {
            CheckStatus::Unhealthy
        } else if checks.iter().any(|c| c.outcome == Outcome::Warn) {
            CheckStatus::Degraded
        } else {
            CheckStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("unknown")), LogFormat::Pretty);
    }

    #[test]
    fn test_check_constructors() {
        let check = Check::pass("config", "loaded tenant-billing.toml");
        assert_eq!(check.outcome, Outcome::Pass);
        assert_eq!(check.message.as_deref(), Some("loaded tenant-billing.toml"));

        assert_eq!(Check::fail("service", "timeout").outcome, Outcome::Fail);
        assert_eq!(Check::warn("service", "no plans").outcome, Outcome::Warn);
    }

    #[test]
    fn test_compute_status() {
        assert_eq!(CheckReport::compute_status(&[]), CheckStatus::Healthy);
        assert_eq!(
            CheckReport::compute_status(&[Check::pass("a", "ok"), Check::warn("b", "slow")]),
            CheckStatus::Degraded
        );
        assert_eq!(
            CheckReport::compute_status(&[Check::warn("b", "slow"), Check::fail("c", "down")]),
            CheckStatus::Unhealthy
        );
    }

    #[test]
    fn test_report_to_json() {
        let report = CheckReport::new(
            "https://acme.billing.example.com/v2",
            vec![Check::pass("credential", "a1b2...e5f6"), Check::fail("service", "status 401")],
        );

        let json = report.to_json().expect("JSON serialization should succeed");
        assert!(json.contains("\"status\": \"unhealthy\""));
        assert!(json.contains("\"base_url\": \"https://acme.billing.example.com/v2\""));
        assert!(json.contains("\"name\": \"credential\""));
        assert!(json.contains("\"status\": \"fail\""));
        assert!(json.contains("\"message\": \"status 401\""));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(Outcome::Warn.as_str(), "warn");
        assert_eq!(CheckStatus::Degraded.as_str(), "degraded");
    }
}
