//! Client configuration.
//!
//! A [`ClientConfig`] is deserialized from TOML:
//!
//! ```toml
//! base_url = "https://acme.billing.example.com/v2"
//! format = "xml"
//!
//! [http]
//! timeout_secs = 30
//! http_version = "auto"
//! ```

use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::{
    error::{BillingError, Result},
    mapper::WireFormat,
    transport::{HttpConfig, http::validate_url},
};

/// Root client configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the billing API, including any version prefix.
    pub base_url: String,

    /// Wire format of request and response bodies.
    #[serde(default)]
    pub format: WireFormat,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), format: WireFormat::default(), http: HttpConfig::default() }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] if the document is malformed or fails
    /// [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_billing::{config::ClientConfig, mapper::WireFormat};
    ///
    /// let config = ClientConfig::from_toml(r#"
    ///     base_url = "https://acme.billing.example.com/v2"
    ///     format = "json"
    /// "#).unwrap();
    /// assert_eq!(config.format, WireFormat::Json);
    /// ```
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| BillingError::Config(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] if the file cannot be read or is
    /// invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| BillingError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&source)
    }

    /// Validates the base URL and HTTP settings.
    ///
    /// This method checks for:
    /// - Base URL must parse and use HTTPS
    /// - Base URL must not be localhost or loopback
    /// - HTTP timeouts and user agent within bounds
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] if any check fails.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| BillingError::Config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        validate_url(&url)?;
        self.http.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpVersion;

    #[test]
    fn test_minimal_config() {
        let config = ClientConfig::from_toml(r#"base_url = "https://acme.billing.example.com/v2""#).unwrap();
        assert_eq!(config, ClientConfig::new("https://acme.billing.example.com/v2"));
        assert_eq!(config.format, WireFormat::Xml);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
            base_url = "https://acme.billing.example.com/v2"
            format = "json"

            [http]
            timeout_secs = 10
            http_version = "http1"
            user_agent = "acme-billing/2.0"
        "#;
        let config = ClientConfig::from_toml(toml).unwrap();
        assert_eq!(config.format, WireFormat::Json);
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.http_version, HttpVersion::Http1);
        assert_eq!(config.http.user_agent, "acme-billing/2.0");
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(ClientConfig::from_toml("format = \"xml\""), Err(BillingError::Config(_))));
    }

    #[test]
    fn test_unknown_format() {
        let toml = r#"
            base_url = "https://acme.billing.example.com/v2"
            format = "yaml"
        "#;
        assert!(ClientConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_rejects_http_and_loopback() {
        assert!(ClientConfig::new("http://acme.billing.example.com").validate().is_err());
        assert!(ClientConfig::new("https://localhost:8443").validate().is_err());
        assert!(ClientConfig::new("not a url").validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_http_settings() {
        let mut config = ClientConfig::new("https://acme.billing.example.com/v2");
        config.http.connect_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(BillingError::Config(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let error = ClientConfig::from_file("/nonexistent/tenant-billing.toml").unwrap_err();
        assert!(error.to_string().contains("cannot read"));
    }
}
