//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest.
//! Every request is authenticated with HTTP Basic auth, the API credential as
//! the username and an empty password.

use std::sync::LazyLock;

use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE, USER_AGENT},
};
use tracing::{debug, instrument};
use url::Url;

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{BillingError, Result},
    transport::{Exchange, Method, Transport, TransportResponse},
};

/// Client shared by every transport built with [`HttpTransport::new`], so
/// they share one connection pool.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    let defaults = HttpConfig::default();
    Client::builder()
        .timeout(defaults.timeout())
        .connect_timeout(defaults.connect_timeout())
        .build()
        .expect("default HTTP client must build")
});

/// Validates the service base URL.
///
/// Ensures the URL uses HTTPS and does not point to localhost.
pub(crate) fn validate_url(url: &Url) -> Result<()> {
    if url.scheme() != "https" {
        return Err(BillingError::Config("Only HTTPS base URLs are allowed".to_owned()));
    }

    if let Some(host) = url.host_str().map(str::to_lowercase)
        && (host == "localhost" || host.starts_with("127.") || host == "::1" || host == "[::1]")
    {
        return Err(BillingError::Config("Localhost base URLs are not allowed".to_owned()));
    }

    if url.host_str().is_none() {
        return Err(BillingError::Config(format!("base URL missing host: {url}")));
    }

    Ok(())
}

/// Sanitizes path to prevent path traversal attacks.
///
/// Rejects empty segments and whole `.`/`..` segments, plain or
/// percent-encoded, in the part before the query. Dots inside an identifier
/// (`/coupons/SPRING..SALE`) are fine.
fn sanitize_path(path: &str) -> Result<&str> {
    if !path.starts_with('/') {
        return Err(BillingError::InvalidInput("Path must start with '/'".to_owned()));
    }
    let route = path.split_once('?').map_or(path, |(route, _)| route);
    if route.contains("//") || route.split('/').any(is_dot_segment) {
        return Err(BillingError::InvalidInput(
            "Invalid path: traversal sequences not allowed".to_owned(),
        ));
    }
    Ok(path)
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.contains('\r') || name.contains('\n') || name.contains('\0') {
        return Err(BillingError::InvalidInput(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains('\r') || value.contains('\n') || value.contains('\0') {
        return Err(BillingError::InvalidInput(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports automatic connection pooling, keep-alive, and HTTP/2 multiplexing.
/// One instance serves every tenant: the credential is taken from each
/// [`Exchange`] and never stored.
///
/// # Examples
///
/// ```rust,no_run
/// use tenant_billing::{
///     session::Credential,
///     transport::{Exchange, HttpTransport, Method, Transport},
/// };
///
/// # async fn example() -> tenant_billing::error::Result<()> {
/// let transport = HttpTransport::new("https://acme.billing.example.com/v2")?;
/// let credential = Credential::new("a1b2c3d4e5f6")?;
///
/// let response = transport
///     .send(Exchange {
///         credential: &credential,
///         method: Method::Get,
///         path: "/plans",
///         body: None,
///         content_type: "application/xml; charset=utf-8",
///     })
///     .await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    http_version: HttpVersion,
    user_agent: String,
}

impl HttpTransport {
    /// Creates a transport for `base_url` with default settings.
    ///
    /// Uses a shared singleton client for connection pooling efficiency.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 100
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    /// - HTTP version: Auto (prefer HTTP/2)
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] if the base URL is not a valid
    /// HTTPS URL or points to localhost.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_billing::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new("https://acme.billing.example.com/v2").unwrap();
    /// assert!(HttpTransport::new("http://acme.billing.example.com/v2").is_err());
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        let defaults = HttpConfig::default();
        Ok(Self {
            client: DEFAULT_HTTP_CLIENT.clone(),
            base_url: parse_base_url(base_url)?,
            http_version: defaults.http_version,
            user_agent: defaults.user_agent,
        })
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration or base URL is invalid, or the HTTP
    /// client cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_billing::transport::{HttpConfig, HttpTransport, HttpVersion};
    ///
    /// let config = HttpConfig { timeout_secs: 60, http_version: HttpVersion::Http2, ..HttpConfig::default() };
    /// let transport = HttpTransport::with_config("https://acme.billing.example.com/v2", &config).unwrap();
    /// ```
    pub fn with_config(base_url: &str, config: &HttpConfig) -> Result<Self> {
        config.validate()?;
        let base_url = parse_base_url(base_url)?;

        let mut builder = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url,
            http_version: config.http_version,
            user_agent: config.user_agent.clone(),
        })
    }

    /// The service base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[instrument(
        skip(self, exchange),
        fields(
            method = %exchange.method,
            path = exchange.path,
            credential = %exchange.credential,
        )
    )]
    async fn execute(&self, exchange: Exchange<'_>) -> Result<TransportResponse> {
        let path = sanitize_path(exchange.path)?;
        validate_header(CONTENT_TYPE.as_str(), exchange.content_type)?;

        let full_url = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));

        let mut request = match exchange.method {
            Method::Get => self.client.get(&full_url),
            Method::Post => self.client.post(&full_url),
            Method::Put => self.client.put(&full_url),
            Method::Delete => self.client.delete(&full_url),
        };

        request = request
            .basic_auth(exchange.credential.expose(), None::<&str>)
            .header(ACCEPT, exchange.content_type)
            .header(USER_AGENT, &self.user_agent);

        if let Some(body) = exchange.body {
            request = request.header(CONTENT_TYPE, exchange.content_type).body(body.to_vec());
        }

        let response = request.send().await?;

        let status = response.status().as_u16();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();

        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "received response");

        Ok(TransportResponse { status, body, headers })
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).map_err(|e| BillingError::Config(format!("invalid base_url: {e}")))?;
    validate_url(&url)?;
    Ok(url)
}

impl Transport for HttpTransport {
    async fn send<'a>(&'a self, exchange: Exchange<'a>) -> Result<TransportResponse> {
        self.execute(exchange).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}
