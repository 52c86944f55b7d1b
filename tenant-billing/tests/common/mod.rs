//! Shared in-memory transport for integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{fmt, sync::Mutex, time::Duration};

use tenant_billing::{
    error::{BillingError, Result, TransportErrorKind},
    session::Credential,
    transport::{Exchange, Method, Transport, TransportResponse},
};

/// Canned answer of the mock service.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// One exchange as the mock service saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub credential: String,
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
    pub content_type: &'static str,
}

type Responder = dyn Fn(&Exchange<'_>) -> Reply + Send + Sync;

/// Transport answering from a closure and recording every exchange.
pub struct MockTransport {
    responder: Box<Responder>,
    jitter: bool,
    failure: Option<TransportErrorKind>,
    exchanges: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new(responder: impl Fn(&Exchange<'_>) -> Reply + Send + Sync + 'static) -> Self {
        Self { responder: Box::new(responder), jitter: false, failure: None, exchanges: Mutex::new(Vec::new()) }
    }

    /// Answers every request with the same status and body.
    pub fn fixed(status: u16, body: &'static str) -> Self {
        Self::new(move |_| Reply::status(status, body))
    }

    /// Delays each answer by a few milliseconds derived from the credential,
    /// so concurrent requests for different tenants complete out of order.
    #[must_use]
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Records each exchange, then fails it as if the service never answered.
    pub fn timing_out() -> Self {
        Self { failure: Some(TransportErrorKind::Timeout), ..Self::fixed(200, "") }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.exchanges.lock().unwrap().clone()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").field("jitter", &self.jitter).finish_non_exhaustive()
    }
}

impl Transport for MockTransport {
    async fn send<'a>(&'a self, exchange: Exchange<'a>) -> Result<TransportResponse> {
        let reply = (self.responder)(&exchange);
        self.exchanges.lock().unwrap().push(Recorded {
            credential: exchange.credential.expose().to_owned(),
            method: exchange.method,
            path: exchange.path.to_owned(),
            body: exchange.body.map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            content_type: exchange.content_type,
        });

        if let Some(kind) = self.failure {
            return Err(BillingError::transport(kind, "no response from mock service"));
        }

        if self.jitter {
            let spread: u64 = exchange.credential.expose().bytes().map(u64::from).sum();
            tokio::time::sleep(Duration::from_millis(spread % 7)).await;
        }

        Ok(TransportResponse { status: reply.status, body: reply.body.into_bytes(), headers: Vec::new() })
    }

    fn protocol_name(&self) -> &'static str {
        "mock"
    }
}

pub fn credential(key: &str) -> Credential {
    Credential::new(key).unwrap()
}
