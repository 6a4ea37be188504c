//! Blocking HTTP execution behind the `Transport` seam.
//!
//! # Design
//! `OutlineClient` never talks to the network directly; it hands a finished
//! `HttpRequest` to a `Transport` and interprets the `HttpResponse` that comes
//! back. `UreqTransport` is the production implementation. Tests substitute a
//! scripted transport to count and inspect requests.
//!
//! Management servers present a self-signed certificate identified out of
//! band by its fingerprint, so certificate verification is disabled by
//! default.

use std::time::Duration;

use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations return every response the server produced, whatever its
/// status; status interpretation belongs to the client.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Connection settings for `UreqTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Skip certificate chain and hostname verification.
    pub accept_invalid_certs: bool,
    pub max_idle_connections: usize,
    /// How long a pooled connection may sit idle before it is dropped.
    pub idle_timeout: Duration,
    /// Upper bound on establishing a connection, TLS handshake included.
    pub handshake_timeout: Duration,
    /// Largest response body read into memory. Key lists of large servers
    /// run well past ureq's 10 MB default.
    pub max_body_bytes: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            max_idle_connections: 20,
            idle_timeout: Duration::from_secs(20),
            handshake_timeout: Duration::from_secs(20),
            max_body_bytes: 1 << 30,
        }
    }
}

/// `Transport` backed by a pooled `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let tls = TlsConfig::builder()
            .disable_verification(config.accept_invalid_certs)
            .build();

        // Status codes come back as data; the client decides what is an error.
        let agent = Agent::config_builder()
            .tls_config(tls)
            .http_status_as_error(false)
            .max_idle_connections(config.max_idle_connections)
            .max_idle_age(config.idle_timeout)
            .timeout_connect(Some(config.handshake_timeout))
            .build()
            .new_agent();

        Self {
            agent,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.path.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(self.agent.get(url), request).call(),
            (HttpMethod::Delete, _) => prepare(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => prepare(self.agent.post(url), request).send(body.as_bytes()),
            (HttpMethod::Post, None) => prepare(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => prepare(self.agent.put(url), request).send(body.as_bytes()),
            (HttpMethod::Put, None) => prepare(self.agent.put(url), request).send_empty(),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Apply the request's headers and its per-call deadline to a ureq builder.
fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.config().timeout_global(Some(request.timeout)).build()
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::BadUri(msg) => ApiError::RequestError(msg),
            ureq::Error::Http(err) => ApiError::RequestError(err.to_string()),
            other => ApiError::TransportError(other.to_string()),
        }
    }
}
