//! Retrying HTTP transport.

use std::error::Error as StdError;
use std::io;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::config::BackendConfig;
use crate::error::ErrorKind;
use crate::net::endpoint::Endpoint;
use crate::net::retrier::Retrier;

/// Fetches raw payloads for endpoints.
///
/// Implementations apply their own retry policy; a returned error is final.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>, ErrorKind>;
}

/// One failed attempt, as seen by the retrier.
#[derive(Debug, Clone, Copy)]
struct Failure {
    kind: ErrorKind,
    status: Option<u16>,
}

impl Failure {
    fn transport(err: &reqwest::Error) -> Self {
        Self {
            kind: classify_transport_error(err),
            status: err.status().map(|s| s.as_u16()),
        }
    }

    fn response(kind: ErrorKind, status: u16) -> Self {
        Self {
            kind,
            status: Some(status),
        }
    }
}

/// reqwest-backed [`Transport`].
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    retrier: Retrier,
    payload_log_limit: Option<usize>,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig, retrier: Retrier) -> Result<Self, TransportSetupError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            retrier,
            payload_log_limit: config
                .log_response_data
                .then_some(config.max_response_log_bytes),
        })
    }

    async fn attempt(&self, url: &Url) -> Result<Vec<u8>, Failure> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Failure::transport(&e))?;

        let status = response.status().as_u16();
        if let Some(kind) = ErrorKind::from_status(status) {
            return Err(Failure::response(kind, status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        if let Some(content_type) = content_type {
            if !content_type.contains("json") {
                tracing::debug!(%url, content_type = %content_type, "Unexpected content type");
                return Err(Failure::response(ErrorKind::UnexpectedContentType, status));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Failure::transport(&e))?;
        if body.is_empty() {
            return Err(Failure::response(ErrorKind::UnexpectedPayload, status));
        }

        if let Some(limit) = self.payload_log_limit {
            let shown = &body[..body.len().min(limit)];
            tracing::trace!(
                %url,
                bytes = body.len(),
                payload = %String::from_utf8_lossy(shown),
                "Response payload"
            );
        }

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Vec<u8>, ErrorKind> {
        let url = endpoint.url(&self.base_url).map_err(|e| {
            tracing::error!(error = %e, path = endpoint.path(), "Could not build request URL");
            ErrorKind::Unknown
        })?;

        let mut attempt_count = 0;
        loop {
            let failure = match self.attempt(&url).await {
                Ok(payload) => return Ok(payload),
                Err(failure) => failure,
            };

            let decision = self
                .retrier
                .should_retry(attempt_count, failure.kind, failure.status);
            if !decision.retry {
                tracing::warn!(
                    %url,
                    error = failure.kind.error_type(),
                    status = ?failure.status,
                    attempts = attempt_count + 1,
                    "Request failed"
                );
                return Err(failure.kind);
            }

            attempt_count += 1;
            tracing::debug!(
                %url,
                error = failure.kind.error_type(),
                attempt = attempt_count,
                max_attempts = self.retrier.max_attempts(),
                delay_ms = decision.delay.as_millis() as u64,
                "Retrying request"
            );
            tokio::time::sleep(decision.delay).await;
        }
    }
}

/// Errors building an [`HttpTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportSetupError {
    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Classify a reqwest failure.
///
/// Timeouts win over connection failures: a connect timeout is a timeout.
pub fn classify_transport_error(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() || rooted_in(err, |e| e.kind() == io::ErrorKind::TimedOut) {
        return ErrorKind::Timeout;
    }
    if err.is_connect() || rooted_in(err, is_connectivity_io_error) {
        return ErrorKind::Connectivity;
    }
    ErrorKind::Unknown
}

fn is_connectivity_io_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::NetworkDown
    )
}

/// Walk the source chain looking for an I/O error matching `predicate`.
fn rooted_in(err: &reqwest::Error, predicate: impl Fn(&io::Error) -> bool) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<io::Error>() {
            if predicate(io_err) {
                return true;
            }
        }
        current = source.source();
    }
    false
}
