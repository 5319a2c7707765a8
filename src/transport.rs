//! Transport clients that put requests on the wire.

use crate::{Error, RequestContent, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// A request ready for dispatch, replayed unchanged on each attempt.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Identity of the descriptor this request was built from.
    pub identity: Uuid,
    /// Wire method.
    pub method: Method,
    /// Route relative to the base address, including any query string.
    pub route: String,
    /// Optional body.
    pub content: Option<RequestContent>,
}

/// Status, headers and body returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Numeric status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Full response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Sends requests and returns raw responses.
///
/// Implementations report a per-attempt timeout as [`Error::Timeout`]; the
/// executor retries those. `Ok(None)` means the transport produced no response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one attempt.
    async fn send(&self, request: &TransportRequest) -> Result<Option<RawResponse>>;
}

/// Transport backed by a configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    base_address: Url,
}

impl ReqwestTransport {
    /// Builds a transport with a base address, per-attempt timeout and default headers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the timeout is zero or the
    /// underlying client cannot be built.
    pub fn new(base_address: Url, timeout: Duration, default_headers: HeaderMap) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidArgument(
                "The timeout must be greater than zero".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_address,
        })
    }

    /// The base address routes are resolved against.
    pub fn base_address(&self) -> &Url {
        &self.base_address
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<Option<RawResponse>> {
        let url = self.base_address.join(&request.route)?;

        tracing::debug!(
            request_id = %request.identity,
            method = %request.method,
            url = %url,
            "Executing HTTP request"
        );

        let mut builder = self.http_client.request(request.method.clone(), url);
        if let Some(content) = &request.content {
            let content_type = HeaderValue::try_from(content.content_type.as_str())
                .map_err(|e| Error::InvalidArgument(format!("Invalid content type: {}", e)))?;
            builder = builder
                .header(CONTENT_TYPE, content_type)
                .body(content.body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(Some(RawResponse {
            status,
            headers,
            body,
        }))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(error)
    }
}
