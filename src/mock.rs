//! In-process mock transport.
//!
//! [`MockTransport`] answers requests from canned [`MockResponse`]s keyed by
//! method and relative route (query string included). It is useful for tests
//! and for running consumers without a live API.

use crate::factory::{BuiltClient, ClientFactory, ClientOptions};
use crate::serializer::{serialize, JsonSerializer};
use crate::transport::{RawResponse, Transport, TransportRequest};
use crate::{ApiMethod, Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockOutcome {
    Respond(RawResponse),
    TimeOut,
}

/// A canned answer for one route.
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: MockOutcome,
    delay: Option<Duration>,
}

impl MockResponse {
    /// Responds with a status and an empty body.
    pub fn status(status: u16) -> Self {
        Self {
            outcome: MockOutcome::Respond(RawResponse::new(status, Bytes::new())),
            delay: None,
        }
    }

    /// Responds with a status and a text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::bytes(status, body.into())
    }

    /// Responds with a status and a raw body.
    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            outcome: MockOutcome::Respond(RawResponse::new(status, body.into())),
            delay: None,
        }
    }

    /// Responds with a status and a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if the body cannot be encoded.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Result<Self> {
        let content = serialize(&JsonSerializer::new(), body)?;
        Self::bytes(status, content.body).header("content-type", &content.content_type)
    }

    /// Every attempt against this route times out.
    pub fn timeout() -> Self {
        Self {
            outcome: MockOutcome::TimeOut,
            delay: None,
        }
    }

    /// Adds a response header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::InvalidArgument(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidArgument(format!("Invalid header value: {}", e)))?;
        if let MockOutcome::Respond(raw) = &mut self.outcome {
            raw.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Waits before answering. The wait is abandoned if the request is cancelled.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Transport that serves [`MockResponse`]s.
///
/// Unregistered routes produce no response, which is classified as an empty
/// response. A route registered with a sequence answers with each entry in
/// turn and keeps repeating the last one.
///
/// ```
/// use ferrapi::mock::{MockResponse, MockTransport};
/// use ferrapi::ApiMethod;
///
/// let mock = MockTransport::new()
///     .on(ApiMethod::Get, "api/Users/1", MockResponse::text(200, r#"{"id":1}"#))
///     .on(ApiMethod::Get, "api/Users/2", MockResponse::timeout())
///     .on_sequence(
///         ApiMethod::Get,
///         "api/Users/3",
///         [MockResponse::timeout(), MockResponse::status(204)],
///     );
/// assert_eq!(mock.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), VecDeque<MockResponse>>>,
    client_headers: Mutex<HeaderMap>,
    calls: AtomicUsize,
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response for a method and relative route.
    pub fn on(self, method: ApiMethod, route: impl Into<String>, response: MockResponse) -> Self {
        self.register(method, route, response);
        self
    }

    /// Registers a sequence of responses for a method and relative route.
    pub fn on_sequence<I>(self, method: ApiMethod, route: impl Into<String>, responses: I) -> Self
    where
        I: IntoIterator<Item = MockResponse>,
    {
        self.register_sequence(method, route, responses);
        self
    }

    /// Registers or replaces a response on a shared mock.
    pub fn register(&self, method: ApiMethod, route: impl Into<String>, response: MockResponse) {
        self.register_sequence(method, route, [response]);
    }

    /// Registers or replaces a sequence of responses on a shared mock.
    pub fn register_sequence<I>(&self, method: ApiMethod, route: impl Into<String>, responses: I)
    where
        I: IntoIterator<Item = MockResponse>,
    {
        let key = (method.as_http(), normalise(&route.into()));
        lock(&self.responses).insert(key, responses.into_iter().collect());
    }

    /// Number of attempts dispatched to this mock.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Headers resolved for the most recently built client, credentials included.
    pub fn client_headers(&self) -> HeaderMap {
        lock(&self.client_headers).clone()
    }

    fn next_response(&self, key: &(Method, String)) -> Option<MockResponse> {
        let mut responses = lock(&self.responses);
        let queue = responses.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn normalise(route: &str) -> String {
    route.trim().trim_start_matches('/').to_string()
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &TransportRequest) -> Result<Option<RawResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let key = (request.method.clone(), normalise(&request.route));
        let Some(response) = self.next_response(&key) else {
            tracing::debug!(
                method = %request.method,
                route = %request.route,
                "No mock registered for route"
            );
            return Ok(None);
        };

        if let Some(delay) = response.delay {
            tokio::time::sleep(delay).await;
        }

        match response.outcome {
            MockOutcome::Respond(raw) => Ok(Some(raw)),
            MockOutcome::TimeOut => Err(Error::Timeout),
        }
    }
}

/// Client factory that always hands out the same [`MockTransport`].
///
/// Client headers are still resolved on every build, so authenticator
/// errors surface exactly as they would against a live API.
#[derive(Debug, Clone)]
pub struct MockClientFactory {
    transport: Arc<MockTransport>,
}

impl MockClientFactory {
    /// Wraps a shared mock.
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn build_client(&self, options: &ClientOptions) -> Result<BuiltClient> {
        let headers = options.headers().await?;
        *lock(&self.transport.client_headers) = headers;
        Ok(BuiltClient::new(self.transport.clone(), false))
    }
}
