//! API handlers and their builder.
//!
//! The [`ApiHandler`] type is the main entry point. It owns the connection
//! settings and collaborators, executes request descriptors through the
//! retrying executor and converts request-time errors into failed
//! [`ApiResponse`]s unless configured to throw.

use crate::auth::Authenticator;
use crate::classify::{decode_nothing, decode_typed, Decoder};
use crate::dialect::{RestDialect, WireDialect};
use crate::events::{ApiEvent, EventPublisher};
use crate::executor::RequestExecutor;
use crate::factory::{CachedClientFactory, ClientFactory, ClientOptions, DefaultClientFactory};
use crate::fluent::ApiRequest;
use crate::mock::{MockClientFactory, MockTransport};
use crate::serializer::{JsonSerializer, Serializer};
use crate::settings::DEFAULT_TIMEOUT;
use crate::{
    ApiResponse, ApiStatus, ConnectionSettings, Error, HandlerConfiguration, RequestDescriptor,
    Result,
};
use http::{header::ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Message attached to failures caused by unexpected errors.
pub const UNEXPECTED_FAILURE_MESSAGE: &str =
    "An unexpected error occurred while performing the request";

/// A configured consumer of one API resource.
///
/// Handlers are cheap to clone; clones share settings, collaborators and
/// disposal state.
///
/// # Examples
///
/// ```no_run
/// use ferrapi::{ApiHandler, ApiResponse};
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct CreateUser { name: String }
///
/// #[derive(Deserialize)]
/// struct User { id: u64, name: String }
///
/// # async fn example() -> Result<(), ferrapi::Error> {
/// let handler = ApiHandler::builder()
///     .base_address("https://api.example.com")?
///     .resource_path("api")
///     .resource("Users")
///     .timeout(Duration::from_secs(10))
///     .retry_attempts(3)
///     .build()?;
///
/// // GET api/Users/123
/// let user: ApiResponse<User> = handler
///     .request()
///     .get()
///     .with_parameter(123)
///     .responds_with()
///     .execute()
///     .await?;
///
/// // POST api/Users
/// let created: ApiResponse<User> = handler
///     .request()
///     .post()
///     .with_content(&CreateUser { name: "Alice".to_string() })?
///     .responds_with()
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiHandler {
    inner: Arc<HandlerInner>,
}

struct HandlerInner {
    settings: Arc<ConnectionSettings>,
    executor: RequestExecutor,
    client_factory: Arc<dyn ClientFactory>,
    serializer: Arc<dyn Serializer>,
    events: EventPublisher,
    throw_exceptions: bool,
    disposed: AtomicBool,
}

impl ApiHandler {
    /// Creates a new [`HandlerBuilder`].
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::new()
    }

    /// Starts a fluent request against this handler's resource.
    pub fn request(&self) -> ApiRequest<'_> {
        ApiRequest::new(self)
    }

    /// The connection settings this handler was built with.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    /// The serializer used for request and response bodies.
    pub fn serializer(&self) -> &dyn Serializer {
        self.inner.serializer.as_ref()
    }

    /// Whether request-time errors are returned as `Err` instead of failed responses.
    pub fn throws_exceptions(&self) -> bool {
        self.inner.throw_exceptions
    }

    /// Subscribes to request, retry, response and disposal events.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.inner.events.subscribe()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Releases the handler's clients. Later calls are no-ops.
    ///
    /// Publishes [`ApiEvent::Disposed`] the first time only.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.client_factory.release();
        tracing::debug!("API handler disposed");
        self.inner.events.publish(ApiEvent::Disposed);
    }

    /// Executes a descriptor, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disposed`] after disposal. Other errors are only
    /// returned when the handler throws exceptions.
    pub async fn perform_request(
        &self,
        descriptor: RequestDescriptor,
        token: &CancellationToken,
    ) -> Result<ApiResponse> {
        self.perform_request_with(descriptor, decode_nothing, token).await
    }

    /// Executes a descriptor and deserializes the body into `T`.
    ///
    /// # Errors
    ///
    /// See [`perform_request`](Self::perform_request).
    pub async fn perform_request_as<T>(
        &self,
        descriptor: RequestDescriptor,
        token: &CancellationToken,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        self.perform_request_with(descriptor, decode_typed::<T>, token).await
    }

    /// Executes a descriptor with an explicit body decoder.
    ///
    /// # Errors
    ///
    /// See [`perform_request`](Self::perform_request).
    pub async fn perform_request_with<T>(
        &self,
        descriptor: RequestDescriptor,
        decoder: Decoder<T>,
        token: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        if self.is_disposed() {
            return Err(Error::Disposed);
        }

        let request_id = descriptor.identity;
        match self.inner.executor.perform(&descriptor, decoder, token).await {
            Ok(response) => Ok(response),
            Err(e) if self.inner.throw_exceptions => Err(e),
            Err(e) if e.is_timeout() => {
                tracing::warn!(request_id = %request_id, error = %e, "Request timed out");
                let message = e.to_string();
                Ok(ApiResponse::failure(ApiStatus::TimedOut, Some(message), Some(e))
                    .with_request_id(request_id))
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    error = %e,
                    "Request failed with an unexpected error"
                );
                Ok(ApiResponse::failure(
                    ApiStatus::None,
                    Some(UNEXPECTED_FAILURE_MESSAGE.to_string()),
                    Some(e),
                )
                .with_request_id(request_id))
            }
        }
    }
}

/// Builder for configuring and creating an [`ApiHandler`].
///
/// # Examples
///
/// ```no_run
/// use ferrapi::{ApiHandler, BearerTokenAuthenticator};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), ferrapi::Error> {
/// let handler = ApiHandler::builder()
///     .base_address("https://api.example.com")?
///     .resource("Users")
///     .timeout(Duration::from_secs(30))
///     .retry_attempts(3)
///     .default_header("User-Agent", "my-app/1.0")?
///     .authenticator(BearerTokenAuthenticator::new("token"))
///     .cache_client(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HandlerBuilder {
    base_address: Option<Url>,
    resource: Option<String>,
    resource_path: Option<String>,
    timeout: Duration,
    retry_attempts: usize,
    throw_exceptions: bool,
    default_headers: HeaderMap,
    authenticator: Option<Arc<dyn Authenticator>>,
    serializer: Arc<dyn Serializer>,
    dialect: Arc<dyn WireDialect>,
    cache_client: bool,
    client_factory: Option<Arc<dyn ClientFactory>>,
}

impl HandlerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            base_address: None,
            resource: None,
            resource_path: None,
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: 0,
            throw_exceptions: false,
            default_headers: HeaderMap::new(),
            authenticator: None,
            serializer: Arc::new(JsonSerializer::new()),
            dialect: Arc::new(RestDialect),
            cache_client: false,
            client_factory: None,
        }
    }

    /// Sets the base address of the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_address(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_address = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the resource name, e.g. `Users`.
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Sets the path placed in front of the resource, e.g. `api`.
    pub fn resource_path(mut self, resource_path: impl Into<String>) -> Self {
        self.resource_path = Some(resource_path.into());
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the total attempt budget for timed-out requests. `0` never retries.
    pub fn retry_attempts(mut self, retry_attempts: usize) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Returns request-time errors to the caller instead of failed responses.
    pub fn throw_exceptions(mut self, throw_exceptions: bool) -> Self {
        self.throw_exceptions = throw_exceptions;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::InvalidArgument(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidArgument(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Registers an authenticator whose header is attached to every client.
    pub fn authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Replaces the JSON serializer.
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Replaces the REST wire dialect.
    pub fn dialect(mut self, dialect: impl WireDialect + 'static) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Reuses one client for the lifetime of the handler.
    pub fn cache_client(mut self, cache_client: bool) -> Self {
        self.cache_client = cache_client;
        self
    }

    /// Uses a custom client factory. Overrides [`cache_client`](Self::cache_client).
    ///
    /// The factory receives the handler's default headers and authenticator
    /// through [`ClientOptions`] each time it builds a client.
    pub fn client_factory(mut self, client_factory: Arc<dyn ClientFactory>) -> Self {
        self.client_factory = Some(client_factory);
        self
    }

    /// Serves every request from a [`MockTransport`].
    pub fn mock(self, transport: Arc<MockTransport>) -> Self {
        self.client_factory(Arc::new(MockClientFactory::new(transport)))
    }

    /// Applies a loaded [`HandlerConfiguration`].
    ///
    /// # Errors
    ///
    /// Returns an error if the base address or a header is invalid.
    pub fn configuration(mut self, configuration: &HandlerConfiguration) -> Result<Self> {
        let settings = configuration.connection_settings()?;

        self.base_address = Some(settings.base_address().clone());
        self.resource = settings.resource().map(str::to_string);
        self.resource_path = settings.resource_path().map(str::to_string);
        self.timeout = settings.timeout();
        self.retry_attempts = settings.retry_attempts();
        self.throw_exceptions = configuration.throw_exceptions;
        self.cache_client = configuration.cache_client;

        for (name, value) in &configuration.headers {
            self = self.default_header(name, value)?;
        }

        Ok(self)
    }

    /// Builds the configured [`ApiHandler`].
    ///
    /// # Errors
    ///
    /// Returns an error if no base address was provided.
    pub fn build(self) -> Result<ApiHandler> {
        let base_address = self
            .base_address
            .ok_or_else(|| Error::InvalidArgument("A base address is required".to_string()))?;

        let settings = Arc::new(ConnectionSettings::new(
            base_address.as_str(),
            self.resource.as_deref(),
            self.resource_path.as_deref(),
            self.timeout,
            self.retry_attempts,
        )?);

        let mut default_headers = self.default_headers;
        if !default_headers.contains_key(ACCEPT) {
            let accept = HeaderValue::try_from(self.serializer.content_type())
                .map_err(|e| Error::InvalidArgument(format!("Invalid content type: {}", e)))?;
            default_headers.insert(ACCEPT, accept);
        }

        let client_options =
            ClientOptions::new(settings.clone(), default_headers, self.authenticator);
        let client_factory: Arc<dyn ClientFactory> = match self.client_factory {
            Some(factory) => factory,
            None if self.cache_client => Arc::new(CachedClientFactory::new()),
            None => Arc::new(DefaultClientFactory),
        };

        let events = EventPublisher::new();
        let executor = RequestExecutor::new(
            settings.clone(),
            client_options,
            client_factory.clone(),
            self.serializer.clone(),
            self.dialect,
            events.clone(),
        );

        Ok(ApiHandler {
            inner: Arc::new(HandlerInner {
                settings,
                executor,
                client_factory,
                serializer: self.serializer,
                events,
                throw_exceptions: self.throw_exceptions,
                disposed: AtomicBool::new(false),
            }),
        })
    }
}

impl Default for HandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
