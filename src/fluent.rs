//! Fluent request building.
//!
//! Requests are assembled in stages so that calls can only be made in a
//! meaningful order:
//!
//! 1. [`ApiRequest`]: pick a method.
//! 2. [`MethodRequest`]: endpoint template, parameters, query and content.
//! 3. [`TypedRequest`]: the response type is fixed, only execution remains.
//!
//! ```no_run
//! use ferrapi::ApiHandler;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Class { id: u64, title: String }
//!
//! # async fn example() -> Result<(), ferrapi::Error> {
//! let handler = ApiHandler::builder()
//!     .base_address("https://api.example.com")?
//!     .resource("Students")
//!     .build()?;
//!
//! // GET Students/42/Classes?term=spring
//! let classes = handler
//!     .request()
//!     .get()
//!     .against_resource("{0}/Classes")
//!     .with_parameter(42)
//!     .with_query("term", "spring")
//!     .responds_with::<Vec<Class>>()
//!     .execute()
//!     .await?;
//!
//! for class in classes.data.unwrap_or_default() {
//!     println!("{}: {}", class.id, class.title);
//! }
//! # Ok(())
//! # }
//! ```

use crate::classify::{decode_nothing, decode_stream, decode_typed, Decoder};
use crate::serializer::serialize;
use crate::{ApiHandler, ApiMethod, ApiResponse, RequestContent, RequestDescriptor, Result};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;

/// First stage: no method chosen yet.
pub struct ApiRequest<'a> {
    handler: &'a ApiHandler,
}

impl<'a> ApiRequest<'a> {
    pub(crate) fn new(handler: &'a ApiHandler) -> Self {
        Self { handler }
    }

    /// Chooses the request method.
    pub fn using_method(self, method: ApiMethod) -> MethodRequest<'a> {
        MethodRequest {
            handler: self.handler,
            descriptor: RequestDescriptor::new(method),
        }
    }

    /// Shorthand for `using_method(ApiMethod::Get)`.
    pub fn get(self) -> MethodRequest<'a> {
        self.using_method(ApiMethod::Get)
    }

    /// Shorthand for `using_method(ApiMethod::Post)`.
    pub fn post(self) -> MethodRequest<'a> {
        self.using_method(ApiMethod::Post)
    }

    /// Shorthand for `using_method(ApiMethod::Put)`.
    pub fn put(self) -> MethodRequest<'a> {
        self.using_method(ApiMethod::Put)
    }

    /// Shorthand for `using_method(ApiMethod::Patch)`.
    pub fn patch(self) -> MethodRequest<'a> {
        self.using_method(ApiMethod::Patch)
    }

    /// Shorthand for `using_method(ApiMethod::Delete)`.
    pub fn delete(self) -> MethodRequest<'a> {
        self.using_method(ApiMethod::Delete)
    }
}

/// Second stage: method chosen, route and content being assembled.
pub struct MethodRequest<'a> {
    handler: &'a ApiHandler,
    descriptor: RequestDescriptor,
}

impl<'a> MethodRequest<'a> {
    /// Sets the endpoint template below the resource, e.g. `{0}/Classes`.
    pub fn against_resource(mut self, endpoint: impl Into<String>) -> Self {
        self.descriptor.endpoint = Some(endpoint.into());
        self
    }

    /// Appends a positional parameter.
    pub fn with_parameter(mut self, parameter: impl ToString) -> Self {
        self.descriptor.parameters.push(parameter.to_string());
        self
    }

    /// Appends several positional parameters.
    pub fn with_parameters<I>(mut self, parameters: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.descriptor
            .parameters
            .extend(parameters.into_iter().map(|p| p.to_string()));
        self
    }

    /// Sets a query entry. Setting an existing key replaces its value in place.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();

        match self.descriptor.query.iter().position(|(k, _)| *k == key) {
            Some(index) => self.descriptor.query[index].1 = value,
            None => self.descriptor.query.push((key, value)),
        }
        self
    }

    /// Sets several query entries.
    pub fn with_queries<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        entries
            .into_iter()
            .fold(self, |request, (key, value)| request.with_query(key, value))
    }

    /// Serializes `content` with the handler's serializer and attaches it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`](crate::Error::SerializationFailed)
    /// if the value cannot be encoded.
    pub fn with_content<T>(mut self, content: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        self.descriptor.content = Some(serialize(self.handler.serializer(), content)?);
        Ok(self)
    }

    /// Attaches an already encoded body.
    pub fn with_raw_content(
        mut self,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        self.descriptor.content = Some(RequestContent::new(body, content_type));
        self
    }

    /// The descriptor assembled so far.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Consumes the builder and returns its descriptor.
    pub fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }

    /// Decodes the response body into `T` with the handler's serializer.
    pub fn responds_with<T>(mut self) -> TypedRequest<'a, T>
    where
        T: DeserializeOwned,
    {
        self.descriptor.response_type = Some(std::any::type_name::<T>());
        TypedRequest {
            handler: self.handler,
            descriptor: self.descriptor,
            decoder: decode_typed::<T>,
        }
    }

    /// Returns the response body as raw bytes.
    pub fn responds_with_stream(mut self) -> TypedRequest<'a, Bytes> {
        self.descriptor.response_type = Some("bytes::Bytes");
        TypedRequest {
            handler: self.handler,
            descriptor: self.descriptor,
            decoder: decode_stream,
        }
    }

    /// Executes the request, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiHandler::perform_request`].
    pub async fn execute(self) -> Result<ApiResponse> {
        self.execute_with_cancellation(CancellationToken::new()).await
    }

    /// Executes the request with a cancellation token.
    ///
    /// # Errors
    ///
    /// See [`ApiHandler::perform_request`].
    pub async fn execute_with_cancellation(self, token: CancellationToken) -> Result<ApiResponse> {
        self.handler
            .perform_request_with(self.descriptor, decode_nothing, &token)
            .await
    }
}

/// Final stage: response type fixed.
pub struct TypedRequest<'a, T> {
    handler: &'a ApiHandler,
    descriptor: RequestDescriptor,
    decoder: Decoder<T>,
}

impl<'a, T> TypedRequest<'a, T> {
    /// The descriptor that will be executed.
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Executes the request.
    ///
    /// # Errors
    ///
    /// See [`ApiHandler::perform_request`].
    pub async fn execute(self) -> Result<ApiResponse<T>> {
        self.execute_with_cancellation(CancellationToken::new()).await
    }

    /// Executes the request with a cancellation token.
    ///
    /// # Errors
    ///
    /// See [`ApiHandler::perform_request`].
    pub async fn execute_with_cancellation(
        self,
        token: CancellationToken,
    ) -> Result<ApiResponse<T>> {
        self.handler
            .perform_request_with(self.descriptor, self.decoder, &token)
            .await
    }
}
