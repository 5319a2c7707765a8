//! Request descriptors produced by the fluent builder.

use bytes::Bytes;
use std::fmt;
use uuid::Uuid;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiMethod {
    /// No method chosen. Dispatched as `GET`.
    #[default]
    None,
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl ApiMethod {
    /// Returns `true` if a request body is meaningful for this method.
    pub fn allows_content(&self) -> bool {
        matches!(self, ApiMethod::Post | ApiMethod::Put | ApiMethod::Patch)
    }

    /// The wire method used for dispatch.
    pub fn as_http(&self) -> http::Method {
        match self {
            ApiMethod::None | ApiMethod::Get => http::Method::GET,
            ApiMethod::Post => http::Method::POST,
            ApiMethod::Put => http::Method::PUT,
            ApiMethod::Patch => http::Method::PATCH,
            ApiMethod::Delete => http::Method::DELETE,
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApiMethod::None => "NONE",
            ApiMethod::Get => "GET",
            ApiMethod::Post => "POST",
            ApiMethod::Put => "PUT",
            ApiMethod::Patch => "PATCH",
            ApiMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Serialized request body together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContent {
    /// Encoded body.
    pub body: Bytes,
    /// Value of the `Content-Type` header.
    pub content_type: String,
}

impl RequestContent {
    /// Creates request content from raw bytes.
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

/// Everything needed to dispatch one logical request.
///
/// Descriptors are built by the fluent API, handed to the handler by value
/// and replayed unchanged on every retry.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Identity used to correlate events for this request.
    pub identity: Uuid,
    /// HTTP method.
    pub method: ApiMethod,
    /// Endpoint template below the resource, e.g. `{0}/Classes`.
    pub endpoint: Option<String>,
    /// Positional parameters substituted into the endpoint.
    pub parameters: Vec<String>,
    /// Query entries in insertion order.
    pub query: Vec<(String, String)>,
    /// Serialized body.
    pub content: Option<RequestContent>,
    /// Name of the type the response is decoded into, used for logging.
    pub response_type: Option<&'static str>,
}

impl RequestDescriptor {
    /// Creates an empty descriptor with a fresh identity.
    pub fn new(method: ApiMethod) -> Self {
        Self {
            identity: Uuid::new_v4(),
            method,
            endpoint: None,
            parameters: Vec::new(),
            query: Vec::new(),
            content: None,
            response_type: None,
        }
    }

    /// Returns `true` if a body is attached.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self::new(ApiMethod::None)
    }
}
