//! Error types for API handlers.
//!
//! Configuration mistakes (bad URLs, invalid header values, missing endpoint
//! templates) and request-time failures (timeouts, transport errors, malformed
//! payloads) share one [`Error`] type. Request-time errors are normally folded
//! into a failed [`ApiResponse`](crate::ApiResponse) by the handler; they only
//! reach the caller when the handler is configured to throw.

use crate::status::ApiStatus;

/// Boxed error returned by pluggable collaborators such as serializers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for API handlers.
///
/// # Examples
///
/// ```no_run
/// use ferrapi::{ApiHandler, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let handler = ApiHandler::builder()
///     .base_address("https://api.example.com")?
///     .resource("Users")
///     .throw_exceptions(true)
///     .build()?;
///
/// match handler.request().get().responds_with::<serde_json::Value>().execute().await {
///     Ok(response) => println!("Status: {}", response.status),
///     Err(e) if e.is_timeout() => eprintln!("Gave up: {}", e),
///     Err(Error::Network(e)) => eprintln!("Transport failure: {}", e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A single attempt timed out.
    ///
    /// The executor retries these until the retry budget is spent, at which
    /// point it reports [`Error::RetriesExhausted`] instead.
    #[error("Request timed out")]
    Timeout,

    /// Every attempt allowed by the retry budget timed out.
    #[error("Request timed out after {attempts} attempt(s)")]
    RetriesExhausted {
        /// The number of attempts that were dispatched.
        attempts: usize,
    },

    /// The caller cancelled the request.
    #[error("Request was cancelled")]
    Cancelled,

    /// An invalid argument or configuration value was supplied.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The endpoint template did not match the supplied parameters.
    #[error("Endpoint format error: {0}")]
    Format(String),

    /// The handler was used after it was disposed.
    #[error("The API handler has been disposed")]
    Disposed,

    /// The response body could not be deserialized into the expected type.
    ///
    /// Both the raw body and the serializer's message are preserved.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serializer error message
        serde_error: String,
        /// The status reported by the transport
        status: ApiStatus,
    },

    /// The request content could not be serialized.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The authenticator could not produce credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` for timeout-class errors.
    ///
    /// ```
    /// use ferrapi::Error;
    ///
    /// assert!(Error::Timeout.is_timeout());
    /// assert!(Error::RetriesExhausted { attempts: 3 }.is_timeout());
    /// assert!(!Error::Cancelled.is_timeout());
    /// ```
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout | Error::RetriesExhausted { .. } => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns the status carried by this error, if any.
    pub fn status(&self) -> Option<ApiStatus> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| ApiStatus::from_code(s.as_u16())),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for API handlers.
pub type Result<T> = std::result::Result<T, Error>;
