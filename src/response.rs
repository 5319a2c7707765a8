//! Structured results of API calls.
//!
//! Every logical call produces exactly one [`ApiResponse`], however many
//! attempts it took. A response is either a success (status in the success
//! set, no message, no error) or a failure carrying a status, an optional
//! message and an optional error.

use crate::{ApiStatus, Error};
use http::HeaderMap;
use std::time::Duration;
use uuid::Uuid;

/// The result of an API call.
///
/// # Examples
///
/// ```no_run
/// use ferrapi::ApiHandler;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User { id: u64, name: String }
///
/// # async fn example() -> Result<(), ferrapi::Error> {
/// let handler = ApiHandler::builder()
///     .base_address("https://api.example.com")?
///     .resource("Users")
///     .build()?;
///
/// let response = handler
///     .request()
///     .get()
///     .with_parameter(123)
///     .responds_with::<User>()
///     .execute()
///     .await?;
///
/// if response.was_successful {
///     if let Some(user) = &response.data {
///         println!("User {}: {}", user.id, user.name);
///     }
/// } else {
///     eprintln!("{}: {:?}", response.status, response.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiResponse<T = ()> {
    /// Classified status.
    pub status: ApiStatus,

    /// `true` only for responses in the success set.
    pub was_successful: bool,

    /// Human-readable failure message. Always `None` on success.
    pub message: Option<String>,

    /// Error behind a failure. Always `None` on success.
    pub error: Option<Error>,

    /// Decoded body. Only populated on success.
    pub data: Option<T>,

    /// Identity of the request that produced this response.
    pub request_id: Uuid,

    /// Response headers, empty when no response was received.
    pub headers: HeaderMap,

    /// Number of attempts dispatched.
    pub attempts: usize,

    /// Time from the first dispatch until the response was classified.
    pub latency: Duration,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn success(status: ApiStatus, data: Option<T>) -> Self {
        Self {
            status,
            was_successful: true,
            message: None,
            error: None,
            data,
            request_id: Uuid::nil(),
            headers: HeaderMap::new(),
            attempts: 0,
            latency: Duration::ZERO,
        }
    }

    /// Creates a failed response.
    pub fn failure(status: ApiStatus, message: Option<String>, error: Option<Error>) -> Self {
        Self {
            status,
            was_successful: false,
            message,
            error,
            data: None,
            request_id: Uuid::nil(),
            headers: HeaderMap::new(),
            attempts: 0,
            latency: Duration::ZERO,
        }
    }

    pub(crate) fn with_transaction(
        mut self,
        request_id: Uuid,
        headers: HeaderMap,
        attempts: usize,
        latency: Duration,
    ) -> Self {
        self.request_id = request_id;
        self.headers = headers;
        self.attempts = attempts;
        self.latency = latency;
        self
    }

    pub(crate) fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Maps the data to a different type, keeping everything else.
    ///
    /// ```
    /// use ferrapi::{ApiResponse, ApiStatus};
    ///
    /// let response = ApiResponse::success(ApiStatus::Ok, Some(42));
    /// let response = response.map(|n| n.to_string());
    /// assert_eq!(response.data.as_deref(), Some("42"));
    /// ```
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponse {
            status: self.status,
            was_successful: self.was_successful,
            message: self.message,
            error: self.error,
            data: self.data.map(f),
            request_id: self.request_id,
            headers: self.headers,
            attempts: self.attempts,
            latency: self.latency,
        }
    }

    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Converts the response into its data, or the error behind a failure.
    ///
    /// Failures without an attached error are reported as
    /// [`Error::InvalidArgument`] carrying the status and message.
    pub fn into_result(self) -> crate::Result<Option<T>> {
        if self.was_successful {
            return Ok(self.data);
        }

        match self.error {
            Some(error) => Err(error),
            None => Err(Error::InvalidArgument(format!(
                "Request failed with status {}: {}",
                self.status,
                self.message.unwrap_or_default()
            ))),
        }
    }
}
