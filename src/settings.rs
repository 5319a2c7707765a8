//! Connection settings and serde-loadable handler configuration.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable connection settings owned by a handler.
///
/// The base address is always slash-terminated; the resource and resource
/// path never start or end with a slash.
///
/// # Examples
///
/// ```
/// use ferrapi::ConnectionSettings;
/// use std::time::Duration;
///
/// let settings = ConnectionSettings::new(
///     "https://api.example.com/v1",
///     Some("Users/"),
///     Some("/api/"),
///     Duration::from_secs(10),
///     3,
/// )
/// .unwrap();
///
/// assert_eq!(settings.base_address().as_str(), "https://api.example.com/v1/");
/// assert_eq!(settings.resource(), Some("Users"));
/// assert_eq!(settings.resource_path(), Some("api"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    base_address: Url,
    resource: Option<String>,
    resource_path: Option<String>,
    timeout: Duration,
    retry_attempts: usize,
}

impl ConnectionSettings {
    /// Creates normalised connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the base address is not an absolute URL.
    pub fn new(
        base_address: impl AsRef<str>,
        resource: Option<&str>,
        resource_path: Option<&str>,
        timeout: Duration,
        retry_attempts: usize,
    ) -> Result<Self> {
        let mut base = base_address.as_ref().trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            base_address: Url::parse(&base)?,
            resource: resource.and_then(trim_segment),
            resource_path: resource_path.and_then(trim_segment),
            timeout,
            retry_attempts,
        })
    }

    /// The slash-terminated base address.
    pub fn base_address(&self) -> &Url {
        &self.base_address
    }

    /// The resource name, e.g. `Users`.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The path placed in front of the resource, e.g. `api`.
    pub fn resource_path(&self) -> Option<&str> {
        self.resource_path.as_deref()
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Total attempt budget for timed-out requests. `0` means never retry.
    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts
    }
}

fn trim_segment(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Handler configuration as it would be stored in a settings file.
///
/// Field names are camelCase so the record can be read straight from JSON.
///
/// ```
/// use ferrapi::HandlerConfiguration;
///
/// let config: HandlerConfiguration = serde_json::from_str(r#"{
///     "baseAddress": "https://api.example.com",
///     "resource": "Users",
///     "timeoutSeconds": 5,
///     "retryAttempts": 2
/// }"#).unwrap();
///
/// let settings = config.connection_settings().unwrap();
/// assert_eq!(settings.retry_attempts(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfiguration {
    /// Absolute base address of the API.
    pub base_address: String,
    /// Resource name appended to the resource path.
    #[serde(default)]
    pub resource: Option<String>,
    /// Path placed in front of the resource.
    #[serde(default)]
    pub resource_path: Option<String>,
    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i64,
    /// Total attempt budget for timed-out requests.
    #[serde(default)]
    pub retry_attempts: usize,
    /// Rethrow request-time errors instead of converting them to failed responses.
    #[serde(default)]
    pub throw_exceptions: bool,
    /// Reuse one transport client for the lifetime of the handler.
    #[serde(default)]
    pub cache_client: bool,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout_seconds() -> i64 {
    DEFAULT_TIMEOUT.as_secs() as i64
}

impl HandlerConfiguration {
    /// Converts the configuration into [`ConnectionSettings`].
    ///
    /// Non-positive timeouts are carried through as a zero duration, which the
    /// client factory rejects when it builds a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base address is invalid.
    pub fn connection_settings(&self) -> Result<ConnectionSettings> {
        if self.base_address.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "A base address is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(self.timeout_seconds.max(0) as u64);
        ConnectionSettings::new(
            &self.base_address,
            self.resource.as_deref(),
            self.resource_path.as_deref(),
            timeout,
            self.retry_attempts,
        )
    }
}
