//! Authenticators that supply the `Authorization` header.

use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

/// Scheme and parameter of an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeader {
    /// Scheme, e.g. `Bearer`.
    pub scheme: String,
    /// Credentials following the scheme.
    pub parameter: String,
}

impl AuthorizationHeader {
    /// Creates a header value from a scheme and parameter.
    pub fn new(scheme: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            parameter: parameter.into(),
        }
    }
}

impl fmt::Display for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.scheme, self.parameter)
    }
}

/// Produces credentials for outgoing requests.
///
/// The client factory calls this each time it builds a client. Errors are
/// propagated unchanged.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use ferrapi::{Authenticator, AuthorizationHeader, Result};
///
/// struct ApiKey(String);
///
/// #[async_trait]
/// impl Authenticator for ApiKey {
///     async fn authorize(&self) -> Result<AuthorizationHeader> {
///         Ok(AuthorizationHeader::new("ApiKey", self.0.clone()))
///     }
/// }
/// ```
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the header to attach to requests.
    async fn authorize(&self) -> Result<AuthorizationHeader>;
}

/// Static bearer token.
#[derive(Clone)]
pub struct BearerTokenAuthenticator {
    token: String,
}

impl BearerTokenAuthenticator {
    /// Creates an authenticator for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authorize(&self) -> Result<AuthorizationHeader> {
        if self.token.trim().is_empty() {
            return Err(Error::Authentication("Bearer token is empty".to_string()));
        }
        Ok(AuthorizationHeader::new("Bearer", self.token.clone()))
    }
}

/// HTTP basic credentials.
#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    /// Creates an authenticator for the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authorize(&self) -> Result<AuthorizationHeader> {
        let credentials = format!("{}:{}", self.username, self.password);
        Ok(AuthorizationHeader::new("Basic", STANDARD.encode(credentials)))
    }
}
