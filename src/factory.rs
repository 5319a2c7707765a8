//! Client factories.
//!
//! A factory hands the executor a [`Transport`] for each logical call and
//! says whether that client should be released when the call finishes. The
//! executor passes the handler's [`ClientOptions`] on every build so that
//! default headers and credentials are resolved whichever factory is used.

use crate::auth::Authenticator;
use crate::transport::{ReqwestTransport, Transport};
use crate::{ConnectionSettings, Error, Result};
use async_trait::async_trait;
use http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A client handed out by a [`ClientFactory`].
pub struct BuiltClient {
    /// The transport to send attempts through.
    pub client: Arc<dyn Transport>,
    /// Release the client once the logical call completes.
    pub dispose_after_use: bool,
}

impl BuiltClient {
    /// Wraps a transport.
    pub fn new(client: Arc<dyn Transport>, dispose_after_use: bool) -> Self {
        Self {
            client,
            dispose_after_use,
        }
    }

    /// Releases the client if it was built for a single call.
    pub(crate) fn finish(self) {
        if self.dispose_after_use {
            tracing::trace!("Disposing transport client");
            drop(self.client);
        }
    }
}

/// Builds transport clients for the executor.
///
/// Implementations must resolve [`ClientOptions::headers`] when they build a
/// client so that authenticator errors reach the caller unchanged.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Returns a client for one logical call.
    async fn build_client(&self, options: &ClientOptions) -> Result<BuiltClient>;

    /// Drops any client the factory keeps alive. Called when the handler is disposed.
    fn release(&self) {}
}

/// Settings, default headers and credentials applied to every client.
#[derive(Clone)]
pub struct ClientOptions {
    settings: Arc<ConnectionSettings>,
    default_headers: HeaderMap,
    authenticator: Option<Arc<dyn Authenticator>>,
}

impl ClientOptions {
    /// Creates client options.
    pub fn new(
        settings: Arc<ConnectionSettings>,
        default_headers: HeaderMap,
        authenticator: Option<Arc<dyn Authenticator>>,
    ) -> Self {
        Self {
            settings,
            default_headers,
            authenticator,
        }
    }

    /// The connection settings clients are built from.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Resolves the headers sent with every request, including credentials.
    ///
    /// Authenticator errors are returned unchanged.
    pub async fn headers(&self) -> Result<HeaderMap> {
        let mut headers = self.default_headers.clone();

        if let Some(authenticator) = &self.authenticator {
            let authorization = authenticator.authorize().await?;
            let value = HeaderValue::try_from(authorization.to_string()).map_err(|e| {
                Error::InvalidArgument(format!("Invalid authorization header: {}", e))
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Builds a reqwest-backed transport with the resolved headers.
    ///
    /// # Errors
    ///
    /// Returns authenticator errors unchanged, and
    /// [`Error::InvalidArgument`] if the timeout is zero.
    pub async fn build_transport(&self) -> Result<ReqwestTransport> {
        let headers = self.headers().await?;
        ReqwestTransport::new(
            self.settings.base_address().clone(),
            self.settings.timeout(),
            headers,
        )
    }
}

/// Builds a fresh client for every call and releases it afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClientFactory;

#[async_trait]
impl ClientFactory for DefaultClientFactory {
    async fn build_client(&self, options: &ClientOptions) -> Result<BuiltClient> {
        let transport = options.build_transport().await?;
        Ok(BuiltClient::new(Arc::new(transport), true))
    }
}

/// Builds at most one client and reuses it until released.
#[derive(Default)]
pub struct CachedClientFactory {
    client: Mutex<Option<Arc<dyn Transport>>>,
}

impl CachedClientFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientFactory for CachedClientFactory {
    async fn build_client(&self, options: &ClientOptions) -> Result<BuiltClient> {
        let mut cached = self.client.lock().await;

        if let Some(client) = cached.as_ref() {
            return Ok(BuiltClient::new(client.clone(), false));
        }

        tracing::debug!("Building cached transport client");
        let client: Arc<dyn Transport> = Arc::new(options.build_transport().await?);
        *cached = Some(client.clone());

        Ok(BuiltClient::new(client, false))
    }

    fn release(&self) {
        match self.client.try_lock() {
            Ok(mut cached) => {
                cached.take();
            }
            Err(_) => tracing::debug!("Cached client is in use; leaving it to be dropped"),
        }
    }
}
