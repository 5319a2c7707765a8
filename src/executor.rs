//! Retrying request execution.
//!
//! One logical call builds its route and transport request once, obtains one
//! client from the factory and replays the same request until it gets a
//! response or the timeout budget runs out:
//!
//! - a response (of any status) ends the loop and is classified;
//! - [`Error::Timeout`] counts against the budget; the call gives up with
//!   [`Error::RetriesExhausted`] when `retry_attempts` is `0` or when the
//!   number of timed-out attempts reaches `retry_attempts`;
//! - any other error, including cancellation, ends the call immediately.

use crate::classify::{classify, Decoder};
use crate::dialect::WireDialect;
use crate::events::{ApiEvent, EventPublisher};
use crate::factory::{ClientFactory, ClientOptions};
use crate::route;
use crate::serializer::Serializer;
use crate::transport::{RawResponse, Transport, TransportRequest};
use crate::{ApiMethod, ApiResponse, ConnectionSettings, Error, RequestDescriptor, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub(crate) struct RequestExecutor {
    settings: Arc<ConnectionSettings>,
    client_options: ClientOptions,
    client_factory: Arc<dyn ClientFactory>,
    serializer: Arc<dyn Serializer>,
    dialect: Arc<dyn WireDialect>,
    events: EventPublisher,
}

impl RequestExecutor {
    pub(crate) fn new(
        settings: Arc<ConnectionSettings>,
        client_options: ClientOptions,
        client_factory: Arc<dyn ClientFactory>,
        serializer: Arc<dyn Serializer>,
        dialect: Arc<dyn WireDialect>,
        events: EventPublisher,
    ) -> Self {
        Self {
            settings,
            client_options,
            client_factory,
            serializer,
            dialect,
            events,
        }
    }

    /// Executes one logical call and classifies its response.
    pub(crate) async fn perform<T>(
        &self,
        descriptor: &RequestDescriptor,
        decoder: Decoder<T>,
        token: &CancellationToken,
    ) -> Result<ApiResponse<T>> {
        let route = route::build_route(&self.settings, descriptor)?;
        let request = self.dialect.prepare(descriptor, route)?;

        let built = self.client_factory.build_client(&self.client_options).await?;
        let start_time = Instant::now();
        let outcome = self
            .dispatch(built.client.as_ref(), &request, descriptor.method, token)
            .await;
        built.finish();

        let (raw, attempts) = outcome?;
        let latency = start_time.elapsed();
        let headers = raw.as_ref().map(|r| r.headers.clone()).unwrap_or_default();

        let response = classify(raw.as_ref(), self.serializer.as_ref(), decoder)
            .with_transaction(descriptor.identity, headers, attempts, latency);

        tracing::info!(
            request_id = %descriptor.identity,
            dialect = self.dialect.name(),
            status = %response.status,
            response_type = descriptor.response_type.unwrap_or("()"),
            latency_ms = latency.as_millis(),
            attempts = attempts,
            "Received API response"
        );

        self.events.publish(ApiEvent::ResponseReceived {
            request_id: descriptor.identity,
            status: response.status,
            attempts,
        });

        Ok(response)
    }

    /// Sends attempts until one produces a response. Returns the response and
    /// the number of attempts dispatched.
    async fn dispatch(
        &self,
        client: &dyn Transport,
        request: &TransportRequest,
        method: ApiMethod,
        token: &CancellationToken,
    ) -> Result<(Option<RawResponse>, usize)> {
        let retry_attempts = self.settings.retry_attempts();
        let mut timed_out = 0;

        loop {
            tracing::debug!(
                request_id = %request.identity,
                method = %request.method,
                route = %request.route,
                attempt = timed_out + 1,
                "Dispatching request"
            );
            self.events.publish(ApiEvent::RequestStarted {
                request_id: request.identity,
                method,
                route: request.route.clone(),
            });

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                result = client.send(request) => result,
            };

            match outcome {
                Ok(raw) => return Ok((raw, timed_out + 1)),
                Err(Error::Timeout) => {
                    timed_out += 1;

                    if retry_attempts == 0 || timed_out == retry_attempts {
                        tracing::warn!(
                            request_id = %request.identity,
                            attempts = timed_out,
                            "Request timed out, no attempts left"
                        );
                        return Err(Error::RetriesExhausted {
                            attempts: timed_out,
                        });
                    }

                    tracing::info!(
                        request_id = %request.identity,
                        attempt = timed_out,
                        retry_attempts = retry_attempts,
                        "Request timed out, retrying"
                    );
                    self.events.publish(ApiEvent::Retry {
                        request_id: request.identity,
                        attempt: timed_out,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
