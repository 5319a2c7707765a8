//! Wire dialects turn a descriptor and its route into a transport request.

use crate::transport::TransportRequest;
use crate::{ApiMethod, RequestDescriptor, Result};

/// Strategy for shaping requests of one wire dialect.
pub trait WireDialect: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Builds the request that every attempt will replay.
    fn prepare(&self, descriptor: &RequestDescriptor, route: String) -> Result<TransportRequest>;
}

/// Plain REST dialect: the descriptor's method, route and body are sent as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestDialect;

impl WireDialect for RestDialect {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn prepare(&self, descriptor: &RequestDescriptor, route: String) -> Result<TransportRequest> {
        if descriptor.method == ApiMethod::None {
            tracing::warn!(
                request_id = %descriptor.identity,
                route = %route,
                "No method specified, dispatching as GET"
            );
        }

        if descriptor.has_content() && !descriptor.method.allows_content() {
            tracing::warn!(
                request_id = %descriptor.identity,
                method = %descriptor.method,
                route = %route,
                "Content attached to a request method that does not carry a body"
            );
        }

        Ok(TransportRequest {
            identity: descriptor.identity,
            method: descriptor.method.as_http(),
            route,
            content: descriptor.content.clone(),
        })
    }
}
