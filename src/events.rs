//! Advisory notifications.
//!
//! Events are published on a broadcast channel. Publishing never waits: when
//! nobody is subscribed the event is discarded, and slow subscribers observe
//! `RecvError::Lagged` instead of slowing down requests.

use crate::{ApiMethod, ApiStatus};
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Something that happened while a handler executed a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEvent {
    /// An attempt is about to be dispatched.
    RequestStarted {
        /// Identity of the request.
        request_id: Uuid,
        /// Method of the request.
        method: ApiMethod,
        /// Relative route of the request.
        route: String,
    },
    /// An attempt timed out and another one will be made.
    Retry {
        /// Identity of the request.
        request_id: Uuid,
        /// Number of attempts that have timed out so far.
        attempt: usize,
    },
    /// A response was received and classified.
    ResponseReceived {
        /// Identity of the request.
        request_id: Uuid,
        /// Classified status.
        status: ApiStatus,
        /// Number of attempts dispatched.
        attempts: usize,
    },
    /// The handler was disposed.
    Disposed,
}

/// Fire-and-forget publisher for [`ApiEvent`]s.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<ApiEvent>,
}

impl EventPublisher {
    /// Creates a publisher with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Publishes an event without waiting for delivery.
    pub fn publish(&self, event: ApiEvent) {
        // Err only means there are no subscribers.
        let _ = self.sender.send(event);
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ApiEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
