//! Event dispatch: an explicit registry from event type to handler.
//!
//! The registry is built once from configuration and handler declarations;
//! there is no reflection or plugin discovery. `dispatch()` is infallible
//! and re-entrant, so redelivered events and unknown topics on a shared
//! bus can never take down the consumer loop.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::event::NotificationEnvelope;
use crate::handler::{HandleOutcome, NotificationHandler};
use crate::metrics::{self, NotificationOutcome};

/// Routes decoded notifications to the handler registered for their type.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn NotificationHandler>>,
}

impl Dispatcher {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every event type it declares.
    pub fn register(&mut self, handler: Arc<dyn NotificationHandler>) {
        for event_type in handler.event_types() {
            self.handlers
                .insert((*event_type).to_string(), handler.clone());
        }
    }

    /// Whether any handler is registered for the event type.
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Process one notification. Every failure becomes a logged outcome;
    /// the event is consumed either way.
    pub async fn dispatch(&self, envelope: &NotificationEnvelope) {
        let Some(handler) = self.handlers.get(&envelope.event_type) else {
            // Unknown topics are expected traffic on a shared bus.
            warn!(event_type = %envelope.event_type, "no handler for event type, dropping");
            metrics::record_notification(&envelope.event_type, NotificationOutcome::Unrecognized);
            return;
        };

        match handler.handle_event(envelope).await {
            Ok(outcome) => {
                let metric_outcome = match outcome {
                    HandleOutcome::RecordsCreated(applied) => {
                        info!(event_type = %envelope.event_type, applied, "event handled");
                        NotificationOutcome::Created
                    }
                    HandleOutcome::RecordSetsDeleted(removed) => {
                        info!(event_type = %envelope.event_type, removed, "event handled");
                        NotificationOutcome::Deleted
                    }
                    HandleOutcome::SkippedTenant => NotificationOutcome::SkippedTenant,
                    HandleOutcome::NoMatchingZone => NotificationOutcome::NoMatchingZone,
                    HandleOutcome::Ignored => NotificationOutcome::Unrecognized,
                };
                debug!(event_type = %envelope.event_type, outcome = ?outcome, "dispatch complete");
                metrics::record_notification(&envelope.event_type, metric_outcome);
            }
            Err(e) if e.is_zone_service() => {
                // Event counts as consumed; bus redelivery owns retry.
                error!(
                    event_type = %envelope.event_type,
                    error = %e,
                    "zone service failure while handling event"
                );
                metrics::record_notification(
                    &envelope.event_type,
                    NotificationOutcome::ZoneServiceError,
                );
            }
            Err(e) => {
                error!(
                    event_type = %envelope.event_type,
                    error = %e,
                    "dropping malformed event"
                );
                metrics::record_notification(&envelope.event_type, NotificationOutcome::Malformed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NotificationHandler for CountingHandler {
        fn event_types(&self) -> &[&'static str] {
            &["compute.instance.create.end"]
        }

        fn exchange_and_topics(&self) -> (String, Vec<String>) {
            ("nova".to_string(), vec!["notifications".to_string()])
        }

        async fn handle_event(
            &self,
            _envelope: &NotificationEnvelope,
        ) -> Result<HandleOutcome, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HandleOutcome::RecordsCreated(1))
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_registered_handler() {
        let handler = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(handler.clone());

        assert!(dispatcher.handles("compute.instance.create.end"));

        let envelope = NotificationEnvelope::new("compute.instance.create.end", json!({}));
        dispatcher.dispatch(&envelope).await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_drops_unrecognized_event_type() {
        let handler = Arc::new(CountingHandler {
            calls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(handler.clone());

        let envelope = NotificationEnvelope::new("volume.create.end", json!({}));
        dispatcher.dispatch(&envelope).await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    struct FailingHandler;

    #[async_trait]
    impl NotificationHandler for FailingHandler {
        fn event_types(&self) -> &[&'static str] {
            &["compute.instance.delete.start"]
        }

        fn exchange_and_topics(&self) -> (String, Vec<String>) {
            ("nova".to_string(), vec!["notifications".to_string()])
        }

        async fn handle_event(
            &self,
            _envelope: &NotificationEnvelope,
        ) -> Result<HandleOutcome, SyncError> {
            Err(SyncError::MalformedPayload("missing tenant_id".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_handler_errors() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(FailingHandler));

        // Must not panic or propagate.
        let envelope = NotificationEnvelope::new("compute.instance.delete.start", json!({}));
        dispatcher.dispatch(&envelope).await;
    }
}
