//! Notification handler capability and the instance FQDN handler.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SharedHandlerConfig;
use crate::error::SyncError;
use crate::event::{
    Event, NotificationEnvelope, EVENT_INSTANCE_CREATE_END, EVENT_INSTANCE_DELETE_START,
};
use crate::sync;
use crate::zone_api::{RequestContext, ZoneApi};

/// What handling an event amounted to. Every variant is a consumed event;
/// none of them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Forward records reconciled for the instance's addresses.
    RecordsCreated(usize),
    /// Record sets removed for the instance name.
    RecordSetsDeleted(usize),
    /// Tenant is operator-excluded; nothing done, no zone service calls.
    SkippedTenant,
    /// No owned zone is a suffix of the instance name; nothing to reconcile.
    NoMatchingZone,
    /// Event type is not one this handler processes.
    Ignored,
}

/// A handler for decoded bus notifications.
///
/// The surrounding dispatch process owns an explicit registry from event
/// type to handler; handlers declare what they consume and where the bus
/// adapter should bind.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Event types this handler processes.
    fn event_types(&self) -> &[&'static str];

    /// Exchange and topics the bus adapter should bind for this handler.
    fn exchange_and_topics(&self) -> (String, Vec<String>);

    /// Process one decoded event. Errors are terminal for the event: the
    /// dispatcher logs them and the event counts as consumed.
    async fn handle_event(
        &self,
        envelope: &NotificationEnvelope,
    ) -> Result<HandleOutcome, SyncError>;
}

/// Reconciles instance lifecycle events into forward DNS records, using
/// the instance's display name as its fully-qualified record name.
pub struct InstanceFqdnHandler {
    config: SharedHandlerConfig,
    api: Arc<dyn ZoneApi>,
}

impl InstanceFqdnHandler {
    /// Build a handler over a zone service client and a config handle.
    pub fn new(config: SharedHandlerConfig, api: Arc<dyn ZoneApi>) -> Self {
        Self { config, api }
    }
}

#[async_trait]
impl NotificationHandler for InstanceFqdnHandler {
    fn event_types(&self) -> &[&'static str] {
        &[EVENT_INSTANCE_CREATE_END, EVENT_INSTANCE_DELETE_START]
    }

    fn exchange_and_topics(&self) -> (String, Vec<String>) {
        let config = self.config.load();
        (
            config.control_exchange.clone(),
            config.notification_topics.clone(),
        )
    }

    async fn handle_event(
        &self,
        envelope: &NotificationEnvelope,
    ) -> Result<HandleOutcome, SyncError> {
        let event = Event::from_payload(&envelope.payload)?;
        let config = self.config.load();

        debug!(
            event_type = %envelope.event_type,
            tenant_id = %event.tenant_id,
            instance_name = %event.instance_name,
            "received instance notification"
        );

        if config.is_project_excluded(&event.tenant_id) {
            debug!(tenant_id = %event.tenant_id, "tenant excluded, skipping");
            return Ok(HandleOutcome::SkippedTenant);
        }

        // Records are written on behalf of the end user, so the zone
        // lookup needs cross-tenant visibility.
        let ctx = RequestContext::elevated(&event.tenant_id);

        let zone = sync::resolve_zone(
            self.api.as_ref(),
            &ctx,
            &event.tenant_id,
            &event.instance_name,
            &config.exclude_zones,
        )
        .await?;

        let Some(zone) = zone else {
            debug!(
                tenant_id = %event.tenant_id,
                instance_name = %event.instance_name,
                "no matching zone for instance"
            );
            return Ok(HandleOutcome::NoMatchingZone);
        };

        match envelope.event_type.as_str() {
            EVENT_INSTANCE_CREATE_END => {
                let applied = sync::create_records(
                    self.api.as_ref(),
                    &event.tenant_id,
                    &zone,
                    &event.instance_name,
                    &event.addresses,
                )
                .await;
                Ok(HandleOutcome::RecordsCreated(applied))
            }
            EVENT_INSTANCE_DELETE_START => {
                let removed = sync::delete_records(
                    self.api.as_ref(),
                    &event.tenant_id,
                    &zone,
                    &event.instance_name,
                )
                .await?;
                Ok(HandleOutcome::RecordSetsDeleted(removed))
            }
            other => {
                warn!(event_type = other, "handler invoked for unhandled event type");
                Ok(HandleOutcome::Ignored)
            }
        }
    }
}
