//! Decoded notification events and payload parsing.
//!
//! The message bus adapter owns the wire format; by the time an event
//! reaches this crate it is an envelope of event type plus JSON payload.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SyncError;

/// Instance creation completed.
pub const EVENT_INSTANCE_CREATE_END: &str = "compute.instance.create.end";
/// Instance deletion started.
pub const EVENT_INSTANCE_DELETE_START: &str = "compute.instance.delete.start";

/// A decoded notification as delivered by the bus adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    /// Event type string (e.g., "compute.instance.create.end").
    pub event_type: String,
    /// Raw event payload; shape depends on the event type.
    pub payload: Value,
}

impl NotificationEnvelope {
    /// Build an envelope from parts.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// IP version of an instance address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum IpVersion {
    /// IPv4, yields an A record.
    V4,
    /// IPv6, yields an AAAA record.
    V6,
}

impl TryFrom<u8> for IpVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(format!("unsupported IP version: {}", other)),
        }
    }
}

/// One network address of an instance. Each address yields one record.
#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    /// IP version (4 or 6 on the wire).
    pub version: IpVersion,
    /// IP address literal.
    pub address: String,
    /// Network label the address belongs to (e.g., "private"). Logged
    /// for context, not part of record identity.
    #[serde(default)]
    pub label: Option<String>,
}

/// An instance lifecycle event, parsed from the notification payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Owning tenant/project.
    pub tenant_id: String,
    /// Instance identifier.
    pub instance_id: String,
    /// Fully-qualified instance name; record name and zone match key.
    #[serde(rename = "display_name")]
    pub instance_name: String,
    /// Addresses to reconcile, one record each.
    #[serde(rename = "fixed_ips", default)]
    pub addresses: Vec<Address>,
}

impl Event {
    /// Parse an instance event out of a notification payload.
    /// Missing or mistyped required fields are a [`SyncError::MalformedPayload`].
    pub fn from_payload(payload: &Value) -> Result<Self, SyncError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| SyncError::MalformedPayload(e.to_string()))
    }
}
