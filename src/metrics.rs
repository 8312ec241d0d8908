//! Metrics instrumentation for instance-dns-sync.
//!
//! All metrics are prefixed with `instance_dns.`

use metrics::{counter, histogram};
use std::time::Instant;

/// Record a processed notification and its outcome.
pub fn record_notification(event_type: &str, outcome: NotificationOutcome) {
    let outcome_str = match outcome {
        NotificationOutcome::Created => "created",
        NotificationOutcome::Deleted => "deleted",
        NotificationOutcome::SkippedTenant => "skipped_tenant",
        NotificationOutcome::NoMatchingZone => "no_matching_zone",
        NotificationOutcome::Malformed => "malformed",
        NotificationOutcome::ZoneServiceError => "zone_service_error",
        NotificationOutcome::Unrecognized => "unrecognized",
    };

    counter!("instance_dns.notification.count", "type" => event_type.to_string(), "outcome" => outcome_str)
        .increment(1);
}

/// Outcome of handling one notification.
#[derive(Debug, Clone, Copy)]
pub enum NotificationOutcome {
    /// Forward records reconciled.
    Created,
    /// Record sets removed.
    Deleted,
    /// Tenant operator-excluded, nothing done.
    SkippedTenant,
    /// No owned zone matched the instance name.
    NoMatchingZone,
    /// Payload missing required fields, dropped.
    Malformed,
    /// Zone service failed; event consumed, retry left to bus redelivery.
    ZoneServiceError,
    /// No handler registered for the event type.
    Unrecognized,
}

/// Record one zone service round-trip.
pub fn record_zone_api_call(op: ZoneApiOp, ok: bool, duration: std::time::Duration) {
    let op_str = match op {
        ZoneApiOp::ListZones => "list_zones",
        ZoneApiOp::FindRecordSets => "find_record_sets",
        ZoneApiOp::CreateRecordSet => "create_record_set",
        ZoneApiOp::UpdateRecordSet => "update_record_set",
        ZoneApiOp::DeleteRecordSet => "delete_record_set",
    };
    let result_str = if ok { "ok" } else { "error" };

    counter!("instance_dns.zone_api.call.count", "op" => op_str, "result" => result_str)
        .increment(1);
    histogram!("instance_dns.zone_api.call.duration.seconds", "op" => op_str)
        .record(duration.as_secs_f64());
}

/// Zone service operations.
#[derive(Debug, Clone, Copy)]
pub enum ZoneApiOp {
    /// List all zones for a tenant.
    ListZones,
    /// Look up record sets by name (and optionally type).
    FindRecordSets,
    /// Create a record set.
    CreateRecordSet,
    /// Replace the records of an existing set.
    UpdateRecordSet,
    /// Delete a record set.
    DeleteRecordSet,
}

/// Record how many forward records an event applied.
pub fn record_records_upserted(count: usize) {
    counter!("instance_dns.records.upserted.count").increment(count as u64);
}

/// Record how many record sets an event removed.
pub fn record_record_sets_deleted(count: usize) {
    counter!("instance_dns.record_sets.deleted.count").increment(count as u64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
