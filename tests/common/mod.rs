//! Shared test infrastructure for reconciliation integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use instance_dns_sync::error::SyncError;
use instance_dns_sync::zone_api::{
    Record, RecordType, RecordWrite, RequestContext, WriteOutcome, Zone, ZoneApi,
};
use instance_dns_sync::{
    Dispatcher, HandlerConfig, InstanceFqdnHandler, NotificationEnvelope, SharedHandlerConfig,
};

// --- Constants ---

pub const TENANT: &str = "t1";

// --- RecordingZoneApi ---

#[derive(Debug, Clone)]
pub struct StoredRecordSet {
    pub zone_id: String,
    pub name: String,
    pub rtype: RecordType,
    pub records: Vec<String>,
}

#[derive(Debug, Default)]
struct ZoneApiState {
    zones: Vec<Zone>,
    record_sets: Vec<StoredRecordSet>,
    list_calls: usize,
    write_calls: usize,
    fail_writes: bool,
}

/// In-memory `ZoneApi` that records every call, so tests can assert both
/// the converged record state and which round-trips were (not) made.
#[derive(Debug, Default)]
pub struct RecordingZoneApi {
    state: Mutex<ZoneApiState>,
}

impl RecordingZoneApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_zone(&self, id: &str, name: &str, tenant_id: &str) {
        self.state.lock().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
            tenant_id: tenant_id.to_string(),
        });
    }

    /// Make every write call fail with a zone service error.
    pub fn fail_writes(&self) {
        self.state.lock().fail_writes = true;
    }

    /// Number of `list_zones` round-trips made.
    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    /// Number of write round-trips made (upserts and deletes, including
    /// failed attempts).
    pub fn write_calls(&self) -> usize {
        self.state.lock().write_calls
    }

    /// How many records with this exact `(zone, name, type, data)` key exist.
    pub fn record_count(&self, zone_id: &str, name: &str, rtype: RecordType, data: &str) -> usize {
        self.state
            .lock()
            .record_sets
            .iter()
            .filter(|rs| rs.zone_id == zone_id && rs.name == name && rs.rtype == rtype)
            .map(|rs| rs.records.iter().filter(|r| r.as_str() == data).count())
            .sum()
    }

    /// Record sets stored for `(zone, name)` regardless of type.
    pub fn record_sets_for(&self, zone_id: &str, name: &str) -> usize {
        self.state
            .lock()
            .record_sets
            .iter()
            .filter(|rs| rs.zone_id == zone_id && rs.name == name)
            .count()
    }
}

#[async_trait]
impl ZoneApi for RecordingZoneApi {
    async fn list_zones(
        &self,
        _ctx: &RequestContext,
        tenant_id: &str,
    ) -> Result<Vec<Zone>, SyncError> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        Ok(state
            .zones
            .iter()
            .filter(|z| z.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        name: &str,
        rtype: RecordType,
        data: &str,
    ) -> Result<RecordWrite, SyncError> {
        let mut state = self.state.lock();
        state.write_calls += 1;

        if state.fail_writes {
            return Err(SyncError::Api {
                status: 503,
                message: "zone service unavailable".to_string(),
            });
        }

        let record = Record {
            record_set_id: format!("{}/{}/{}", zone_id, name, rtype),
            data: data.to_string(),
        };

        if let Some(existing) = state
            .record_sets
            .iter_mut()
            .find(|rs| rs.zone_id == zone_id && rs.name == name && rs.rtype == rtype)
        {
            if existing.records.iter().any(|r| r == data) {
                return Ok(RecordWrite {
                    outcome: WriteOutcome::Unchanged,
                    record,
                });
            }
            existing.records.push(data.to_string());
            return Ok(RecordWrite {
                outcome: WriteOutcome::Updated,
                record,
            });
        }

        state.record_sets.push(StoredRecordSet {
            zone_id: zone_id.to_string(),
            name: name.to_string(),
            rtype,
            records: vec![data.to_string()],
        });
        Ok(RecordWrite {
            outcome: WriteOutcome::Created,
            record,
        })
    }

    async fn delete_record_sets(&self, zone_id: &str, name: &str) -> Result<usize, SyncError> {
        let mut state = self.state.lock();
        state.write_calls += 1;

        if state.fail_writes {
            return Err(SyncError::Api {
                status: 503,
                message: "zone service unavailable".to_string(),
            });
        }

        let before = state.record_sets.len();
        state
            .record_sets
            .retain(|rs| !(rs.zone_id == zone_id && rs.name == name));
        Ok(before - state.record_sets.len())
    }
}

// --- Envelope builders ---

pub fn create_envelope(
    tenant_id: &str,
    instance_name: &str,
    addresses: &[(u8, &str)],
) -> NotificationEnvelope {
    let fixed_ips: Vec<_> = addresses
        .iter()
        .map(|(version, address)| json!({"version": version, "address": address}))
        .collect();

    NotificationEnvelope::new(
        "compute.instance.create.end",
        json!({
            "tenant_id": tenant_id,
            "instance_id": "i-1",
            "display_name": instance_name,
            "fixed_ips": fixed_ips,
        }),
    )
}

pub fn delete_envelope(tenant_id: &str, instance_name: &str) -> NotificationEnvelope {
    NotificationEnvelope::new(
        "compute.instance.delete.start",
        json!({
            "tenant_id": tenant_id,
            "instance_id": "i-1",
            "display_name": instance_name,
            "fixed_ips": [],
        }),
    )
}

// --- Handler/dispatcher builders ---

pub fn build_handler(
    api: Arc<RecordingZoneApi>,
    config: HandlerConfig,
) -> (InstanceFqdnHandler, SharedHandlerConfig) {
    let shared = SharedHandlerConfig::new(config);
    let handler = InstanceFqdnHandler::new(shared.clone(), api);
    (handler, shared)
}

pub fn build_dispatcher(api: Arc<RecordingZoneApi>, config: HandlerConfig) -> Dispatcher {
    let (handler, _) = build_handler(api, config);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(handler));
    dispatcher
}
