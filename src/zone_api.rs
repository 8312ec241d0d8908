//! Zone service client: types, the `ZoneApi` seam, and the HTTP implementation.
//!
//! The zone service owns all durable state (zones, record sets, records);
//! this crate only issues intent-level calls against it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::ZoneApiConfig;
use crate::error::SyncError;
use crate::metrics::{self, Timer, ZoneApiOp};

/// Capability token for a zone service call.
///
/// Record writes happen on behalf of the end user, not the calling service,
/// so lookups need cross-tenant zone visibility. That elevation is carried
/// explicitly here rather than as ambient process state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Tenant the call is issued on behalf of.
    pub tenant_id: String,
    /// Grants cross-tenant zone visibility.
    pub all_projects: bool,
}

impl RequestContext {
    /// Elevated, tenant-scoped context for reconciliation calls.
    pub fn elevated(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            all_projects: true,
        }
    }
}

/// DNS record type derived from an address's IP version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 forward record.
    A,
    /// IPv6 forward record.
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Aaaa => write!(f, "AAAA"),
        }
    }
}

/// A DNS zone owned by a tenant. Zone names are dot-terminated.
#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    /// Opaque zone identifier.
    pub id: String,
    /// Dot-terminated FQDN of the zone apex.
    pub name: String,
    /// Owning tenant.
    #[serde(rename = "project_id")]
    pub tenant_id: String,
}

/// A named, typed group of records within a zone.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSet {
    /// Opaque record set identifier.
    pub id: String,
    /// Zone the set belongs to.
    pub zone_id: String,
    /// Record name.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub rtype: RecordType,
    /// Record data values in the set.
    #[serde(default)]
    pub records: Vec<String>,
}

/// A single record within a record set.
#[derive(Debug, Clone)]
pub struct Record {
    /// Record set the record belongs to.
    pub record_set_id: String,
    /// Record data (an IP address literal).
    pub data: String,
}

/// What an upsert did to the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Record set was created with the record.
    Created,
    /// Record set existed; the record was appended.
    Updated,
    /// Record was already present; nothing written.
    Unchanged,
}

/// Result of an idempotent record upsert.
#[derive(Debug, Clone)]
pub struct RecordWrite {
    /// What the upsert did.
    pub outcome: WriteOutcome,
    /// The record now present in the zone.
    pub record: Record,
}

/// Intent-level operations against the zone service.
#[async_trait]
pub trait ZoneApi: Send + Sync {
    /// All zones owned by the tenant.
    async fn list_zones(
        &self,
        ctx: &RequestContext,
        tenant_id: &str,
    ) -> Result<Vec<Zone>, SyncError>;

    /// Create-or-update a record keyed by `(zone_id, name, rtype, data)`.
    /// Re-delivery of the same upsert converges to a single record.
    async fn upsert_record(
        &self,
        zone_id: &str,
        name: &str,
        rtype: RecordType,
        data: &str,
    ) -> Result<RecordWrite, SyncError>;

    /// Remove all record sets matching `(zone_id, name)` regardless of type.
    /// Deleting a never-created record set is a no-op; returns the number
    /// of sets actually removed.
    async fn delete_record_sets(&self, zone_id: &str, name: &str) -> Result<usize, SyncError>;
}

// --- HTTP implementation ---

#[derive(Debug, Deserialize)]
struct ZoneListResponse {
    zones: Vec<Zone>,
}

#[derive(Debug, Deserialize)]
struct RecordSetListResponse {
    recordsets: Vec<RecordSet>,
}

#[derive(Debug, Serialize)]
struct CreateRecordSetRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    rtype: RecordType,
    records: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRecordSetRequest {
    records: Vec<String>,
}

/// Zone service client over its REST API.
pub struct HttpZoneApi {
    http: Client,
    endpoint: String,
}

impl HttpZoneApi {
    /// Build a client from configuration.
    pub fn new(config: &ZoneApiConfig) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn apply_context(
        &self,
        request: reqwest::RequestBuilder,
        ctx: &RequestContext,
    ) -> reqwest::RequestBuilder {
        if ctx.all_projects {
            request
                .header("X-Auth-All-Projects", "true")
                .header("X-Auth-Sudo-Project-ID", &ctx.tenant_id)
        } else {
            request
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SyncError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Record sets in a zone matching the name, optionally narrowed by type.
    async fn find_record_sets(
        &self,
        zone_id: &str,
        name: &str,
        rtype: Option<RecordType>,
    ) -> Result<Vec<RecordSet>, SyncError> {
        let mut url = format!(
            "{}/v2/zones/{}/recordsets?name={}",
            self.endpoint, zone_id, name
        );
        if let Some(rtype) = rtype {
            url.push_str(&format!("&type={}", rtype));
        }

        let timer = Timer::start();
        let result: Result<Vec<RecordSet>, SyncError> = async {
            let response = self.http.get(&url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                // Zone service reports an empty match as 404 in some
                // deployments; treat it the same as an empty list.
                return Ok(Vec::new());
            }
            let response = Self::check(response).await?;
            let list: RecordSetListResponse = response.json().await?;
            Ok(list.recordsets)
        }
        .await;

        metrics::record_zone_api_call(ZoneApiOp::FindRecordSets, result.is_ok(), timer.elapsed());
        result
    }

    async fn create_record_set(
        &self,
        zone_id: &str,
        name: &str,
        rtype: RecordType,
        data: &str,
    ) -> Result<RecordSet, SyncError> {
        let url = format!("{}/v2/zones/{}/recordsets", self.endpoint, zone_id);
        let body = CreateRecordSetRequest {
            name,
            rtype,
            records: vec![data],
        };

        let timer = Timer::start();
        let result: Result<RecordSet, SyncError> = async {
            let response = self.http.post(&url).json(&body).send().await?;
            let response = Self::check(response).await?;
            let record_set: RecordSet = response.json().await?;
            Ok(record_set)
        }
        .await;

        metrics::record_zone_api_call(ZoneApiOp::CreateRecordSet, result.is_ok(), timer.elapsed());
        result
    }

    async fn update_record_set(
        &self,
        zone_id: &str,
        record_set_id: &str,
        records: Vec<String>,
    ) -> Result<(), SyncError> {
        let url = format!(
            "{}/v2/zones/{}/recordsets/{}",
            self.endpoint, zone_id, record_set_id
        );
        let body = UpdateRecordSetRequest { records };

        let timer = Timer::start();
        let result: Result<(), SyncError> = async {
            let response = self.http.put(&url).json(&body).send().await?;
            Self::check(response).await?;
            Ok(())
        }
        .await;

        metrics::record_zone_api_call(ZoneApiOp::UpdateRecordSet, result.is_ok(), timer.elapsed());
        result
    }

    async fn delete_record_set(&self, zone_id: &str, record_set_id: &str) -> Result<bool, SyncError> {
        let url = format!(
            "{}/v2/zones/{}/recordsets/{}",
            self.endpoint, zone_id, record_set_id
        );

        let timer = Timer::start();
        let result: Result<bool, SyncError> = async {
            let response = self.http.delete(&url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                // Already gone; the delete path is idempotent.
                return Ok(false);
            }
            Self::check(response).await?;
            Ok(true)
        }
        .await;

        metrics::record_zone_api_call(
            ZoneApiOp::DeleteRecordSet,
            result.is_ok(),
            timer.elapsed(),
        );
        result
    }
}

#[async_trait]
impl ZoneApi for HttpZoneApi {
    async fn list_zones(
        &self,
        ctx: &RequestContext,
        tenant_id: &str,
    ) -> Result<Vec<Zone>, SyncError> {
        let url = format!("{}/v2/zones?tenant_id={}", self.endpoint, tenant_id);

        let timer = Timer::start();
        let result: Result<Vec<Zone>, SyncError> = async {
            let request = self.apply_context(self.http.get(&url), ctx);
            let response = Self::check(request.send().await?).await?;
            let list: ZoneListResponse = response.json().await?;
            Ok(list.zones)
        }
        .await;

        metrics::record_zone_api_call(ZoneApiOp::ListZones, result.is_ok(), timer.elapsed());
        result
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        name: &str,
        rtype: RecordType,
        data: &str,
    ) -> Result<RecordWrite, SyncError> {
        let existing = self
            .find_record_sets(zone_id, name, Some(rtype))
            .await?
            .into_iter()
            .next();

        match existing {
            Some(record_set) if record_set.records.iter().any(|r| r == data) => {
                debug!(zone_id, name, %rtype, data, "record already present");
                Ok(RecordWrite {
                    outcome: WriteOutcome::Unchanged,
                    record: Record {
                        record_set_id: record_set.id,
                        data: data.to_string(),
                    },
                })
            }
            Some(record_set) => {
                let mut records = record_set.records.clone();
                records.push(data.to_string());
                self.update_record_set(zone_id, &record_set.id, records)
                    .await?;
                Ok(RecordWrite {
                    outcome: WriteOutcome::Updated,
                    record: Record {
                        record_set_id: record_set.id,
                        data: data.to_string(),
                    },
                })
            }
            None => {
                let record_set = self.create_record_set(zone_id, name, rtype, data).await?;
                Ok(RecordWrite {
                    outcome: WriteOutcome::Created,
                    record: Record {
                        record_set_id: record_set.id,
                        data: data.to_string(),
                    },
                })
            }
        }
    }

    async fn delete_record_sets(&self, zone_id: &str, name: &str) -> Result<usize, SyncError> {
        let matching = self.find_record_sets(zone_id, name, None).await?;

        let mut removed = 0;
        for record_set in matching {
            if self.delete_record_set(zone_id, &record_set.id).await? {
                removed += 1;
            }
        }

        Ok(removed)
    }
}
