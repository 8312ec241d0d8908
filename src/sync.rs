//! Zone resolution and record synchronization.
//!
//! Given a tenant and an instance name, pick the owning zone by
//! longest-suffix match and converge the zone's record set with the
//! instance's addresses. All durable state lives in the zone service;
//! every call here is a stateless round-trip.
//!
//! Overlapping create/delete for the same instance are not serialized
//! here: if out-of-order delivery races them, the write that lands last
//! at the zone service wins. Retry of failed events belongs to the bus
//! redelivery mechanism, never to this module.

use std::collections::HashSet;
use tracing::{debug, error, info};

use crate::error::SyncError;
use crate::event::{Address, IpVersion};
use crate::metrics;
use crate::zone_api::{RecordType, RequestContext, Zone, ZoneApi};

/// Record type for an instance address.
pub fn record_type_for(address: &Address) -> RecordType {
    match address.version {
        IpVersion::V4 => RecordType::A,
        IpVersion::V6 => RecordType::Aaaa,
    }
}

/// Pick the best zone for an instance name.
///
/// A zone matches when its name (trailing dot stripped) is a suffix of the
/// instance name; a zone name equal to the instance name is a valid
/// degenerate match. Excluded zones never match. With several matches the
/// longest name wins (specificity over zone creation order), lexical order
/// descending as the final tie-break.
pub fn select_zone(
    zones: Vec<Zone>,
    instance_name: &str,
    exclude_zones: &HashSet<String>,
) -> Option<Zone> {
    let mut candidates: Vec<Zone> = zones
        .into_iter()
        .filter(|zone| !exclude_zones.contains(zone.name.trim_end_matches('.')))
        .filter(|zone| instance_name.ends_with(zone.name.trim_end_matches('.')))
        .collect();

    candidates.sort_by(|a, b| {
        let a_name = a.name.trim_end_matches('.');
        let b_name = b.name.trim_end_matches('.');
        b_name
            .len()
            .cmp(&a_name.len())
            .then_with(|| b_name.cmp(a_name))
    });

    candidates.into_iter().next()
}

/// Resolve the zone owning an instance name, or `None` when no owned zone
/// matches. "No eligible zone" is an expected outcome, not an error.
pub async fn resolve_zone(
    api: &dyn ZoneApi,
    ctx: &RequestContext,
    tenant_id: &str,
    instance_name: &str,
    exclude_zones: &HashSet<String>,
) -> Result<Option<Zone>, SyncError> {
    let zones = api.list_zones(ctx, tenant_id).await?;
    debug!(tenant_id, count = zones.len(), "fetched tenant zones");

    Ok(select_zone(zones, instance_name, exclude_zones))
}

/// Create one forward record per address in the zone.
///
/// Individual zone-service failures are logged with full context and do not
/// stop the remaining addresses; returns the number of records applied.
pub async fn create_records(
    api: &dyn ZoneApi,
    tenant_id: &str,
    zone: &Zone,
    instance_name: &str,
    addresses: &[Address],
) -> usize {
    let mut applied = 0;

    for address in addresses {
        let rtype = record_type_for(address);

        match api
            .upsert_record(&zone.id, instance_name, rtype, &address.address)
            .await
        {
            Ok(write) => {
                info!(
                    tenant_id,
                    instance_name,
                    zone = %zone.name,
                    %rtype,
                    data = %address.address,
                    label = address.label.as_deref().unwrap_or(""),
                    outcome = ?write.outcome,
                    "record reconciled"
                );
                applied += 1;
            }
            Err(e) => {
                // Logged for manual remediation; bus redelivery owns retry.
                error!(
                    tenant_id,
                    instance_name,
                    zone = %zone.name,
                    %rtype,
                    data = %address.address,
                    error = %e,
                    "failed to upsert record"
                );
            }
        }
    }

    metrics::record_records_upserted(applied);
    applied
}

/// Remove every record set for the instance name in the zone, regardless of
/// type. Removing nothing is a success.
pub async fn delete_records(
    api: &dyn ZoneApi,
    tenant_id: &str,
    zone: &Zone,
    instance_name: &str,
) -> Result<usize, SyncError> {
    let removed = api.delete_record_sets(&zone.id, instance_name).await?;

    info!(
        tenant_id,
        instance_name,
        zone = %zone.name,
        removed,
        "record sets deleted"
    );
    metrics::record_record_sets_deleted(removed);

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            id: id.to_string(),
            name: name.to_string(),
            tenant_id: "t1".to_string(),
        }
    }

    fn no_exclusions() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_select_zone_suffix_match() {
        let zones = vec![zone("z1", "prod.example.com.")];
        let selected = select_zone(zones, "web1.prod.example.com", &no_exclusions());
        assert_eq!(selected.unwrap().id, "z1");
    }

    #[test]
    fn test_select_zone_longest_suffix_wins() {
        let zones = vec![zone("z1", "example.com."), zone("z2", "a.example.com.")];
        let selected = select_zone(zones, "host.a.example.com", &no_exclusions());
        assert_eq!(selected.unwrap().id, "z2");
    }

    #[test]
    fn test_select_zone_order_of_input_is_irrelevant() {
        let zones = vec![zone("z2", "a.example.com."), zone("z1", "example.com.")];
        let selected = select_zone(zones, "host.a.example.com", &no_exclusions());
        assert_eq!(selected.unwrap().id, "z2");
    }

    #[test]
    fn test_select_zone_no_match_returns_none() {
        let zones = vec![zone("z1", "example.com.")];
        assert!(select_zone(zones, "orphan.other.com", &no_exclusions()).is_none());
    }

    #[test]
    fn test_select_zone_excluded_zone_never_matches() {
        let zones = vec![zone("z1", "b.example.com.")];
        let exclude: HashSet<String> = ["b.example.com".to_string()].into();
        assert!(select_zone(zones, "host.b.example.com", &exclude).is_none());
    }

    #[test]
    fn test_select_zone_degenerate_exact_match() {
        let zones = vec![zone("z1", "web1.prod.example.com.")];
        let selected = select_zone(zones, "web1.prod.example.com", &no_exclusions());
        assert_eq!(selected.unwrap().id, "z1");
    }

    #[test]
    fn test_record_type_for_versions() {
        let v4 = Address {
            version: IpVersion::V4,
            address: "10.0.0.5".to_string(),
            label: None,
        };
        let v6 = Address {
            version: IpVersion::V6,
            address: "fd00::5".to_string(),
            label: None,
        };

        assert_eq!(record_type_for(&v4), RecordType::A);
        assert_eq!(record_type_for(&v6), RecordType::Aaaa);
    }
}
