//! instance-dns-sync - A notification-driven DNS record synchronizer.
//!
//! This crate consumes compute-instance lifecycle events, resolves which DNS
//! zone owns the instance's fully-qualified name, and reconciles the zone's
//! record set with the instance's addresses: forward records (A/AAAA) are
//! created when an instance finishes building and removed when its deletion
//! starts.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       instance-dns-sync                        │
//! │                                                                │
//! │  ┌──────────────┐    ┌────────────────────┐                    │
//! │  │  Dispatcher  │───▶│ InstanceFqdnHandler │                   │
//! │  │ (type→handler│    │ filter → resolve →  │                   │
//! │  │   registry)  │    │ create/delete       │                   │
//! │  └──────▲───────┘    └─────────┬──────────┘                    │
//! │         │ decoded              │ ZoneApi                       │
//! │         │ envelopes            ▼                               │
//! │   bus adapter            ┌──────────────┐      zone service    │
//! │   (external)             │  HttpZoneApi │───▶  (external)      │
//! │                          └──────────────┘                      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation
//!
//! ```text
//! compute.instance.create.end { web1.prod.example.com, [10.0.0.5] }
//!   → skip if tenant is excluded
//!   → list tenant zones, drop excluded names
//!   → longest-suffix match: prod.example.com.
//!   → upsert A record (web1.prod.example.com, 10.0.0.5)
//! ```
//!
//! The same upsert delivered twice converges to the same record set, and
//! deleting records that are already gone is a no-op: at-least-once bus
//! delivery is the expected mode of operation.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use instance_dns_sync::{
//!     Dispatcher, HttpZoneApi, InstanceFqdnHandler, SharedHandlerConfig,
//! };
//!
//! let api = Arc::new(HttpZoneApi::new(&config.zone_api)?);
//! let handler = InstanceFqdnHandler::new(
//!     SharedHandlerConfig::new(config.handler),
//!     api,
//! );
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register(Arc::new(handler));
//!
//! // per decoded bus notification:
//! dispatcher.dispatch(&envelope).await;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod metrics;
pub mod sync;
pub mod telemetry;
pub mod zone_api;

// Re-export main types
pub use config::{Config, HandlerConfig, SharedHandlerConfig, TelemetryConfig, ZoneApiConfig};
pub use dispatch::Dispatcher;
pub use error::SyncError;
pub use event::{Address, Event, IpVersion, NotificationEnvelope};
pub use handler::{HandleOutcome, InstanceFqdnHandler, NotificationHandler};
pub use zone_api::{HttpZoneApi, RecordType, RequestContext, Zone, ZoneApi};
