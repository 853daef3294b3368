//! Health Event Lifecycle Library
//!
//! A small, store-agnostic library for the lifecycle of family health events
//! (abnormal-vitals alerts, fall alerts, missed medications) from creation
//! through acknowledgement, escalation and resolution.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on the event lifecycle:
//! - Creates events and applies status transitions (open → acked/escalated →
//!   resolved), stamping each transition timestamp at most once
//! - Reads events per subject or across a family of subjects, most recent
//!   first, with the read path degrading to empty results on failure
//! - Evaluates vital readings into alert-or-not decisions and ingests the
//!   abnormal ones as vital alerts
//!
//! The library does NOT:
//! - Render anything, send notifications, or manage subscriptions
//! - Own a storage engine; it talks to a document store through the
//!   [`DocumentStore`] trait and trusts it for per-document atomic writes
//! - Retry failed writes or delete events (retention is external tooling)
//!
//! # Example Usage
//!
//! ```no_run
//! use health_events::{evaluate_readings, EventSource, HealthEventService,
//!                     MemoryStore, VitalReadings};
//!
//! # async fn demo() -> health_events::Result<()> {
//! let service = HealthEventService::new(MemoryStore::new());
//!
//! // Ingest one evaluation cycle for a subject
//! let readings = VitalReadings {
//!     heart_rate: Some(124.0),
//!     ..Default::default()
//! };
//! let evaluation = evaluate_readings(&readings);
//! if let Some(id) = service
//!     .create_from_vital_evaluation("user-1", &evaluation, readings, EventSource::Wearable)
//!     .await?
//! {
//!     // A caregiver acknowledges it
//!     service.acknowledge(&id, "caregiver-1").await?;
//! }
//!
//! // The family screen lists what still needs attention
//! let active = service.active_events_for_subject("user-1").await;
//! for event in active {
//!     println!("{}: {}", event.severity, event.reasons.join(", "));
//! }
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod service;
pub mod store;
pub mod types;
pub mod vitals;

// Read-side queries (methods on HealthEventService)
mod query;

// Re-export main types for convenience
pub use service::{HealthEventService, ServiceConfig};
pub use store::{
    from_document, to_document, Document, DocumentStore, MemoryStore, StoreError, StoreResult,
    MAX_ANY_OF_VALUES,
};
pub use types::{
    EventError, EventId, EventSource, EventStatus, EventType, EventUpdate, HealthEvent, Metadata,
    NewHealthEvent, Result, Severity, Timestamp, VitalReadings,
};
pub use vitals::{evaluate_readings, EvaluationSeverity, VitalEvaluation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
