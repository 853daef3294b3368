//! Core types for the health event lifecycle library
//!
//! This module defines the health event record, its closed enums (type,
//! severity, status, source), the inputs for the create/update operations and
//! the error taxonomy of the lifecycle layer. The record is the source of
//! truth in the document store; nothing in this crate holds authoritative
//! state in memory.

use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Store-assigned event identifier
pub type EventId = String;

/// Free-form transition context attached to an event
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, EventError>;

/// Document field names of the persisted health event record
pub(crate) mod fields {
    pub const USER_ID: &str = "user_id";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "created_at";
    pub const ACKNOWLEDGED_AT: &str = "acknowledged_at";
    pub const ACKNOWLEDGED_BY: &str = "acknowledged_by";
    pub const RESOLVED_AT: &str = "resolved_at";
    pub const RESOLVED_BY: &str = "resolved_by";
    pub const ESCALATED_AT: &str = "escalated_at";
    pub const ESCALATED_BY: &str = "escalated_by";
    pub const METADATA: &str = "metadata";
    pub const REVISION: &str = "revision";

    /// Metadata keys written by this library
    pub const ESCALATION_REASON: &str = "escalation_reason";
    pub const EVALUATION_TIMESTAMP: &str = "evaluation_timestamp";
}

/// Errors that can occur in the lifecycle layer
///
/// Write failures carry a deliberately generic message: callers must not
/// pattern-match on store internals (those stay in the `source`).
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Failed to create health event")]
    CreateFailed(#[source] StoreError),

    #[error("Failed to update health event")]
    UpdateFailed(#[source] StoreError),

    #[error("Failed to query health events")]
    QueryFailed(#[source] StoreError),

    #[error("Health event not found: {0}")]
    NotFound(EventId),

    #[error("Stale revision for health event {id}: expected {expected}, found {found}")]
    StaleRevision {
        id: EventId,
        expected: u64,
        found: u64,
    },
}

/// Closed set of event types, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    VitalAlert,
    FallAlert,
    MissedMedicationAlert,
    SymptomSpikeAlert,
    GeneralAlert,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::VitalAlert => write!(f, "vital alert"),
            EventType::FallAlert => write!(f, "fall alert"),
            EventType::MissedMedicationAlert => write!(f, "missed medication alert"),
            EventType::SymptomSpikeAlert => write!(f, "symptom spike alert"),
            EventType::GeneralAlert => write!(f, "general alert"),
        }
    }
}

/// How serious the underlying condition is, totally ordered
///
/// Set at creation and never changed afterwards; escalation changes the
/// event's status, not its severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The event's place in its transition lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Open,
    Acked,
    Escalated,
    Resolved,
}

impl EventStatus {
    /// True for every status except `Resolved`
    pub fn is_active(&self) -> bool {
        !matches!(self, EventStatus::Resolved)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Open => write!(f, "open"),
            EventStatus::Acked => write!(f, "acked"),
            EventStatus::Escalated => write!(f, "escalated"),
            EventStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(EventStatus::Open),
            "acked" => Ok(EventStatus::Acked),
            "escalated" => Ok(EventStatus::Escalated),
            "resolved" => Ok(EventStatus::Resolved),
            other => Err(format!("Unknown event status: {}", other)),
        }
    }
}

/// Provenance of the event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Wearable device pipeline (the default ingestion path)
    #[default]
    Wearable,
    Manual,
    Clinic,
    System,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Wearable => write!(f, "wearable"),
            EventSource::Manual => write!(f, "manual"),
            EventSource::Clinic => write!(f, "clinic"),
            EventSource::System => write!(f, "system"),
        }
    }
}

impl FromStr for EventSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wearable" => Ok(EventSource::Wearable),
            "manual" => Ok(EventSource::Manual),
            "clinic" => Ok(EventSource::Clinic),
            "system" => Ok(EventSource::System),
            other => Err(format!("Unknown event source: {}", other)),
        }
    }
}

/// Named numeric vital readings attached to a vital alert at creation
///
/// The reading set matches what the PPG analysis pipeline produces; every
/// reading is optional because sources differ in what they measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalReadings {
    /// Heart rate in bpm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// Blood oxygen saturation in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2: Option<f64>,
    /// Systolic blood pressure in mmHg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<f64>,
    /// Diastolic blood pressure in mmHg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<f64>,
    /// Body temperature in °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Respiratory rate in breaths/min
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    /// Heart rate variability in ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
}

/// A persisted health event record
///
/// Owned by the document store; instances deserialized from query results are
/// point-in-time snapshots, not live handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    /// Store-assigned identifier (empty only before first persistence)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: EventId,
    /// The subject this event is about
    pub user_id: String,
    pub event_type: EventType,
    pub severity: Severity,
    /// Human-readable strings explaining why the event fired
    pub reasons: Vec<String>,
    pub status: EventStatus,
    pub source: EventSource,
    /// Stored as epoch microseconds so the store can order on it directly
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub created_at: Timestamp,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_microseconds_option"
    )]
    pub acknowledged_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_microseconds_option"
    )]
    pub resolved_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_microseconds_option"
    )]
    pub escalated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_values: Option<VitalReadings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Incremented on every update; basis for optimistic concurrency checks
    #[serde(default)]
    pub revision: u64,
}

impl HealthEvent {
    /// True while the event still needs attention (not resolved)
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Input for creating a new health event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHealthEvent {
    pub user_id: String,
    pub event_type: EventType,
    pub severity: Severity,
    pub reasons: Vec<String>,
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_values: Option<VitalReadings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Input for a status transition
///
/// The status is always written; the actor is only recorded the first time
/// the matching transition happens (the set-once rule for timestamp/actor
/// pairs). When `metadata` is present it replaces the stored metadata
/// wholesale, it is not merged.
#[derive(Debug, Clone)]
pub struct EventUpdate {
    pub status: EventStatus,
    pub acknowledged_by: Option<String>,
    pub resolved_by: Option<String>,
    pub escalated_by: Option<String>,
    pub metadata: Option<Metadata>,
    /// When set, the update is rejected with `StaleRevision` unless the
    /// stored record still carries this revision
    pub expected_revision: Option<u64>,
}

impl EventUpdate {
    /// Create an update that transitions to `status`
    pub fn new(status: EventStatus) -> Self {
        Self {
            status,
            acknowledged_by: None,
            resolved_by: None,
            escalated_by: None,
            metadata: None,
            expected_revision: None,
        }
    }

    /// Builder method: record the acknowledging actor
    pub fn acknowledged_by(mut self, actor_id: impl Into<String>) -> Self {
        self.acknowledged_by = Some(actor_id.into());
        self
    }

    /// Builder method: record the resolving actor
    pub fn resolved_by(mut self, actor_id: impl Into<String>) -> Self {
        self.resolved_by = Some(actor_id.into());
        self
    }

    /// Builder method: record the escalating actor
    pub fn escalated_by(mut self, actor_id: impl Into<String>) -> Self {
        self.escalated_by = Some(actor_id.into());
        self
    }

    /// Builder method: replace the stored metadata wholesale
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Builder method: require the stored record to carry this revision
    pub fn expected_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}
