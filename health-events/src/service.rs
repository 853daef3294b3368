//! Lifecycle write path
//!
//! [`HealthEventService`] owns event creation and status transitions. Every
//! write goes through the configured [`DocumentStore`]; failures bubble up as
//! [`EventError`] values and no retry is attempted here, the caller owns
//! retry policy.

use crate::store::{from_document, to_document, Document, DocumentStore};
use crate::types::{
    fields, EventError, EventId, EventSource, EventStatus, EventType, EventUpdate, HealthEvent,
    Metadata, NewHealthEvent, Result, Severity, VitalReadings,
};
use crate::vitals::{EvaluationSeverity, VitalEvaluation};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Configuration for the lifecycle service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Store collection holding health event documents
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Default limit for single-subject queries
    #[serde(default = "default_subject_limit")]
    pub subject_limit: usize,

    /// Fetch size backing the active-events filter
    #[serde(default = "default_active_limit")]
    pub active_limit: usize,

    /// Fetch size backing the by-status filter
    #[serde(default = "default_status_limit")]
    pub status_limit: usize,

    /// Default limit for multi-subject (family) queries
    #[serde(default = "default_family_limit")]
    pub family_limit: usize,
}

fn default_collection() -> String {
    "health_events".to_string()
}

fn default_subject_limit() -> usize {
    50
}

fn default_active_limit() -> usize {
    100
}

fn default_status_limit() -> usize {
    200
}

fn default_family_limit() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            subject_limit: default_subject_limit(),
            active_limit: default_active_limit(),
            status_limit: default_status_limit(),
            family_limit: default_family_limit(),
        }
    }
}

impl ServiceConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the store collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Builder method: set the default single-subject query limit
    pub fn with_subject_limit(mut self, limit: usize) -> Self {
        self.subject_limit = limit;
        self
    }

    /// Builder method: set the default multi-subject query limit
    pub fn with_family_limit(mut self, limit: usize) -> Self {
        self.family_limit = limit;
        self
    }
}

/// The lifecycle service - entry point for all event operations
pub struct HealthEventService<S> {
    store: S,
    config: ServiceConfig,
}

impl<S: DocumentStore> HealthEventService<S> {
    /// Create a service over `store` with default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    /// Create a service over `store` with an explicit configuration
    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a new health event
    ///
    /// The record is persisted with `status = open`, `created_at = now` and
    /// no transition timestamps, and the store-assigned identifier is
    /// returned. On a write failure the caller receives
    /// [`EventError::CreateFailed`] and no identifier.
    ///
    /// # Example
    /// ```no_run
    /// # use health_events::{HealthEventService, MemoryStore, NewHealthEvent};
    /// # use health_events::{EventSource, EventType, Severity};
    /// # async fn demo() -> health_events::Result<()> {
    /// let service = HealthEventService::new(MemoryStore::new());
    /// let id = service
    ///     .create(NewHealthEvent {
    ///         user_id: "user-1".to_string(),
    ///         event_type: EventType::FallAlert,
    ///         severity: Severity::Critical,
    ///         reasons: vec!["Impact of 2.4 g followed by stillness".to_string()],
    ///         source: EventSource::Wearable,
    ///         vital_values: None,
    ///         metadata: None,
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(&self, input: NewHealthEvent) -> Result<EventId> {
        let event = HealthEvent {
            id: String::new(),
            user_id: input.user_id,
            event_type: input.event_type,
            severity: input.severity,
            reasons: input.reasons,
            status: EventStatus::Open,
            source: input.source,
            created_at: Utc::now(),
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            escalated_at: None,
            escalated_by: None,
            vital_values: input.vital_values,
            metadata: input.metadata,
            revision: 0,
        };

        let document = to_document(&event).map_err(EventError::CreateFailed)?;
        let id = self
            .store
            .insert(&self.config.collection, document)
            .await
            .map_err(EventError::CreateFailed)?;

        log::info!(
            "Created {} {} event {} for subject {}",
            event.severity,
            event.event_type,
            id,
            event.user_id
        );
        Ok(id)
    }

    /// Apply a status transition to an existing event
    ///
    /// The status field is always overwritten to the requested value. The
    /// status-specific timestamp and actor are stamped only if the timestamp
    /// is not already set, so repeating a transition never rewrites when it
    /// first happened or who performed it. Provided metadata replaces the
    /// stored metadata wholesale.
    ///
    /// Fails with [`EventError::NotFound`] for an unknown id and with
    /// [`EventError::StaleRevision`] when `update.expected_revision` no
    /// longer matches the stored record.
    pub async fn update(&self, event_id: &str, update: EventUpdate) -> Result<()> {
        let document = self
            .store
            .fetch(&self.config.collection, event_id)
            .await
            .map_err(EventError::UpdateFailed)?
            .ok_or_else(|| EventError::NotFound(event_id.to_string()))?;
        let current: HealthEvent = from_document(document).map_err(EventError::UpdateFailed)?;

        if let Some(expected) = update.expected_revision {
            if expected != current.revision {
                return Err(EventError::StaleRevision {
                    id: event_id.to_string(),
                    expected,
                    found: current.revision,
                });
            }
        }

        // Transition timestamps use the same epoch-microseconds encoding as
        // the serialized record.
        let now = json!(Utc::now().timestamp_micros());
        let mut changes = Document::new();
        changes.insert(fields::STATUS.to_string(), json!(update.status));
        changes.insert(fields::REVISION.to_string(), json!(current.revision + 1));

        match update.status {
            EventStatus::Acked => {
                if current.acknowledged_at.is_none() {
                    changes.insert(fields::ACKNOWLEDGED_AT.to_string(), now.clone());
                    if let Some(actor) = update.acknowledged_by {
                        changes.insert(fields::ACKNOWLEDGED_BY.to_string(), json!(actor));
                    }
                }
            }
            EventStatus::Resolved => {
                if current.resolved_at.is_none() {
                    changes.insert(fields::RESOLVED_AT.to_string(), now.clone());
                    if let Some(actor) = update.resolved_by {
                        changes.insert(fields::RESOLVED_BY.to_string(), json!(actor));
                    }
                }
            }
            EventStatus::Escalated => {
                if current.escalated_at.is_none() {
                    changes.insert(fields::ESCALATED_AT.to_string(), now.clone());
                    if let Some(actor) = update.escalated_by {
                        changes.insert(fields::ESCALATED_BY.to_string(), json!(actor));
                    }
                }
            }
            EventStatus::Open => {}
        }

        if let Some(metadata) = update.metadata {
            changes.insert(
                fields::METADATA.to_string(),
                serde_json::Value::Object(metadata),
            );
        }

        self.store
            .update_fields(&self.config.collection, event_id, changes)
            .await
            .map_err(EventError::UpdateFailed)?;

        log::debug!("Event {} transitioned to {}", event_id, update.status);
        Ok(())
    }

    /// Mark an event as acknowledged by `actor_id`
    pub async fn acknowledge(&self, event_id: &str, actor_id: &str) -> Result<()> {
        self.update(
            event_id,
            EventUpdate::new(EventStatus::Acked).acknowledged_by(actor_id),
        )
        .await
    }

    /// Mark an event as resolved by `actor_id`
    pub async fn resolve(&self, event_id: &str, actor_id: &str) -> Result<()> {
        self.update(
            event_id,
            EventUpdate::new(EventStatus::Resolved).resolved_by(actor_id),
        )
        .await
    }

    /// Escalate an event, optionally recording why
    ///
    /// When `reason` is present it is stored as `metadata.escalation_reason`,
    /// replacing the stored metadata; without a reason the metadata is left
    /// untouched.
    pub async fn escalate(
        &self,
        event_id: &str,
        actor_id: &str,
        reason: Option<&str>,
    ) -> Result<()> {
        let mut update = EventUpdate::new(EventStatus::Escalated).escalated_by(actor_id);
        if let Some(reason) = reason {
            let mut metadata = Metadata::new();
            metadata.insert(fields::ESCALATION_REASON.to_string(), json!(reason));
            update = update.metadata(metadata);
        }
        self.update(event_id, update).await
    }

    /// Ingestion path from the vitals-evaluation pipeline
    ///
    /// Normal evaluations are not events: nothing is written and `None` is
    /// returned. Abnormal evaluations map `attention → medium` and
    /// `urgent → high` and are persisted as vital alerts carrying the raw
    /// readings and the evaluation timestamp.
    pub async fn create_from_vital_evaluation(
        &self,
        user_id: &str,
        evaluation: &VitalEvaluation,
        readings: VitalReadings,
        source: EventSource,
    ) -> Result<Option<EventId>> {
        let severity = match evaluation.severity {
            EvaluationSeverity::Normal => {
                log::debug!("Normal vitals for subject {}, no event created", user_id);
                return Ok(None);
            }
            EvaluationSeverity::Attention => Severity::Medium,
            EvaluationSeverity::Urgent => Severity::High,
        };

        let mut metadata = Metadata::new();
        metadata.insert(
            fields::EVALUATION_TIMESTAMP.to_string(),
            json!(evaluation.timestamp),
        );

        let id = self
            .create(NewHealthEvent {
                user_id: user_id.to_string(),
                event_type: EventType::VitalAlert,
                severity,
                reasons: evaluation.reasons.clone(),
                source,
                vital_values: Some(readings),
                metadata: Some(metadata),
            })
            .await?;
        Ok(Some(id))
    }

    /// Read a single event by identifier
    pub async fn event(&self, event_id: &str) -> Result<Option<HealthEvent>> {
        let document = self
            .store
            .fetch(&self.config.collection, event_id)
            .await
            .map_err(EventError::QueryFailed)?;
        match document {
            Some(document) => Ok(Some(
                from_document(document).map_err(EventError::QueryFailed)?,
            )),
            None => Ok(None),
        }
    }
}
