//! Read-side queries
//!
//! Two tiers of the same operations: `try_*` methods propagate failure, the
//! plain methods absorb it and degrade to an empty result so screens can keep
//! rendering. Losing visibility into events is less harmful than silently
//! failing to act on one, so only the read path degrades; writes never do.

use crate::service::HealthEventService;
use crate::store::{from_document, Document, DocumentStore, MAX_ANY_OF_VALUES};
use crate::types::{fields, EventError, EventStatus, HealthEvent, Result};
use serde_json::{json, Value};

impl<S: DocumentStore> HealthEventService<S> {
    /// Events for one subject, most recent first
    ///
    /// `limit` defaults to the configured subject limit. Propagates query
    /// failure; see [`events_for_subject`](Self::events_for_subject) for the
    /// degrading variant.
    pub async fn try_events_for_subject(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<HealthEvent>> {
        let limit = limit.unwrap_or(self.config().subject_limit);
        let documents = self
            .store()
            .query_equals(
                &self.config().collection,
                fields::USER_ID,
                json!(user_id),
                fields::CREATED_AT,
                limit,
            )
            .await
            .map_err(EventError::QueryFailed)?;
        Ok(decode_documents(documents))
    }

    /// Degrading variant of [`try_events_for_subject`](Self::try_events_for_subject):
    /// any failure is logged and collapsed to an empty list
    pub async fn events_for_subject(&self, user_id: &str, limit: Option<usize>) -> Vec<HealthEvent> {
        absorb(self.try_events_for_subject(user_id, limit).await)
    }

    /// Unresolved (open, acked or escalated) events for one subject
    ///
    /// Derived client-side by filtering a fetch capped at the configured
    /// active limit; there is no separate store index for active events.
    pub async fn try_active_events_for_subject(&self, user_id: &str) -> Result<Vec<HealthEvent>> {
        let events = self
            .try_events_for_subject(user_id, Some(self.config().active_limit))
            .await?;
        Ok(events.into_iter().filter(HealthEvent::is_active).collect())
    }

    /// Degrading variant of [`try_active_events_for_subject`](Self::try_active_events_for_subject)
    pub async fn active_events_for_subject(&self, user_id: &str) -> Vec<HealthEvent> {
        absorb(self.try_active_events_for_subject(user_id).await)
    }

    /// Events for one subject in exactly `status`
    ///
    /// Same client-side-filter strategy over a broader fetch (the configured
    /// status limit).
    pub async fn try_events_by_status(
        &self,
        user_id: &str,
        status: EventStatus,
    ) -> Result<Vec<HealthEvent>> {
        let events = self
            .try_events_for_subject(user_id, Some(self.config().status_limit))
            .await?;
        Ok(events
            .into_iter()
            .filter(|event| event.status == status)
            .collect())
    }

    /// Degrading variant of [`try_events_by_status`](Self::try_events_by_status)
    pub async fn events_by_status(&self, user_id: &str, status: EventStatus) -> Vec<HealthEvent> {
        absorb(self.try_events_by_status(user_id, status).await)
    }

    /// Events across several subjects (e.g. a family circle), most recent
    /// first
    ///
    /// The store's membership filter accepts at most [`MAX_ANY_OF_VALUES`]
    /// values, so the subject list is partitioned into batches, one query per
    /// batch, each independently ordered and capped at `limit`. Batch results
    /// are concatenated, re-sorted by `created_at` descending and truncated
    /// to `limit`. The two-level limiting means a batch's locally-oldest
    /// events can be dropped even though another batch had room; acceptable
    /// for surfacing recent cross-family events, not for exhaustive audit.
    ///
    /// Failure of any batch fails the whole call; partial-batch results are
    /// not preserved.
    pub async fn try_events_for_subjects(
        &self,
        user_ids: &[String],
        limit: Option<usize>,
    ) -> Result<Vec<HealthEvent>> {
        let limit = limit.unwrap_or(self.config().family_limit);
        if user_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for batch in user_ids.chunks(MAX_ANY_OF_VALUES) {
            let values: Vec<Value> = batch.iter().map(|user_id| json!(user_id)).collect();
            let documents = self
                .store()
                .query_any_of(
                    &self.config().collection,
                    fields::USER_ID,
                    &values,
                    fields::CREATED_AT,
                    limit,
                )
                .await
                .map_err(EventError::QueryFailed)?;
            events.extend(decode_documents(documents));
        }

        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(limit);
        Ok(events)
    }

    /// Degrading variant of [`try_events_for_subjects`](Self::try_events_for_subjects)
    pub async fn events_for_subjects(
        &self,
        user_ids: &[String],
        limit: Option<usize>,
    ) -> Vec<HealthEvent> {
        absorb(self.try_events_for_subjects(user_ids, limit).await)
    }
}

/// Collapse a failed query into an empty list, logging the cause
fn absorb(result: Result<Vec<HealthEvent>>) -> Vec<HealthEvent> {
    match result {
        Ok(events) => events,
        Err(error) => {
            log::warn!("Health event query degraded to empty result: {}", error);
            Vec::new()
        }
    }
}

/// Decode store documents, skipping malformed records with a warning
fn decode_documents(documents: Vec<Document>) -> Vec<HealthEvent> {
    documents
        .into_iter()
        .filter_map(|document| match from_document::<HealthEvent>(document) {
            Ok(event) => Some(event),
            Err(error) => {
                log::warn!("Skipping malformed health event record: {}", error);
                None
            }
        })
        .collect()
}
