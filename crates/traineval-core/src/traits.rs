//! The persistence seam.
//!
//! The engine reads snapshots and writes cache rows through [`RecordStore`];
//! backends live in `traineval-store`. A backend may be a remote API, an
//! embedded file, or an in-memory fixture.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    CompletedTask, FinalJustification, Justification, MasterTask, NewCompletedTask,
    NewParticipantScore, Participant, ParticipantScore, Training,
};

/// Request/response access to the training records.
///
/// Reads filter by equality or membership only. Inserts return the persisted
/// rows including the store-assigned `id` and `created_at`. Implementations
/// do not retry; a failure is reported once and propagated.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    async fn trainings(&self) -> Result<Vec<Training>, StoreError>;

    async fn training(&self, id: Uuid) -> Result<Option<Training>, StoreError>;

    async fn participants_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<Participant>, StoreError>;

    async fn participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError>;

    /// The full curriculum, ordered by day number.
    async fn master_tasks(&self) -> Result<Vec<MasterTask>, StoreError>;

    /// Completion records whose participant is in `participant_ids`.
    async fn completed_tasks_for(
        &self,
        participant_ids: &[Uuid],
    ) -> Result<Vec<CompletedTask>, StoreError>;

    async fn insert_completed_task(
        &self,
        record: NewCompletedTask,
    ) -> Result<CompletedTask, StoreError>;

    async fn delete_completed_task(&self, id: Uuid) -> Result<(), StoreError>;

    async fn justifications(&self) -> Result<Vec<Justification>, StoreError>;

    async fn final_justifications(&self) -> Result<Vec<FinalJustification>, StoreError>;

    /// Cached score rows for a training.
    async fn participant_scores(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<ParticipantScore>, StoreError>;

    /// Bulk insert of cache rows.
    async fn insert_participant_scores(
        &self,
        rows: Vec<NewParticipantScore>,
    ) -> Result<Vec<ParticipantScore>, StoreError>;
}
