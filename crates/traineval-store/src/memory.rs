//! In-memory store for tests and demos.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use traineval_core::model::{
    CompletedTask, FinalJustification, Justification, MasterTask, NewCompletedTask,
    NewParticipantScore, Participant, ParticipantScore, Training,
};
use traineval_core::{RecordStore, StoreError};

use crate::dataset::Dataset;

/// A [`RecordStore`] over a [`Dataset`] held in memory.
///
/// Counts score-cache reads and writes so tests can assert on cache
/// behavior, and can be told to reject score writes.
pub struct MemoryStore {
    data: Mutex<Dataset>,
    score_reads: AtomicU32,
    score_writes: AtomicU32,
    fail_score_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: Mutex::new(data),
            score_reads: AtomicU32::new(0),
            score_writes: AtomicU32::new(0),
            fail_score_writes: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        Self::new(Dataset::default())
    }

    /// Number of `participant_scores` calls so far.
    pub fn score_reads(&self) -> u32 {
        self.score_reads.load(Ordering::Relaxed)
    }

    /// Number of `insert_participant_scores` calls so far, failed ones included.
    pub fn score_writes(&self) -> u32 {
        self.score_writes.load(Ordering::Relaxed)
    }

    /// Make every later score write fail with [`StoreError::Unavailable`].
    pub fn fail_score_writes(&self, fail: bool) {
        self.fail_score_writes.store(fail, Ordering::Relaxed);
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> Dataset {
        self.data.lock().await.clone()
    }

    /// Mutate the contents in place, e.g. to change rules between calls.
    pub async fn update<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Dataset) -> T,
    {
        let mut data = self.data.lock().await;
        f(&mut data)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn trainings(&self) -> Result<Vec<Training>, StoreError> {
        Ok(self.data.lock().await.trainings.clone())
    }

    async fn training(&self, id: Uuid) -> Result<Option<Training>, StoreError> {
        Ok(self.data.lock().await.training(id))
    }

    async fn participants_by_training(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<Participant>, StoreError> {
        Ok(self.data.lock().await.participants_by_training(training_id))
    }

    async fn participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.data.lock().await.participant(id))
    }

    async fn master_tasks(&self) -> Result<Vec<MasterTask>, StoreError> {
        Ok(self.data.lock().await.master_tasks_by_day())
    }

    async fn completed_tasks_for(
        &self,
        participant_ids: &[Uuid],
    ) -> Result<Vec<CompletedTask>, StoreError> {
        Ok(self.data.lock().await.completed_tasks_for(participant_ids))
    }

    async fn insert_completed_task(
        &self,
        record: NewCompletedTask,
    ) -> Result<CompletedTask, StoreError> {
        Ok(self.data.lock().await.push_completed_task(record))
    }

    async fn delete_completed_task(&self, id: Uuid) -> Result<(), StoreError> {
        self.data.lock().await.remove_completed_task(id);
        Ok(())
    }

    async fn justifications(&self) -> Result<Vec<Justification>, StoreError> {
        Ok(self.data.lock().await.justifications.clone())
    }

    async fn final_justifications(&self) -> Result<Vec<FinalJustification>, StoreError> {
        Ok(self.data.lock().await.final_justifications.clone())
    }

    async fn participant_scores(
        &self,
        training_id: Uuid,
    ) -> Result<Vec<ParticipantScore>, StoreError> {
        self.score_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.data.lock().await.participant_scores(training_id))
    }

    async fn insert_participant_scores(
        &self,
        rows: Vec<NewParticipantScore>,
    ) -> Result<Vec<ParticipantScore>, StoreError> {
        self.score_writes.fetch_add(1, Ordering::Relaxed);
        if self.fail_score_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("score writes disabled".into()));
        }
        Ok(self.data.lock().await.push_participant_scores(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use traineval_core::model::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn inserts_assign_ids() {
        let store = MemoryStore::empty();
        let participant = Uuid::new_v4();
        let a = store
            .insert_completed_task(NewCompletedTask {
                participant_id: participant,
                task_id: Uuid::new_v4(),
                completion_date: date(2024, 1, 2),
            })
            .await
            .unwrap();
        let b = store
            .insert_completed_task(NewCompletedTask {
                participant_id: participant,
                task_id: Uuid::new_v4(),
                completion_date: date(2024, 1, 3),
            })
            .await
            .unwrap();
        assert_ne!(a.id, b.id);

        store.delete_completed_task(a.id).await.unwrap();
        let left = store.completed_tasks_for(&[participant]).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[tokio::test]
    async fn failing_score_writes_are_counted() {
        let store = MemoryStore::empty();
        store.fail_score_writes(true);
        let err = store.insert_participant_scores(vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.score_writes(), 1);
        assert!(store.snapshot().await.participant_scores.is_empty());
    }

    #[tokio::test]
    async fn master_tasks_come_back_by_day() {
        let mut data = Dataset::default();
        data.add_task(3, Role::Frontend, "b", "third");
        data.add_task(1, Role::Frontend, "b", "first");
        let store = MemoryStore::new(data);

        let days: Vec<u32> = store
            .master_tasks()
            .await
            .unwrap()
            .iter()
            .map(|t| t.day_number)
            .collect();
        assert_eq!(days, vec![1, 3]);
    }
}
