//! JSON-file store: the whole dataset in one file, rewritten on every write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use traineval_core::model::{
    CompletedTask, FinalJustification, Justification, MasterTask, NewCompletedTask,
    NewParticipantScore, Participant, ParticipantScore, Training,
};
use traineval_core::{RecordStore, StoreError};

use crate::dataset::Dataset;

pub struct FileStore {
    path: PathBuf,
    data: Mutex<Dataset>,
}

impl FileStore {
    /// Load the dataset at `path`. The file must exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        let data: Dataset = serde_json::from_str(&content)
            .map_err(|e| StoreError::Decode(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), trainings = data.trainings.len(), "dataset loaded");

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Write `data` to `path`, creating parent directories, and open it.
    pub async fn create(path: impl AsRef<Path>, data: Dataset) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        write_dataset(&path, &data).await?;

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn write_dataset(path: &Path, data: &Dataset) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[async_trait]
impl RecordStore for FileStore {
    fn name(&self) -> &str {
        "file"
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
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let row = next.push_completed_task(record);
        write_dataset(&self.path, &next).await?;
        *data = next;
        Ok(row)
    }

    async fn delete_completed_task(&self, id: Uuid) -> Result<(), StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        next.remove_completed_task(id);
        write_dataset(&self.path, &next).await?;
        *data = next;
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
        Ok(self.data.lock().await.participant_scores(training_id))
    }

    async fn insert_participant_scores(
        &self,
        rows: Vec<NewParticipantScore>,
    ) -> Result<Vec<ParticipantScore>, StoreError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let inserted = next.push_participant_scores(rows);
        write_dataset(&self.path, &next).await?;
        *data = next;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("traineval.json");
        let data = Dataset::sample(start());
        let participant = data.participants[2].clone();
        let task = data.master_tasks[4].clone();

        let store = FileStore::create(&path, data).await.unwrap();
        let row = store
            .insert_completed_task(NewCompletedTask {
                participant_id: participant.id,
                task_id: task.id,
                completion_date: start(),
            })
            .await
            .unwrap();

        let reopened = FileStore::open(&path).await.unwrap();
        let completed = reopened.completed_tasks_for(&[participant.id]).await.unwrap();
        assert!(completed.iter().any(|c| c.id == row.id));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::open(dir.path().join("nope.json")).await.err().unwrap();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[tokio::test]
    async fn malformed_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
