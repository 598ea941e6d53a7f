//! The `traineval complete` and `traineval uncomplete` commands.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use traineval_core::assessment::{mark_completed, unmark_completed};
use traineval_core::model::{MasterTask, Participant};
use traineval_core::{RecordStore, ScoringError};

use super::open_store;

async fn lookup(
    store: &dyn RecordStore,
    participant_id: Uuid,
    task_id: Uuid,
) -> Result<(Participant, MasterTask)> {
    let participant = store
        .participant(participant_id)
        .await?
        .ok_or_else(|| ScoringError::not_found("participant", participant_id))?;
    let task = store
        .master_tasks()
        .await?
        .into_iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| ScoringError::not_found("task", task_id))?;
    Ok((participant, task))
}

pub async fn execute(
    participant_id: Uuid,
    task_id: Uuid,
    date: Option<NaiveDate>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let (participant, task) = lookup(store.as_ref(), participant_id, task_id).await?;
    if task.role != participant.role {
        warn!(
            participant = %participant.id,
            task = %task.id,
            "task belongs to the {} track, participant is {}",
            task.role,
            participant.role
        );
    }

    let date = date.unwrap_or_else(super::today);
    let record = mark_completed(store.as_ref(), participant.id, task.id, date).await?;
    println!(
        "{}: day {} task completed on {}",
        participant.name, task.day_number, record.completion_date
    );
    Ok(())
}

pub async fn undo(participant_id: Uuid, task_id: Uuid, config_path: Option<PathBuf>) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let (participant, task) = lookup(store.as_ref(), participant_id, task_id).await?;

    if unmark_completed(store.as_ref(), participant.id, task.id).await? {
        println!("{}: day {} task no longer completed", participant.name, task.day_number);
    } else {
        println!("{}: day {} task was not completed", participant.name, task.day_number);
    }
    Ok(())
}
