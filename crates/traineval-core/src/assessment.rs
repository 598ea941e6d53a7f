//! Daily assessment: which tasks are due on a date, and marking them done.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calendar::{working_day_number, DayIndex};
use crate::error::Result;
use crate::model::{CompletedTask, MasterTask, NewCompletedTask, Participant, Role, Training};
use crate::traits::RecordStore;

/// A task assigned on the assessed day and whether it has been completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedTask {
    pub task: MasterTask,
    pub completed: bool,
}

/// One participant's checklist for the assessed day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantChecklist {
    pub participant: Participant,
    pub tasks: Vec<AssignedTask>,
}

/// The assessment sheet for a training on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAssessment {
    pub training_id: Uuid,
    pub date: NaiveDate,
    pub day: DayIndex,
    pub checklists: Vec<ParticipantChecklist>,
}

/// Curriculum tasks assigned to `role` on working day `day`.
pub fn tasks_for_day(catalog: &[MasterTask], role: Role, day: u32) -> Vec<&MasterTask> {
    catalog
        .iter()
        .filter(|t| t.role == role && t.day_number == day)
        .collect()
}

/// Build the assessment sheet for `date`.
///
/// Dates before the start or on a weekend produce empty checklists; the
/// `day` field tells the two apart.
pub fn daily_assessment(
    training: &Training,
    participants: &[Participant],
    catalog: &[MasterTask],
    completed: &[CompletedTask],
    date: NaiveDate,
    role_filter: Option<Role>,
) -> DailyAssessment {
    let day = working_day_number(training.start_date, date);
    let done: HashSet<(Uuid, Uuid)> = completed
        .iter()
        .map(|c| (c.participant_id, c.task_id))
        .collect();

    let checklists = participants
        .iter()
        .filter(|p| role_filter.map_or(true, |role| p.role == role))
        .map(|participant| {
            let tasks = match day.day() {
                Some(n) => tasks_for_day(catalog, participant.role, n)
                    .into_iter()
                    .map(|task| AssignedTask {
                        completed: done.contains(&(participant.id, task.id)),
                        task: task.clone(),
                    })
                    .collect(),
                None => Vec::new(),
            };
            ParticipantChecklist {
                participant: participant.clone(),
                tasks,
            }
        })
        .collect();

    DailyAssessment {
        training_id: training.id,
        date,
        day,
        checklists,
    }
}

/// Record that `participant_id` finished `task_id` on `date`.
///
/// A pair is recorded at most once: when a record already exists it is
/// returned as is and nothing is written.
pub async fn mark_completed(
    store: &dyn RecordStore,
    participant_id: Uuid,
    task_id: Uuid,
    date: NaiveDate,
) -> Result<CompletedTask> {
    let existing = store.completed_tasks_for(&[participant_id]).await?;
    if let Some(record) = existing.into_iter().find(|c| c.task_id == task_id) {
        debug!(participant = %participant_id, task = %task_id, "task already completed");
        return Ok(record);
    }

    let record = store
        .insert_completed_task(NewCompletedTask {
            participant_id,
            task_id,
            completion_date: date,
        })
        .await?;
    Ok(record)
}

/// Remove the completion record for the pair. Returns whether one existed.
pub async fn unmark_completed(
    store: &dyn RecordStore,
    participant_id: Uuid,
    task_id: Uuid,
) -> Result<bool> {
    let existing = store.completed_tasks_for(&[participant_id]).await?;
    let Some(record) = existing.into_iter().find(|c| c.task_id == task_id) else {
        return Ok(false);
    };

    store.delete_completed_task(record.id).await?;
    Ok(true)
}
