//! Per-participant progress report with JSON and Markdown output.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calendar::{is_on_time, task_due_date};
use crate::error::{Result, ScoringError};
use crate::leaderboard::LeaderboardAssembler;
use crate::model::{CompletedTask, LeaderboardEntry, MasterTask, Participant, Role, Training};
use crate::traits::RecordStore;

/// Completion status of one curriculum task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    OnTime,
    Late,
    NotCompleted,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::OnTime => "on time",
            TaskStatus::Late => "late",
            TaskStatus::NotCompleted => "not completed",
        }
    }
}

/// A curriculum task annotated with the participant's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedTask {
    pub task_id: Uuid,
    pub day_number: u32,
    pub role: Role,
    pub backlog: String,
    pub user_story: String,
    pub target_points: u32,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub completion_date: Option<NaiveDate>,
}

/// Summary counts and rates for a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportStats {
    pub assigned: u32,
    pub completed: u32,
    pub on_time: u32,
    /// completed / assigned × 100.
    pub completion_percentage: f64,
    /// on_time / completed × 100.
    pub on_time_percentage: f64,
}

impl ReportStats {
    pub fn from_tasks(tasks: &[DetailedTask]) -> Self {
        let assigned = tasks.len() as u32;
        let completed = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::NotCompleted)
            .count() as u32;
        let on_time = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::OnTime)
            .count() as u32;

        Self {
            assigned,
            completed,
            on_time,
            completion_percentage: percentage(completed, assigned),
            on_time_percentage: percentage(on_time, completed),
        }
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// A participant's full progress report for one training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantReport {
    pub participant: Participant,
    pub training: Training,
    pub tasks: Vec<DetailedTask>,
    pub stats: ReportStats,
    /// The participant's leaderboard row; `None` when they are not on the
    /// training's roster.
    pub score: Option<LeaderboardEntry>,
}

/// Annotate every catalog task for the participant's role, ordered by day.
///
/// Only completions whose task is in the catalog appear; a completion for a
/// task of another role is ignored because that task is not listed.
pub fn detail_tasks(
    training: &Training,
    participant: &Participant,
    catalog: &[MasterTask],
    completed: &[CompletedTask],
) -> Vec<DetailedTask> {
    let by_task: HashMap<Uuid, &CompletedTask> = completed
        .iter()
        .filter(|c| c.participant_id == participant.id)
        .map(|c| (c.task_id, c))
        .collect();

    let mut tasks: Vec<DetailedTask> = catalog
        .iter()
        .filter(|t| t.role == participant.role)
        .map(|task| {
            let record = by_task.get(&task.id);
            let status = match record {
                Some(r) if is_on_time(training.start_date, task.day_number, r.completion_date) => {
                    TaskStatus::OnTime
                }
                Some(_) => TaskStatus::Late,
                None => TaskStatus::NotCompleted,
            };

            DetailedTask {
                task_id: task.id,
                day_number: task.day_number,
                role: task.role,
                backlog: task.backlog.clone(),
                user_story: task.user_story.clone(),
                target_points: task.target_points,
                due_date: task_due_date(training.start_date, task.day_number),
                status,
                completion_date: record.map(|r| r.completion_date),
            }
        })
        .collect();

    tasks.sort_by_key(|t| t.day_number);
    tasks
}

/// Load and build the report for `participant_id` in `training_id` as of
/// `today`.
///
/// The score comes from the training's leaderboard, so a concluded training
/// reports the frozen cached row. The participant does not have to belong to
/// the training: tasks are still annotated against its calendar, but there is
/// no score.
pub async fn participant_report(
    store: &dyn RecordStore,
    participant_id: Uuid,
    training_id: Uuid,
    today: NaiveDate,
) -> Result<ParticipantReport> {
    let ids = [participant_id];
    let (participant, training, catalog, completed) = futures::try_join!(
        store.participant(participant_id),
        store.training(training_id),
        store.master_tasks(),
        store.completed_tasks_for(&ids),
    )?;

    let participant =
        participant.ok_or_else(|| ScoringError::not_found("participant", participant_id))?;
    let training = training.ok_or_else(|| ScoringError::not_found("training", training_id))?;

    if participant.training_id != training.id {
        debug!(
            participant = %participant.id,
            training = %training.id,
            "participant is registered in another training"
        );
    }

    let tasks = detail_tasks(&training, &participant, &catalog, &completed);
    let stats = ReportStats::from_tasks(&tasks);

    let board = LeaderboardAssembler::new(store)
        .assemble(Some(&training), today)
        .await?;
    let score = board
        .entries
        .into_iter()
        .find(|e| e.participant_id == participant.id);

    Ok(ParticipantReport {
        participant,
        training,
        tasks,
        stats,
        score,
    })
}

impl ParticipantReport {
    /// Render the report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        let _ = writeln!(
            md,
            "## {} ({})\n\n**Training:** {} ({} to {})\n",
            self.participant.name,
            self.participant.role,
            self.training.name,
            self.training.start_date,
            self.training.end_date
        );
        let _ = writeln!(
            md,
            "**Completed:** {}/{} ({:.1}%), **on time:** {} ({:.1}%)\n",
            self.stats.completed,
            self.stats.assigned,
            self.stats.completion_percentage,
            self.stats.on_time,
            self.stats.on_time_percentage
        );
        if let Some(score) = &self.score {
            let _ = writeln!(
                md,
                "**Final grade:** {} ({}), **completion score:** {:.1}, **on-time score:** {:.1}\n",
                score.final_grade,
                score.description,
                score.task_completion_score,
                score.on_time_score
            );
        }

        md.push_str("| Day | Backlog | User story | Due | Completed | Status |\n");
        md.push_str("|-----|---------|------------|-----|-----------|--------|\n");
        for task in &self.tasks {
            let completed = task
                .completion_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} | {} | {} |",
                task.day_number,
                task.backlog,
                task.user_story,
                task.due_date,
                completed,
                task.status.label()
            );
        }

        md
    }
}
