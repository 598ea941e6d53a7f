//! Core data model types for traineval.
//!
//! These mirror the rows held by the record store: trainings, their rosters,
//! the task curriculum, completion facts, the two rule tables, and the
//! cached score rows written once a training has concluded.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A training cohort with a fixed calendar window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: Uuid,
    pub name: String,
    /// Origin of the working-day calendar (day 1).
    pub start_date: NaiveDate,
    /// Last day of the training; the day after, the training is concluded.
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Training {
    /// A training is concluded once its end date lies strictly before `today`.
    pub fn is_concluded(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }
}

/// The track a participant follows. Every rule lookup is keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Frontend Developer", alias = "Frontend", alias = "frontend")]
    Frontend,
    #[serde(rename = "Backend Developer", alias = "Backend", alias = "backend")]
    Backend,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Frontend, Role::Backend];

    pub fn label(&self) -> &'static str {
        match self {
            Role::Frontend => "Frontend Developer",
            Role::Backend => "Backend Developer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frontend developer" | "frontend" | "fe" => Ok(Role::Frontend),
            "backend developer" | "backend" | "be" => Ok(Role::Backend),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A member of exactly one training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub training_id: Uuid,
    /// Registration time; breaks ties on the leaderboard.
    pub created_at: DateTime<Utc>,
}

/// A curriculum item, assigned to every participant of `role` on `day_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterTask {
    pub id: Uuid,
    /// 1-based working-day index relative to the training start.
    pub day_number: u32,
    pub role: Role,
    pub user_story: String,
    /// Backlog / category label.
    #[serde(default)]
    pub backlog: String,
    #[serde(default)]
    pub target_points: u32,
    pub created_at: DateTime<Utc>,
}

/// The fact "this participant finished this task on this date".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub task_id: Uuid,
    pub completion_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`CompletedTask`]; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCompletedTask {
    pub participant_id: Uuid,
    pub task_id: Uuid,
    pub completion_date: NaiveDate,
}

/// Task-count → score conversion rule for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    pub id: Uuid,
    pub role: Role,
    pub min_tasks: u32,
    pub max_tasks: u32,
    pub score: f64,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Final grade → description rule, shared by all roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalJustification {
    pub id: Uuid,
    pub min_score: f64,
    pub max_score: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Frozen leaderboard row for a concluded training.
///
/// Only numeric fields and the description are stored; names and
/// registration times are re-read from the roster when the cache is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantScore {
    pub id: Uuid,
    pub participant_id: Uuid,
    pub training_id: Uuid,
    pub task_completion_score: f64,
    pub on_time_score: f64,
    pub final_grade: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`ParticipantScore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParticipantScore {
    pub participant_id: Uuid,
    pub training_id: Uuid,
    pub task_completion_score: f64,
    pub on_time_score: f64,
    pub final_grade: i64,
    pub description: String,
}

/// One ranked row of a leaderboard. Derived, never persisted as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant_id: Uuid,
    pub participant_name: String,
    pub task_completion_score: f64,
    pub on_time_score: f64,
    pub final_grade: i64,
    pub description: String,
    /// The participant's registration time.
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// The cache row this entry freezes into.
    pub fn to_score_row(&self, training_id: Uuid) -> NewParticipantScore {
        NewParticipantScore {
            participant_id: self.participant_id,
            training_id,
            task_completion_score: self.task_completion_score,
            on_time_score: self.on_time_score,
            final_grade: self.final_grade,
            description: self.description.clone(),
        }
    }

    /// Rebuild an entry from a cached row and the participant's current data.
    pub fn from_cached(score: &ParticipantScore, participant: &Participant) -> Self {
        Self {
            participant_id: score.participant_id,
            participant_name: participant.name.clone(),
            task_completion_score: score.task_completion_score,
            on_time_score: score.on_time_score,
            final_grade: score.final_grade,
            description: score.description.clone(),
            created_at: participant.created_at,
        }
    }
}
