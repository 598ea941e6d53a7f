//! The full set of training records as one serializable value.
//!
//! Backs both [`MemoryStore`](crate::memory::MemoryStore) and
//! [`FileStore`](crate::file::FileStore); the query helpers here implement
//! the filters those backends answer.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use traineval_core::model::{
    CompletedTask, FinalJustification, Justification, MasterTask, NewCompletedTask,
    NewParticipantScore, Participant, ParticipantScore, Role, Training,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub trainings: Vec<Training>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub master_tasks: Vec<MasterTask>,
    #[serde(default)]
    pub completed_tasks: Vec<CompletedTask>,
    #[serde(default)]
    pub justifications: Vec<Justification>,
    #[serde(default)]
    pub final_justifications: Vec<FinalJustification>,
    #[serde(default)]
    pub participant_scores: Vec<ParticipantScore>,
}

impl Dataset {
    pub fn training(&self, id: Uuid) -> Option<Training> {
        self.trainings.iter().find(|t| t.id == id).cloned()
    }

    pub fn participant(&self, id: Uuid) -> Option<Participant> {
        self.participants.iter().find(|p| p.id == id).cloned()
    }

    pub fn participants_by_training(&self, training_id: Uuid) -> Vec<Participant> {
        let mut roster: Vec<Participant> = self
            .participants
            .iter()
            .filter(|p| p.training_id == training_id)
            .cloned()
            .collect();
        roster.sort_by_key(|p| p.created_at);
        roster
    }

    pub fn master_tasks_by_day(&self) -> Vec<MasterTask> {
        let mut tasks = self.master_tasks.clone();
        tasks.sort_by_key(|t| t.day_number);
        tasks
    }

    pub fn completed_tasks_for(&self, participant_ids: &[Uuid]) -> Vec<CompletedTask> {
        if participant_ids.is_empty() {
            return Vec::new();
        }
        let wanted: HashSet<&Uuid> = participant_ids.iter().collect();
        self.completed_tasks
            .iter()
            .filter(|c| wanted.contains(&c.participant_id))
            .cloned()
            .collect()
    }

    pub fn participant_scores(&self, training_id: Uuid) -> Vec<ParticipantScore> {
        self.participant_scores
            .iter()
            .filter(|s| s.training_id == training_id)
            .cloned()
            .collect()
    }

    /// Append a completion row, assigning its id and timestamp.
    pub fn push_completed_task(&mut self, record: NewCompletedTask) -> CompletedTask {
        let row = CompletedTask {
            id: Uuid::new_v4(),
            participant_id: record.participant_id,
            task_id: record.task_id,
            completion_date: record.completion_date,
            created_at: Utc::now(),
        };
        self.completed_tasks.push(row.clone());
        row
    }

    /// Remove a completion row. Missing ids are ignored.
    pub fn remove_completed_task(&mut self, id: Uuid) {
        self.completed_tasks.retain(|c| c.id != id);
    }

    /// Append cache rows. Existing rows are kept: the table has no
    /// uniqueness constraint.
    pub fn push_participant_scores(
        &mut self,
        rows: Vec<NewParticipantScore>,
    ) -> Vec<ParticipantScore> {
        let now = Utc::now();
        let inserted: Vec<ParticipantScore> = rows
            .into_iter()
            .map(|row| ParticipantScore {
                id: Uuid::new_v4(),
                participant_id: row.participant_id,
                training_id: row.training_id,
                task_completion_score: row.task_completion_score,
                on_time_score: row.on_time_score,
                final_grade: row.final_grade,
                description: row.description,
                created_at: now,
            })
            .collect();
        self.participant_scores.extend(inserted.iter().cloned());
        inserted
    }

    // Builders used by `init` and by tests.

    pub fn add_training(&mut self, name: &str, start: NaiveDate, end: NaiveDate) -> Training {
        let training = Training {
            id: Uuid::new_v4(),
            name: name.to_string(),
            start_date: start,
            end_date: end,
            created_at: self.next_timestamp(),
        };
        self.trainings.push(training.clone());
        training
    }

    pub fn add_participant(&mut self, training: &Training, name: &str, role: Role) -> Participant {
        let participant = Participant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role,
            training_id: training.id,
            created_at: self.next_timestamp(),
        };
        self.participants.push(participant.clone());
        participant
    }

    pub fn add_task(&mut self, day_number: u32, role: Role, backlog: &str, user_story: &str) -> MasterTask {
        let task = MasterTask {
            id: Uuid::new_v4(),
            day_number,
            role,
            user_story: user_story.to_string(),
            backlog: backlog.to_string(),
            target_points: 1,
            created_at: self.next_timestamp(),
        };
        self.master_tasks.push(task.clone());
        task
    }

    pub fn add_completion(
        &mut self,
        participant: &Participant,
        task: &MasterTask,
        date: NaiveDate,
    ) -> CompletedTask {
        self.push_completed_task(NewCompletedTask {
            participant_id: participant.id,
            task_id: task.id,
            completion_date: date,
        })
    }

    pub fn add_justification(
        &mut self,
        role: Role,
        min_tasks: u32,
        max_tasks: u32,
        score: f64,
    ) -> Justification {
        let rule = Justification {
            id: Uuid::new_v4(),
            role,
            min_tasks,
            max_tasks,
            score,
            description: String::new(),
            created_at: self.next_timestamp(),
        };
        self.justifications.push(rule.clone());
        rule
    }

    pub fn add_final_justification(
        &mut self,
        min_score: f64,
        max_score: f64,
        description: &str,
    ) -> FinalJustification {
        let rule = FinalJustification {
            id: Uuid::new_v4(),
            min_score,
            max_score,
            description: description.to_string(),
            created_at: self.next_timestamp(),
        };
        self.final_justifications.push(rule.clone());
        rule
    }

    /// Strictly increasing creation times, so insertion order is also
    /// registration order.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let latest = self
            .trainings
            .iter()
            .map(|t| t.created_at)
            .chain(self.participants.iter().map(|p| p.created_at))
            .chain(self.master_tasks.iter().map(|t| t.created_at))
            .chain(self.justifications.iter().map(|j| j.created_at))
            .chain(self.final_justifications.iter().map(|f| f.created_at))
            .max();
        let now = Utc::now();
        match latest {
            Some(last) if last >= now => last + Duration::milliseconds(1),
            _ => now,
        }
    }

    /// A small cohort for `traineval init`: one training starting on
    /// `start`, a week of tasks per role, and a few completions.
    pub fn sample(start: NaiveDate) -> Self {
        let mut data = Dataset::default();
        let training = data.add_training("Sample Cohort", start, start + Duration::days(27));

        let stories = [
            ("Onboarding", "Set up the development environment"),
            ("Onboarding", "Read the team conventions"),
            ("Features", "Build the login screen"),
            ("Features", "Add form validation"),
            ("Quality", "Write tests for the login flow"),
        ];
        let mut frontend = Vec::new();
        let mut backend = Vec::new();
        for (day, (backlog, story)) in (1u32..).zip(stories) {
            frontend.push(data.add_task(day, Role::Frontend, backlog, story));
            backend.push(data.add_task(day, Role::Backend, backlog, &format!("{story} (API)")));
        }

        let ana = data.add_participant(&training, "Ana", Role::Frontend);
        let budi = data.add_participant(&training, "Budi", Role::Backend);
        let citra = data.add_participant(&training, "Citra", Role::Frontend);

        for (task, offset) in frontend.iter().zip([0, 1, 2, 3, 4]) {
            data.add_completion(&ana, task, start + Duration::days(offset));
        }
        for (task, offset) in backend.iter().zip([0, 3, 6]) {
            data.add_completion(&budi, task, start + Duration::days(offset));
        }
        data.add_completion(&citra, &frontend[0], start + Duration::days(2));

        for role in Role::ALL {
            data.add_justification(role, 0, 1, 20.0);
            data.add_justification(role, 2, 3, 60.0);
            data.add_justification(role, 4, 5, 100.0);
        }
        data.add_final_justification(0.0, 59.0, "Needs improvement");
        data.add_final_justification(60.0, 79.0, "Good");
        data.add_final_justification(80.0, 100.0, "Excellent");

        data
    }
}
