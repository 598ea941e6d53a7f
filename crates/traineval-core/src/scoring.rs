//! Per-participant score computation.
//!
//! Everything here is pure: the calculator works on a snapshot of the
//! curriculum, the rule tables, and the completion records, and never
//! touches the record store.

use std::collections::HashMap;

use uuid::Uuid;

use crate::calendar::is_on_time;
use crate::model::{CompletedTask, LeaderboardEntry, MasterTask, Participant, Training};
use crate::rules::{ConversionTable, GradeTable};

/// Weight of the task-completion score in the final grade.
pub const COMPLETION_WEIGHT: f64 = 0.6;
/// Weight of the on-time score in the final grade.
pub const ON_TIME_WEIGHT: f64 = 0.4;

/// Weighted final grade, rounded half up to the nearest integer.
pub fn final_grade(task_completion_score: f64, on_time_score: f64) -> i64 {
    let weighted = task_completion_score * COMPLETION_WEIGHT + on_time_score * ON_TIME_WEIGHT;
    round_half_up(weighted)
}

pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Raw completion counts for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionCounts {
    /// Every completion record, including ones pointing at deleted tasks.
    pub total: u32,
    /// Records whose task resolves and was finished by its due date.
    pub on_time: u32,
}

/// Scores participants against a fixed curriculum and rule set.
pub struct ScoreCalculator<'a> {
    tasks: HashMap<Uuid, &'a MasterTask>,
    conversions: &'a ConversionTable,
    grades: &'a GradeTable,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(
        tasks: &'a [MasterTask],
        conversions: &'a ConversionTable,
        grades: &'a GradeTable,
    ) -> Self {
        Self {
            tasks: tasks.iter().map(|t| (t.id, t)).collect(),
            conversions,
            grades,
        }
    }

    /// Count the participant's completions and how many of them were on time.
    ///
    /// `completed` must already be restricted to the participant.
    pub fn count(&self, training: &Training, completed: &[&CompletedTask]) -> CompletionCounts {
        let on_time = completed
            .iter()
            .filter(|record| match self.tasks.get(&record.task_id) {
                Some(task) => is_on_time(training.start_date, task.day_number, record.completion_date),
                None => false,
            })
            .count();

        CompletionCounts {
            total: completed.len() as u32,
            on_time: on_time as u32,
        }
    }

    /// Score one participant from their own completion records.
    pub fn score_participant(
        &self,
        training: &Training,
        participant: &Participant,
        completed: &[&CompletedTask],
    ) -> LeaderboardEntry {
        let counts = self.count(training, completed);

        let task_completion_score = self.conversions.score(participant.role, counts.total);
        let on_time_score = self.conversions.score(participant.role, counts.on_time);
        let grade = final_grade(task_completion_score, on_time_score);

        LeaderboardEntry {
            participant_id: participant.id,
            participant_name: participant.name.clone(),
            task_completion_score,
            on_time_score,
            final_grade: grade,
            description: self.grades.describe(grade),
            created_at: participant.created_at,
        }
    }

    /// Score a whole roster. Every participant gets an entry, in roster order.
    pub fn score_roster(
        &self,
        training: &Training,
        participants: &[Participant],
        completed: &[CompletedTask],
    ) -> Vec<LeaderboardEntry> {
        let mut by_participant: HashMap<Uuid, Vec<&CompletedTask>> = HashMap::new();
        for record in completed {
            by_participant
                .entry(record.participant_id)
                .or_default()
                .push(record);
        }

        participants
            .iter()
            .map(|participant| {
                let own = by_participant
                    .get(&participant.id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                self.score_participant(training, participant, own)
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Role;
    use crate::rules::tests::{conversion, grade};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 1, 8, minute, 0).unwrap()
    }

    pub(crate) fn training(end: NaiveDate) -> Training {
        Training {
            id: Uuid::new_v4(),
            name: "Batch 7".into(),
            start_date: date(2024, 1, 1),
            end_date: end,
            created_at: at(0),
        }
    }

    pub(crate) fn participant(training: &Training, name: &str, role: Role, minute: u32) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            training_id: training.id,
            created_at: at(minute),
        }
    }

    pub(crate) fn task(day_number: u32, role: Role) -> MasterTask {
        MasterTask {
            id: Uuid::new_v4(),
            day_number,
            role,
            user_story: format!("story for day {day_number}"),
            backlog: "Core".into(),
            target_points: 3,
            created_at: at(0),
        }
    }

    pub(crate) fn done(participant: &Participant, task_id: Uuid, on: NaiveDate) -> CompletedTask {
        CompletedTask {
            id: Uuid::new_v4(),
            participant_id: participant.id,
            task_id,
            completion_date: on,
            created_at: at(30),
        }
    }

    /// One point per task, for both roles; grades in bands of ten.
    pub(crate) fn linear_rules() -> (ConversionTable, GradeTable) {
        let mut conversions = Vec::new();
        for role in Role::ALL {
            for count in 0..=10u32 {
                conversions.push(conversion(role, count, count, f64::from(count) * 10.0));
            }
        }
        let grades = vec![
            grade(0.0, 49.0, "Below expectations"),
            grade(50.0, 79.0, "Meets expectations"),
            grade(80.0, 100.0, "Exceeds expectations"),
        ];
        (ConversionTable::new(&conversions), GradeTable::new(&grades))
    }

    #[test]
    fn final_grade_weights_and_rounds() {
        assert_eq!(final_grade(50.0, 30.0), 42);
        assert_eq!(final_grade(0.0, 0.0), 0);
        assert_eq!(final_grade(100.0, 100.0), 100);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
    }

    #[test]
    fn on_time_uses_calendar_due_dates() {
        let (conversions, grades) = linear_rules();
        let tasks = vec![task(1, Role::Frontend), task(3, Role::Frontend), task(6, Role::Frontend)];
        let calc = ScoreCalculator::new(&tasks, &conversions, &grades);
        let training = training(date(2024, 1, 31));
        let ana = participant(&training, "Ana", Role::Frontend, 1);

        let records = vec![
            done(&ana, tasks[0].id, date(2024, 1, 1)),
            // due 2024-01-03, finished a day late
            done(&ana, tasks[1].id, date(2024, 1, 4)),
            // due Saturday 2024-01-06 by calendar offset, finished Monday
            done(&ana, tasks[2].id, date(2024, 1, 8)),
        ];
        let refs: Vec<&CompletedTask> = records.iter().collect();

        let counts = calc.count(&training, &refs);
        assert_eq!(counts, CompletionCounts { total: 3, on_time: 1 });

        let entry = calc.score_participant(&training, &ana, &refs);
        assert_eq!(entry.task_completion_score, 30.0);
        assert_eq!(entry.on_time_score, 10.0);
        assert_eq!(entry.final_grade, 22);
        assert_eq!(entry.description, "Below expectations");
    }

    #[test]
    fn dangling_task_counts_only_toward_total() {
        let (conversions, grades) = linear_rules();
        let tasks = vec![task(1, Role::Backend)];
        let calc = ScoreCalculator::new(&tasks, &conversions, &grades);
        let training = training(date(2024, 1, 31));
        let budi = participant(&training, "Budi", Role::Backend, 2);

        let records = vec![
            done(&budi, tasks[0].id, date(2024, 1, 1)),
            done(&budi, Uuid::new_v4(), date(2024, 1, 1)),
        ];
        let refs: Vec<&CompletedTask> = records.iter().collect();

        assert_eq!(calc.count(&training, &refs), CompletionCounts { total: 2, on_time: 1 });
    }

    #[test]
    fn roster_without_completions_still_scored() {
        let (conversions, grades) = linear_rules();
        let tasks = vec![task(1, Role::Frontend)];
        let calc = ScoreCalculator::new(&tasks, &conversions, &grades);
        let training = training(date(2024, 1, 31));
        let ana = participant(&training, "Ana", Role::Frontend, 1);
        let budi = participant(&training, "Budi", Role::Backend, 2);
        let records = vec![done(&ana, tasks[0].id, date(2024, 1, 1))];

        let entries = calc.score_roster(&training, &[ana.clone(), budi.clone()], &records);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].participant_id, ana.id);
        assert_eq!(entries[0].final_grade, 10);
        assert_eq!(entries[1].participant_id, budi.id);
        assert_eq!(entries[1].task_completion_score, 0.0);
        assert_eq!(entries[1].final_grade, 0);
    }
}
