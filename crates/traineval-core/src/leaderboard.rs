//! Leaderboard assembly with a freeze-on-conclusion cache.
//!
//! While a training runs, its leaderboard is always computed live. Once it
//! has concluded, the first computation is written to the store as cache
//! rows and later requests read those rows back instead of recomputing, so
//! the final standings survive later edits to rules or completion records.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{LeaderboardEntry, NewParticipantScore, Participant, Training};
use crate::rules::{ConversionTable, GradeTable};
use crate::scoring::ScoreCalculator;
use crate::traits::RecordStore;

/// Where a leaderboard's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LeaderboardSource {
    /// No training was selected.
    NoTraining,
    /// The training has no participants; nothing was computed.
    EmptyRoster,
    /// Computed live for a running training.
    Live,
    /// Read from the cache of a concluded training.
    Cached,
    /// Computed live for a concluded training without a full cache.
    Recomputed { cache_written: bool },
}

/// An ordered leaderboard for one training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub training_id: Option<Uuid>,
    pub entries: Vec<LeaderboardEntry>,
    pub source: LeaderboardSource,
}

impl Leaderboard {
    fn empty(training_id: Option<Uuid>, source: LeaderboardSource) -> Self {
        Self {
            training_id,
            entries: Vec::new(),
            source,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ranking order: final grade, completion score, and on-time score
/// descending, then earliest registration first.
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.final_grade
        .cmp(&a.final_grade)
        .then_with(|| desc(a.task_completion_score, b.task_completion_score))
        .then_with(|| desc(a.on_time_score, b.on_time_score))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Sort entries into ranking order.
///
/// The sort is stable: entries equal on all four keys (same registration
/// timestamp) keep their input order.
pub fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(compare_entries);
}

/// The training a dashboard opens on: the most recently created one.
pub fn latest_training(trainings: &[Training]) -> Option<&Training> {
    trainings.iter().max_by_key(|t| t.created_at)
}

/// Builds leaderboards on top of a [`RecordStore`].
pub struct LeaderboardAssembler<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> LeaderboardAssembler<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Produce the ordered leaderboard for `training` as of `today`.
    pub async fn assemble(
        &self,
        training: Option<&Training>,
        today: NaiveDate,
    ) -> Result<Leaderboard> {
        let Some(training) = training else {
            return Ok(Leaderboard::empty(None, LeaderboardSource::NoTraining));
        };

        let participants = self.store.participants_by_training(training.id).await?;
        if participants.is_empty() {
            debug!(training = %training.id, "empty roster, nothing to rank");
            return Ok(Leaderboard::empty(
                Some(training.id),
                LeaderboardSource::EmptyRoster,
            ));
        }

        let (mut entries, source) = if training.is_concluded(today) {
            self.concluded(training, &participants).await?
        } else {
            let entries = self.compute_live(training, &participants).await?;
            (entries, LeaderboardSource::Live)
        };

        sort_entries(&mut entries);
        info!(
            training = %training.id,
            participants = entries.len(),
            ?source,
            "leaderboard assembled"
        );

        Ok(Leaderboard {
            training_id: Some(training.id),
            entries,
            source,
        })
    }

    async fn concluded(
        &self,
        training: &Training,
        participants: &[Participant],
    ) -> Result<(Vec<LeaderboardEntry>, LeaderboardSource)> {
        let cached = self.store.participant_scores(training.id).await?;

        if cached.len() == participants.len() {
            debug!(training = %training.id, rows = cached.len(), "using cached scores");
            let roster: HashMap<Uuid, &Participant> =
                participants.iter().map(|p| (p.id, p)).collect();
            let entries: Vec<LeaderboardEntry> = cached
                .iter()
                .filter_map(|score| {
                    roster
                        .get(&score.participant_id)
                        .map(|p| LeaderboardEntry::from_cached(score, p))
                })
                .collect();
            if entries.len() < participants.len() {
                warn!(
                    training = %training.id,
                    dropped = cached.len() - entries.len(),
                    "cached scores reference participants no longer on the roster"
                );
            }
            return Ok((entries, LeaderboardSource::Cached));
        }

        debug!(
            training = %training.id,
            cached = cached.len(),
            roster = participants.len(),
            "cache incomplete, recomputing"
        );
        let entries = self.compute_live(training, participants).await?;
        let rows: Vec<NewParticipantScore> =
            entries.iter().map(|e| e.to_score_row(training.id)).collect();
        let cache_written = self.write_cache(training.id, rows).await;

        Ok((entries, LeaderboardSource::Recomputed { cache_written }))
    }

    /// Best-effort bulk write; a failure is logged and never propagated.
    async fn write_cache(&self, training_id: Uuid, rows: Vec<NewParticipantScore>) -> bool {
        let count = rows.len();
        match self.store.insert_participant_scores(rows).await {
            Ok(_) => {
                debug!(training = %training_id, rows = count, "score cache written");
                true
            }
            Err(e) => {
                warn!(training = %training_id, "failed to cache scores: {e}");
                false
            }
        }
    }

    async fn compute_live(
        &self,
        training: &Training,
        participants: &[Participant],
    ) -> Result<Vec<LeaderboardEntry>> {
        let ids: Vec<Uuid> = participants.iter().map(|p| p.id).collect();

        let (tasks, justifications, finals, completed) = futures::try_join!(
            self.store.master_tasks(),
            self.store.justifications(),
            self.store.final_justifications(),
            self.store.completed_tasks_for(&ids),
        )?;

        let conversions = ConversionTable::new(&justifications);
        let grades = GradeTable::new(&finals);
        let calculator = ScoreCalculator::new(&tasks, &conversions, &grades);

        Ok(calculator.score_roster(training, participants, &completed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::tests::{at, date, training};

    fn entry(name: &str, grade: i64, completion: f64, on_time: f64, minute: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            participant_id: Uuid::new_v4(),
            participant_name: name.into(),
            task_completion_score: completion,
            on_time_score: on_time,
            final_grade: grade,
            description: String::new(),
            created_at: at(minute),
        }
    }

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.participant_name.as_str()).collect()
    }

    #[test]
    fn sorts_by_grade_then_scores() {
        let mut entries = vec![
            entry("low", 40, 50.0, 25.0, 0),
            entry("high", 90, 90.0, 90.0, 5),
            entry("mid-more-ontime", 70, 70.0, 70.0, 3),
            entry("mid-more-done", 70, 80.0, 55.0, 4),
        ];
        sort_entries(&mut entries);
        assert_eq!(
            names(&entries),
            vec!["high", "mid-more-done", "mid-more-ontime", "low"]
        );
    }

    #[test]
    fn full_ties_go_to_earliest_registration() {
        let mut entries = vec![
            entry("late", 60, 60.0, 60.0, 20),
            entry("early", 60, 60.0, 60.0, 10),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["early", "late"]);
    }

    #[test]
    fn latest_training_by_creation() {
        let mut older = training(date(2024, 1, 31));
        older.created_at = at(1);
        let mut newer = training(date(2024, 3, 31));
        newer.created_at = at(2);
        let all = vec![older, newer.clone()];
        assert_eq!(latest_training(&all).map(|t| t.id), Some(newer.id));
        assert!(latest_training(&[]).is_none());
    }
}
