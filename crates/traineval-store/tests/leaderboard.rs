//! Leaderboard, report and assessment flows against the in-memory store.
//!
//! The sample cohort runs 2024-01-01..=2024-01-28 with three participants:
//! Ana (100, Excellent), Budi (44) and Citra (20).

use chrono::NaiveDate;
use uuid::Uuid;

use traineval_core::assessment::{mark_completed, unmark_completed};
use traineval_core::leaderboard::{latest_training, LeaderboardAssembler, LeaderboardSource};
use traineval_core::model::{NewParticipantScore, Role, Training};
use traineval_core::report::{participant_report, TaskStatus};
use traineval_core::RecordStore;
use traineval_store::{Dataset, MemoryStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn running() -> NaiveDate {
    date(2024, 1, 10)
}

fn concluded() -> NaiveDate {
    date(2024, 2, 15)
}

async fn sample_store() -> (MemoryStore, Training) {
    let store = MemoryStore::new(Dataset::sample(date(2024, 1, 1)));
    let trainings = store.trainings().await.unwrap();
    let training = latest_training(&trainings).cloned().unwrap();
    (store, training)
}

fn ranking(board: &traineval_core::leaderboard::Leaderboard) -> Vec<(&str, i64)> {
    board
        .entries
        .iter()
        .map(|e| (e.participant_name.as_str(), e.final_grade))
        .collect()
}

#[tokio::test]
async fn no_training_selected() {
    let store = MemoryStore::empty();
    let board = LeaderboardAssembler::new(&store)
        .assemble(None, running())
        .await
        .unwrap();
    assert_eq!(board.source, LeaderboardSource::NoTraining);
    assert!(board.is_empty());
}

#[tokio::test]
async fn running_training_is_computed_live() {
    let (store, training) = sample_store().await;
    let assembler = LeaderboardAssembler::new(&store);

    let board = assembler.assemble(Some(&training), running()).await.unwrap();
    assert_eq!(board.source, LeaderboardSource::Live);
    assert_eq!(ranking(&board), vec![("Ana", 100), ("Budi", 44), ("Citra", 20)]);
    assert_eq!(board.entries[0].description, "Excellent");
    assert_eq!(board.entries[1].description, "Needs improvement");

    assembler.assemble(Some(&training), running()).await.unwrap();
    assert_eq!(store.score_reads(), 0);
    assert_eq!(store.score_writes(), 0);
}

#[tokio::test]
async fn concluded_training_is_frozen_after_first_view() {
    let (store, training) = sample_store().await;
    let assembler = LeaderboardAssembler::new(&store);

    let first = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(first.source, LeaderboardSource::Recomputed { cache_written: true });
    assert_eq!(store.snapshot().await.participant_scores.len(), 3);

    // Rule edits after conclusion no longer move the standings.
    store
        .update(|data| {
            for rule in &mut data.justifications {
                rule.score = 0.0;
            }
        })
        .await;

    let second = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(second.source, LeaderboardSource::Cached);
    assert_eq!(ranking(&second), ranking(&first));
    assert_eq!(second.entries, first.entries);
    assert_eq!(store.score_writes(), 1);
}

#[tokio::test]
async fn cached_rows_show_current_names() {
    let (store, training) = sample_store().await;
    let assembler = LeaderboardAssembler::new(&store);
    assembler.assemble(Some(&training), concluded()).await.unwrap();

    store
        .update(|data| {
            if let Some(ana) = data.participants.iter_mut().find(|p| p.name == "Ana") {
                ana.name = "Ana Maria".into();
            }
        })
        .await;

    let board = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(board.source, LeaderboardSource::Cached);
    assert_eq!(board.entries[0].participant_name, "Ana Maria");
}

#[tokio::test]
async fn partial_cache_is_recomputed_for_everyone() {
    let (store, training) = sample_store().await;
    let budi = store
        .snapshot()
        .await
        .participants
        .into_iter()
        .find(|p| p.name == "Budi")
        .unwrap();
    store
        .insert_participant_scores(vec![NewParticipantScore {
            participant_id: budi.id,
            training_id: training.id,
            task_completion_score: 1.0,
            on_time_score: 1.0,
            final_grade: 1,
            description: "stale".into(),
        }])
        .await
        .unwrap();

    let board = LeaderboardAssembler::new(&store)
        .assemble(Some(&training), concluded())
        .await
        .unwrap();
    assert_eq!(board.source, LeaderboardSource::Recomputed { cache_written: true });
    assert_eq!(ranking(&board), vec![("Ana", 100), ("Budi", 44), ("Citra", 20)]);

    // One stale row plus a full set of three; duplicates are not cleaned up.
    assert_eq!(store.snapshot().await.participant_scores.len(), 4);
}

#[tokio::test]
async fn empty_roster_skips_the_cache() {
    let mut data = Dataset::default();
    let training = data.add_training("empty", date(2024, 1, 1), date(2024, 1, 5));
    let store = MemoryStore::new(data);

    let board = LeaderboardAssembler::new(&store)
        .assemble(Some(&training), concluded())
        .await
        .unwrap();
    assert_eq!(board.source, LeaderboardSource::EmptyRoster);
    assert!(board.is_empty());
    assert_eq!(store.score_reads(), 0);
    assert_eq!(store.score_writes(), 0);
}

#[tokio::test]
async fn failed_cache_write_still_returns_the_board() {
    let (store, training) = sample_store().await;
    store.fail_score_writes(true);
    let assembler = LeaderboardAssembler::new(&store);

    let board = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(board.source, LeaderboardSource::Recomputed { cache_written: false });
    assert_eq!(board.entries.len(), 3);

    // Nothing was cached, so the next view tries again.
    store.fail_score_writes(false);
    let again = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(again.source, LeaderboardSource::Recomputed { cache_written: true });
    assert_eq!(store.score_writes(), 2);
}

#[tokio::test]
async fn report_for_unknown_participant_is_not_found() {
    let (store, training) = sample_store().await;
    let err = participant_report(&store, Uuid::new_v4(), training.id, running())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn report_matches_leaderboard_counts() {
    let (store, training) = sample_store().await;
    let budi = store
        .snapshot()
        .await
        .participants
        .into_iter()
        .find(|p| p.name == "Budi")
        .unwrap();

    let report = participant_report(&store, budi.id, training.id, running())
        .await
        .unwrap();
    assert_eq!(report.stats.assigned, 5);
    assert_eq!(report.stats.completed, 3);
    assert_eq!(report.stats.on_time, 1);
    assert_eq!(report.tasks[0].status, TaskStatus::OnTime);
    assert_eq!(report.tasks[1].status, TaskStatus::Late);
    assert_eq!(report.tasks[4].status, TaskStatus::NotCompleted);
}

#[tokio::test]
async fn report_carries_the_leaderboard_score() {
    let (store, training) = sample_store().await;
    let budi = store
        .snapshot()
        .await
        .participants
        .into_iter()
        .find(|p| p.name == "Budi")
        .unwrap();

    let report = participant_report(&store, budi.id, training.id, running())
        .await
        .unwrap();
    let score = report.score.unwrap();
    assert_eq!(score.final_grade, 44);
    assert_eq!(score.task_completion_score, 60.0);
    assert_eq!(score.on_time_score, 20.0);
    assert_eq!(score.description, "Needs improvement");
    assert_eq!(store.score_writes(), 0);
}

#[tokio::test]
async fn concluded_report_reads_the_frozen_score() {
    let (store, training) = sample_store().await;
    let budi = store
        .snapshot()
        .await
        .participants
        .into_iter()
        .find(|p| p.name == "Budi")
        .unwrap();
    LeaderboardAssembler::new(&store)
        .assemble(Some(&training), concluded())
        .await
        .unwrap();

    store
        .update(|data| {
            for rule in &mut data.justifications {
                rule.score = 0.0;
            }
        })
        .await;

    let report = participant_report(&store, budi.id, training.id, concluded())
        .await
        .unwrap();
    assert_eq!(report.score.map(|s| s.final_grade), Some(44));
    assert_eq!(store.score_writes(), 1);
}

#[tokio::test]
async fn report_outside_the_roster_has_no_score() {
    let (store, training) = sample_store().await;
    let other = store
        .update(|data| {
            let other = data.add_training("other", date(2024, 3, 4), date(2024, 3, 29));
            data.add_participant(&other, "Eka", Role::Backend)
        })
        .await;

    let report = participant_report(&store, other.id, training.id, running())
        .await
        .unwrap();
    assert!(report.score.is_none());
    assert_eq!(report.stats.assigned, 5);
    assert_eq!(report.stats.completed, 0);
}

#[tokio::test]
async fn cached_rows_of_removed_participants_are_dropped() {
    let (store, training) = sample_store().await;
    let assembler = LeaderboardAssembler::new(&store);
    assembler.assemble(Some(&training), concluded()).await.unwrap();

    // Same roster size, but Citra left and Dewi joined after the cache was written.
    store
        .update(|data| {
            data.participants.retain(|p| p.name != "Citra");
            data.add_participant(&training, "Dewi", Role::Frontend);
        })
        .await;

    let board = assembler.assemble(Some(&training), concluded()).await.unwrap();
    assert_eq!(board.source, LeaderboardSource::Cached);
    assert_eq!(ranking(&board), vec![("Ana", 100), ("Budi", 44)]);
    assert_eq!(store.score_writes(), 1);
}

#[tokio::test]
async fn marking_is_idempotent_and_reversible() {
    let (store, training) = sample_store().await;
    let data = store.snapshot().await;
    let citra = data.participants.iter().find(|p| p.name == "Citra").unwrap();
    let task = data
        .master_tasks
        .iter()
        .find(|t| t.role == citra.role && t.day_number == 2)
        .unwrap();

    let first = mark_completed(&store, citra.id, task.id, date(2024, 1, 2))
        .await
        .unwrap();
    let second = mark_completed(&store, citra.id, task.id, date(2024, 1, 9))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.completion_date, date(2024, 1, 2));

    let board = LeaderboardAssembler::new(&store)
        .assemble(Some(&training), running())
        .await
        .unwrap();
    let citra_entry = board.entries.iter().find(|e| e.participant_id == citra.id).unwrap();
    // Two done, one on time: 60 and 20 → floor(36 + 8 + 0.5)
    assert_eq!(citra_entry.final_grade, 44);

    assert!(unmark_completed(&store, citra.id, task.id).await.unwrap());
    assert!(!unmark_completed(&store, citra.id, task.id).await.unwrap());
}
