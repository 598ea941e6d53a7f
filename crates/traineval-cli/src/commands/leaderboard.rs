//! The `traineval leaderboard` command.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use traineval_core::leaderboard::{Leaderboard, LeaderboardAssembler, LeaderboardSource};
use traineval_core::model::Training;
use traineval_core::statistics::{leaderboard_stats, LeaderboardStats};

use super::{open_store, select_training};

pub async fn execute(
    training_id: Option<Uuid>,
    today_arg: Option<NaiveDate>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let training = select_training(store.as_ref(), training_id).await?;
    let today = today_arg.unwrap_or_else(super::today);

    let board = LeaderboardAssembler::new(store.as_ref())
        .assemble(training.as_ref(), today)
        .await?;
    let stats = leaderboard_stats(&board.entries);

    match format.as_str() {
        "json" => {
            let out = serde_json::json!({
                "training": training,
                "leaderboard": board,
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "markdown" | "md" => match &training {
            Some(training) => println!("{}", to_markdown(training, &board, &stats)),
            None => println!("No trainings found."),
        },
        _ => print_text(training.as_ref(), &board, &stats),
    }

    Ok(())
}

fn source_label(source: LeaderboardSource) -> &'static str {
    match source {
        LeaderboardSource::NoTraining => "no training",
        LeaderboardSource::EmptyRoster => "empty roster",
        LeaderboardSource::Live => "live",
        LeaderboardSource::Cached => "final (cached)",
        LeaderboardSource::Recomputed {
            cache_written: true,
        } => "final (cache written)",
        LeaderboardSource::Recomputed {
            cache_written: false,
        } => "final (cache write failed)",
    }
}

fn print_text(training: Option<&Training>, board: &Leaderboard, stats: &LeaderboardStats) {
    let Some(training) = training else {
        println!("No trainings found. Run `traineval init` to create sample data.");
        return;
    };

    println!(
        "Leaderboard: {} ({} to {}) [{}]",
        training.name,
        training.start_date,
        training.end_date,
        source_label(board.source)
    );

    if board.is_empty() {
        println!("No participants in this training.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Rank",
        "Participant",
        "Completion",
        "On time",
        "Grade",
        "Description",
    ]);
    for (rank, entry) in board.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.participant_name),
            Cell::new(format!("{:.1}", entry.task_completion_score)),
            Cell::new(format!("{:.1}", entry.on_time_score)),
            Cell::new(entry.final_grade),
            Cell::new(&entry.description),
        ]);
    }
    println!("{table}");

    let top = stats
        .top_performer
        .as_ref()
        .map(|e| e.participant_name.as_str())
        .unwrap_or("-");
    println!(
        "Participants: {}, average grade: {}, top performer: {top}",
        stats.participant_count, stats.average_grade
    );
}

fn to_markdown(training: &Training, board: &Leaderboard, stats: &LeaderboardStats) -> String {
    let mut md = String::new();
    let _ = writeln!(
        md,
        "# {} leaderboard\n\n{} to {}, {}\n",
        training.name,
        training.start_date,
        training.end_date,
        source_label(board.source)
    );
    let _ = writeln!(
        md,
        "**Participants:** {}, **average grade:** {}\n",
        stats.participant_count, stats.average_grade
    );

    md.push_str("| Rank | Participant | Completion | On time | Grade | Description |\n");
    md.push_str("|------|-------------|------------|---------|-------|-------------|\n");
    for (rank, entry) in board.entries.iter().enumerate() {
        let _ = writeln!(
            md,
            "| {} | {} | {:.1} | {:.1} | {} | {} |",
            rank + 1,
            entry.participant_name,
            entry.task_completion_score,
            entry.on_time_score,
            entry.final_grade,
            entry.description
        );
    }
    md
}
