//! The `traineval report` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use traineval_core::report::{participant_report, ParticipantReport};

use super::open_store;

pub async fn execute(
    participant_id: Uuid,
    training_id: Uuid,
    today_arg: Option<NaiveDate>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let today = today_arg.unwrap_or_else(super::today);
    let report = participant_report(store.as_ref(), participant_id, training_id, today).await?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    Ok(())
}

fn print_text(report: &ParticipantReport) {
    println!(
        "{} ({}) in {}",
        report.participant.name, report.participant.role, report.training.name
    );
    println!(
        "Completed {}/{} ({:.1}%), on time {} ({:.1}%)",
        report.stats.completed,
        report.stats.assigned,
        report.stats.completion_percentage,
        report.stats.on_time,
        report.stats.on_time_percentage
    );
    match &report.score {
        Some(score) => println!(
            "Final grade: {} ({}), completion score {:.1}, on-time score {:.1}",
            score.final_grade, score.description, score.task_completion_score, score.on_time_score
        ),
        None => println!("Not on this training's leaderboard."),
    }

    if report.tasks.is_empty() {
        println!("No tasks in the curriculum for this role.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Day", "Backlog", "User story", "Due", "Completed", "Status"]);
    for task in &report.tasks {
        table.add_row(vec![
            Cell::new(task.day_number),
            Cell::new(&task.backlog),
            Cell::new(&task.user_story),
            Cell::new(task.due_date),
            Cell::new(
                task.completion_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(task.status.label()),
        ]);
    }
    println!("{table}");
}
