//! The `traineval assess` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use traineval_core::assessment::daily_assessment;
use traineval_core::calendar::DayIndex;
use traineval_core::model::Role;

use super::{open_store, select_training};

pub async fn execute(
    training_id: Option<Uuid>,
    date: Option<NaiveDate>,
    role: Option<Role>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let Some(training) = select_training(store.as_ref(), training_id).await? else {
        println!("No trainings found. Run `traineval init` to create sample data.");
        return Ok(());
    };
    let date = date.unwrap_or_else(super::today);

    let participants = store.participants_by_training(training.id).await?;
    let catalog = store.master_tasks().await?;
    let ids: Vec<Uuid> = participants.iter().map(|p| p.id).collect();
    let completed = store.completed_tasks_for(&ids).await?;

    let sheet = daily_assessment(&training, &participants, &catalog, &completed, date, role);

    match sheet.day {
        DayIndex::BeforeStart => {
            println!("{date} is before {} starts on {}.", training.name, training.start_date);
            return Ok(());
        }
        DayIndex::Weekend => {
            println!("{date} is a weekend; no tasks are assigned.");
            return Ok(());
        }
        DayIndex::Day(n) => println!("{} on {date}: working day {n}", training.name),
    }

    if sheet.checklists.is_empty() {
        println!("No participants to assess.");
    }
    for checklist in &sheet.checklists {
        let participant = &checklist.participant;
        println!("\n{} ({})", participant.name, participant.role);
        if checklist.tasks.is_empty() {
            println!("  no tasks for this day");
        }
        for assigned in &checklist.tasks {
            let mark = if assigned.completed { "x" } else { " " };
            println!(
                "  [{mark}] {} {}",
                assigned.task.id, assigned.task.user_story
            );
        }
    }

    Ok(())
}
