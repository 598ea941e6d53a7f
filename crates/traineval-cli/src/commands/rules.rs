//! The `traineval rules` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use traineval_core::rules::{
    sorted_conversion_rules, sorted_grade_rules, validate_conversion_rules, validate_grade_rules,
};

use super::open_store;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let store = open_store(config_path.as_deref()).await?;
    let conversions = store.justifications().await?;
    let grades = store.final_justifications().await?;

    println!("Task-count conversion rules ({}):", conversions.len());
    let mut table = Table::new();
    table.set_header(vec!["Role", "Tasks", "Score", "Description"]);
    for rule in sorted_conversion_rules(&conversions) {
        table.add_row(vec![
            Cell::new(rule.role),
            Cell::new(format!("{}..={}", rule.min_tasks, rule.max_tasks)),
            Cell::new(rule.score),
            Cell::new(rule.description),
        ]);
    }
    println!("{table}");

    println!("\nFinal grade rules ({}):", grades.len());
    let mut table = Table::new();
    table.set_header(vec!["Grade", "Description"]);
    for rule in sorted_grade_rules(&grades) {
        table.add_row(vec![
            Cell::new(format!("{}..={}", rule.min_score, rule.max_score)),
            Cell::new(rule.description),
        ]);
    }
    println!("{table}");

    let warnings: Vec<_> = validate_conversion_rules(&conversions)
        .into_iter()
        .chain(validate_grade_rules(&grades))
        .collect();

    if warnings.is_empty() {
        println!("\nAll rules valid.");
    } else {
        println!();
        for w in &warnings {
            let prefix = w
                .role
                .map(|role| format!("[{role}]"))
                .unwrap_or_else(|| "[grades]".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
