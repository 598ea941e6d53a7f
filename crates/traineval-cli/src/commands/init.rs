//! The `traineval init` command.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use traineval_store::Dataset;

const DATA_PATH: &str = "data/traineval.json";

pub fn execute(start: Option<NaiveDate>) -> Result<()> {
    if Path::new("traineval.toml").exists() {
        println!("traineval.toml already exists, skipping.");
    } else {
        std::fs::write("traineval.toml", SAMPLE_CONFIG)?;
        println!("Created traineval.toml");
    }

    let data_path = Path::new(DATA_PATH);
    if data_path.exists() {
        println!("{DATA_PATH} already exists, skipping.");
    } else {
        std::fs::create_dir_all("data")?;
        let start = start.unwrap_or_else(super::today);
        let json = serde_json::to_string_pretty(&Dataset::sample(start))?;
        std::fs::write(data_path, json)
            .with_context(|| format!("failed to write {DATA_PATH}"))?;
        println!("Created {DATA_PATH}");
    }

    println!("\nNext steps:");
    println!("  1. Run: traineval leaderboard");
    println!("  2. Run: traineval assess");
    println!("  3. Switch [store] to type = \"rest\" to use a Supabase project");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# traineval configuration

[store]
type = "file"
path = "data/traineval.json"

# [store]
# type = "rest"
# base_url = "https://your-project.supabase.co"
# api_key = "${SUPABASE_ANON_KEY}"
# upsert_scores = false
# timeout_secs = 30
"#;
