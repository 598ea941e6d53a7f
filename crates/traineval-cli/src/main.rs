//! traineval CLI: leaderboards, reports and daily assessment for training cohorts.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use traineval_core::model::Role;
use traineval_core::ScoringError;

mod commands;

#[derive(Parser)]
#[command(name = "traineval", version, about = "Training cohort scoring and leaderboards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked leaderboard of a training
    Leaderboard {
        /// Training id (default: the most recently created training)
        #[arg(long)]
        training: Option<Uuid>,

        /// Evaluate as of this date (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show one participant's task-by-task progress
    Report {
        #[arg(long)]
        participant: Uuid,

        #[arg(long)]
        training: Uuid,

        /// Evaluate as of this date (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the tasks due on a date and who has completed them
    Assess {
        /// Training id (default: the most recently created training)
        #[arg(long)]
        training: Option<Uuid>,

        /// Assessment date (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Only show one role: frontend or backend
        #[arg(long)]
        role: Option<Role>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Record a task as completed
    Complete {
        #[arg(long)]
        participant: Uuid,

        #[arg(long)]
        task: Uuid,

        /// Completion date (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Remove a completion record
    Uncomplete {
        #[arg(long)]
        participant: Uuid,

        #[arg(long)]
        task: Uuid,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate and list the scoring rules
    Rules {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and a sample data file
    Init {
        /// Start date of the sample training (default: today, UTC)
        #[arg(long)]
        start: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("traineval=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Leaderboard {
            training,
            today,
            format,
            config,
        } => commands::leaderboard::execute(training, today, format, config).await,
        Commands::Report {
            participant,
            training,
            today,
            format,
            config,
        } => commands::report::execute(participant, training, today, format, config).await,
        Commands::Assess {
            training,
            date,
            role,
            config,
        } => commands::assess::execute(training, date, role, config).await,
        Commands::Complete {
            participant,
            task,
            date,
            config,
        } => commands::complete::execute(participant, task, date, config).await,
        Commands::Uncomplete {
            participant,
            task,
            config,
        } => commands::complete::undo(participant, task, config).await,
        Commands::Rules { config } => commands::rules::execute(config).await,
        Commands::Init { start } => commands::init::execute(start),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ScoringError>() {
            Some(err) if err.is_not_found() => {
                tracing::debug!("{err}");
                eprintln!("Error: data not found");
            }
            _ => eprintln!("Error: {e:#}"),
        }
        process::exit(1);
    }
}
