pub mod assess;
pub mod complete;
pub mod init;
pub mod leaderboard;
pub mod report;
pub mod rules;

use std::path::Path;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use traineval_core::leaderboard::latest_training;
use traineval_core::model::Training;
use traineval_core::{RecordStore, ScoringError};
use traineval_store::{create_store, load_config_from};

/// Load the config and open its store.
pub async fn open_store(config_path: Option<&Path>) -> Result<Box<dyn RecordStore>> {
    let config = load_config_from(config_path)?;
    create_store(&config.store).await
}

/// The requested training, or the latest one when none was named.
///
/// An explicit id that does not exist is an error; an empty store without
/// an explicit id is not.
pub async fn select_training(store: &dyn RecordStore, id: Option<Uuid>) -> Result<Option<Training>> {
    match id {
        Some(id) => {
            let training = store
                .training(id)
                .await?
                .ok_or_else(|| ScoringError::not_found("training", id))?;
            Ok(Some(training))
        }
        None => {
            let trainings = store.trainings().await?;
            Ok(latest_training(&trainings).cloned())
        }
    }
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
