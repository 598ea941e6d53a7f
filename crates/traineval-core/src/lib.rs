//! traineval-core: Scoring engine, leaderboard assembly, and reports.
//!
//! This crate defines the data model, the persistence trait, and the pure
//! scoring logic that turns task-completion records into a ranked leaderboard.

pub mod assessment;
pub mod calendar;
pub mod error;
pub mod leaderboard;
pub mod model;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use error::{ScoringError, StoreError};
pub use traits::RecordStore;
