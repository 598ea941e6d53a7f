//! Dashboard summary statistics over a ranked leaderboard.

use serde::{Deserialize, Serialize};

use crate::model::LeaderboardEntry;
use crate::scoring::round_half_up;

/// Headline numbers shown above a leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub participant_count: usize,
    /// Mean final grade, rounded half up; 0 for an empty board.
    pub average_grade: i64,
    /// First entry of the ranked board.
    pub top_performer: Option<LeaderboardEntry>,
}

/// Summarize an already sorted leaderboard.
pub fn leaderboard_stats(entries: &[LeaderboardEntry]) -> LeaderboardStats {
    let average_grade = if entries.is_empty() {
        0
    } else {
        let sum: i64 = entries.iter().map(|e| e.final_grade).sum();
        round_half_up(sum as f64 / entries.len() as f64)
    };

    LeaderboardStats {
        participant_count: entries.len(),
        average_grade,
        top_performer: entries.first().cloned(),
    }
}
