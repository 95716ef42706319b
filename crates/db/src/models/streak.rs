//! Streak continuity model.

use parla_core::types::{DbId, PracticeDay, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `streaks` table, one per user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Streak {
    pub id: DbId,
    pub user_id: DbId,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_practice_date: Option<PracticeDay>,
    /// Append-only record of practice days.
    pub streak_history: Vec<PracticeDay>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
