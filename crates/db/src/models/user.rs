//! User account model and DTOs.

use parla_core::types::{DbId, PracticeDay, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// `total_points` only ever grows (atomic increments); `longest_streak`
/// never drops below `current_streak`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// External identity issued by the upstream auth layer.
    pub uid: String,
    pub display_name: String,
    /// Self-reported proficiency level (e.g. `"beginner"`).
    pub level: String,
    /// Locale attribute used by the leaderboard country filter.
    pub country: Option<String>,
    pub total_points: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_practice_date: Option<PracticeDay>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for lazily creating a user on first interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub uid: String,
    /// Defaults to `"Anonymous"` when the upstream layer has no name yet.
    pub display_name: Option<String>,
    /// Defaults to `"beginner"`.
    pub level: Option<String>,
    pub country: Option<String>,
}
