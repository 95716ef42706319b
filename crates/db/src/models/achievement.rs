//! Achievement award model and DTO.

use parla_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `achievements` table.
///
/// At most one row ever exists per `(user_id, achievement_type)`, enforced
/// by a unique key. Rows are immutable once created and carry the point
/// value granted at award time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Achievement {
    pub id: DbId,
    pub user_id: DbId,
    pub achievement_type: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i64,
    /// Context captured at award time, e.g. the triggering score.
    pub metadata: Option<serde_json::Value>,
    pub earned_at: Timestamp,
}

/// DTO for awarding an achievement.
#[derive(Debug, Clone)]
pub struct NewAchievement {
    pub user_id: DbId,
    pub achievement_type: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: i64,
    pub metadata: Option<serde_json::Value>,
}
