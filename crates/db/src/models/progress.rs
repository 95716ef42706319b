//! Aggregate progress models.

use parla_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `progress` table (one per user, created lazily).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Progress {
    pub id: DbId,
    pub user_id: DbId,
    /// Lifetime conversation count; only ever incremented.
    pub total_conversations: i64,
    /// Running mean of session pronunciation scores.
    pub overall_pronunciation_score: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Aggregated per-phoneme score history, oldest score first.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhonemeHistory {
    pub phoneme: String,
    pub scores: Vec<f64>,
}

/// A row from the `error_counts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ErrorCount {
    pub user_id: DbId,
    pub error_type: String,
    pub occurrences: i64,
}
