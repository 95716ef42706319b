//! Repository for the `progress`, `phoneme_scores`, and `error_counts`
//! tables.

use parla_core::types::DbId;
use sqlx::PgPool;

use crate::models::progress::{ErrorCount, PhonemeHistory, Progress};

/// Column list for `progress` queries.
const COLUMNS: &str =
    "id, user_id, total_conversations, overall_pronunciation_score, created_at, updated_at";

/// Provides aggregate progress tracking per user.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Fetch a user's progress row, creating an empty one on first access.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<Progress, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Atomically bump the lifetime conversation counter, returning the
    /// post-increment row. Creates the progress row on first conversation.
    pub async fn increment_conversation_count(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Progress, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress (user_id, total_conversations) VALUES ($1, 1) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 total_conversations = progress.total_conversations + 1, \
                 updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Progress>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Fold a session score into the running overall mean.
    ///
    /// Single statement, using the already-incremented conversation count
    /// as the divisor, so concurrent sessions cannot lose updates.
    pub async fn update_overall_score(
        pool: &PgPool,
        user_id: DbId,
        session_score: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE progress SET \
                overall_pronunciation_score = CASE \
                    WHEN total_conversations <= 1 THEN $2 \
                    ELSE (overall_pronunciation_score * (total_conversations - 1)::float8 + $2) \
                         / total_conversations::float8 \
                END, \
                updated_at = now() \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(session_score)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append one score to a phoneme's history (append-only).
    pub async fn append_phoneme_score(
        pool: &PgPool,
        user_id: DbId,
        phoneme: &str,
        score: f64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO phoneme_scores (user_id, phoneme, score) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(phoneme)
                .bind(score)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Per-phoneme score history for a user, scores oldest first.
    pub async fn phoneme_history(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PhonemeHistory>, sqlx::Error> {
        sqlx::query_as::<_, PhonemeHistory>(
            "SELECT phoneme, array_agg(score ORDER BY recorded_at, id) AS scores \
             FROM phoneme_scores WHERE user_id = $1 \
             GROUP BY phoneme ORDER BY phoneme",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Additively count an error type against the user.
    pub async fn increment_error_count(
        pool: &PgPool,
        user_id: DbId,
        error_type: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO error_counts (user_id, error_type, occurrences) VALUES ($1, $2, 1) \
             ON CONFLICT (user_id, error_type) DO UPDATE SET \
                 occurrences = error_counts.occurrences + 1",
        )
        .bind(user_id)
        .bind(error_type)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Error-type counts for a user, most frequent first.
    pub async fn error_counts(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ErrorCount>, sqlx::Error> {
        sqlx::query_as::<_, ErrorCount>(
            "SELECT user_id, error_type, occurrences FROM error_counts \
             WHERE user_id = $1 ORDER BY occurrences DESC, error_type",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
