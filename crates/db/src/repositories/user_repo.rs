//! Repository for the `users` table.

use parla_core::types::{DbId, PracticeDay};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uid, display_name, level, country, total_points, \
                       current_streak, longest_streak, last_practice_date, created_at, updated_at";

/// Provides account operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by external identity.
    pub async fn find_by_uid(pool: &PgPool, uid: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE uid = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(uid)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a user by external identity, creating it with defaults on
    /// first interaction.
    ///
    /// Concurrent first interactions are safe: the insert lands at most
    /// once and every caller gets the surviving row back.
    pub async fn get_or_create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (uid, display_name, level, country) \
             VALUES ($1, COALESCE($2, 'Anonymous'), COALESCE($3, 'beginner'), $4) \
             ON CONFLICT (uid) DO UPDATE SET uid = EXCLUDED.uid \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.uid)
            .bind(&input.display_name)
            .bind(&input.level)
            .bind(&input.country)
            .fetch_one(pool)
            .await
    }

    /// Atomically add points to a user's lifetime total.
    pub async fn increment_points(
        pool: &PgPool,
        id: DbId,
        delta: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET total_points = total_points + $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mirror streak counters onto the user row.
    ///
    /// `GREATEST` keeps the longest-streak invariant intact even when an
    /// out-of-date mirror arrives late.
    pub async fn sync_streak(
        pool: &PgPool,
        id: DbId,
        current: i32,
        longest: i32,
        last_practice: PracticeDay,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET \
                current_streak = $2, \
                longest_streak = GREATEST(longest_streak, $3), \
                last_practice_date = $4, \
                updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(current)
        .bind(longest)
        .bind(last_practice)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Top users by lifetime points, ties broken by earlier signup.
    pub async fn top_by_points(pool: &PgPool, limit: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users ORDER BY total_points DESC, created_at ASC LIMIT $1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of users with strictly more points than `points`.
    pub async fn count_with_more_points(pool: &PgPool, points: i64) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE total_points > $1")
            .bind(points)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
