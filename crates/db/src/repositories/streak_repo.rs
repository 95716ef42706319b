//! Repository for the `streaks` table.
//!
//! Counter-changing writes are compare-and-swap guarded on
//! `last_practice_date`, so two near-simultaneous completions on a day
//! boundary cannot interleave a read-then-write on the same row. A `None`
//! return from [`StreakRepo::advance`] or [`StreakRepo::reset`] is a CAS
//! miss: another writer already stamped today.

use parla_core::types::{DbId, PracticeDay};
use sqlx::PgPool;

use crate::models::streak::Streak;

/// Column list for `streaks` queries.
const COLUMNS: &str = "id, user_id, current_streak, longest_streak, last_practice_date, \
                       streak_history, created_at, updated_at";

/// Provides streak continuity state per user.
pub struct StreakRepo;

impl StreakRepo {
    /// Fetch a user's streak record, if one exists.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM streaks WHERE user_id = $1");
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the first streak record for a user.
    ///
    /// Returns `None` when a concurrent first practice already created it.
    pub async fn create_first(
        pool: &PgPool,
        user_id: DbId,
        today: PracticeDay,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "INSERT INTO streaks \
                 (user_id, current_streak, longest_streak, last_practice_date, streak_history) \
             VALUES ($1, 1, 1, $2, ARRAY[$2]::date[]) \
             ON CONFLICT (user_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .bind(today)
            .fetch_optional(pool)
            .await
    }

    /// Extend the streak by one day, guarded on the expected last practice
    /// date.
    pub async fn advance(
        pool: &PgPool,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "UPDATE streaks SET \
                current_streak = current_streak + 1, \
                longest_streak = GREATEST(longest_streak, current_streak + 1), \
                last_practice_date = $3, \
                streak_history = array_append(streak_history, $3), \
                updated_at = now() \
             WHERE user_id = $1 AND last_practice_date IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .bind(expected_last)
            .bind(today)
            .fetch_optional(pool)
            .await
    }

    /// Reset the streak to one after a gap; `longest_streak` is untouched.
    pub async fn reset(
        pool: &PgPool,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, sqlx::Error> {
        let query = format!(
            "UPDATE streaks SET \
                current_streak = 1, \
                last_practice_date = $3, \
                streak_history = array_append(streak_history, $3), \
                updated_at = now() \
             WHERE user_id = $1 AND last_practice_date IS NOT DISTINCT FROM $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Streak>(&query)
            .bind(user_id)
            .bind(expected_last)
            .bind(today)
            .fetch_optional(pool)
            .await
    }
}
