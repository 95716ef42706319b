//! Repository for the `achievements` table.

use parla_core::types::DbId;
use sqlx::PgPool;

use crate::models::achievement::{Achievement, NewAchievement};

/// Column list for `achievements` queries.
const COLUMNS: &str =
    "id, user_id, achievement_type, title, description, icon, points, metadata, earned_at";

/// Provides idempotent achievement awarding and lookups.
pub struct AchievementRepo;

impl AchievementRepo {
    /// Atomically insert an award unless one already exists for
    /// `(user_id, achievement_type)`.
    ///
    /// Returns `(true, row)` when this call created the award, or
    /// `(false, existing)` when a prior award made it a no-op. The unique
    /// key resolves concurrent duplicate triggers to a single row.
    pub async fn award_if_absent(
        pool: &PgPool,
        input: &NewAchievement,
    ) -> Result<(bool, Achievement), sqlx::Error> {
        let insert = format!(
            "INSERT INTO achievements \
                 (user_id, achievement_type, title, description, icon, points, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, achievement_type) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Achievement>(&insert)
            .bind(input.user_id)
            .bind(&input.achievement_type)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.icon)
            .bind(input.points)
            .bind(&input.metadata)
            .fetch_optional(pool)
            .await?;

        if let Some(achievement) = created {
            return Ok((true, achievement));
        }

        let select =
            format!("SELECT {COLUMNS} FROM achievements WHERE user_id = $1 AND achievement_type = $2");
        let existing = sqlx::query_as::<_, Achievement>(&select)
            .bind(input.user_id)
            .bind(&input.achievement_type)
            .fetch_one(pool)
            .await?;
        Ok((false, existing))
    }

    /// All awards for a user, most recent first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Achievement>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM achievements WHERE user_id = $1 ORDER BY earned_at DESC");
        sqlx::query_as::<_, Achievement>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
