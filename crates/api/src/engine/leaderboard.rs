//! Leaderboard ranking over lifetime point totals.

use parla_core::types::DbId;
use parla_db::error::StoreError;
use parla_db::models::user::User;
use parla_db::store::ProgressStore;
use serde::Serialize;

/// Derived leaderboard view row; computed on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: DbId,
    pub display_name: String,
    pub total_points: i64,
    pub current_streak: i32,
    pub rank: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Computes leaderboard views against current point totals.
pub struct LeaderboardRanker<'a, S> {
    store: &'a S,
}

impl<'a, S: ProgressStore> LeaderboardRanker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// A user's global rank: one more than the number of users with
    /// strictly greater point totals. Tied users share a rank and the
    /// ranks that follow have gaps.
    pub async fn rank(&self, user: &User) -> Result<i64, StoreError> {
        Ok(self
            .store
            .count_users_with_more_points(user.total_points)
            .await?
            + 1)
    }

    /// Top users by points with sequential ranks assigned after sorting.
    ///
    /// The country filter runs after rank assignment, so a filtered view
    /// keeps its global rank numbers rather than renumbering from 1.
    pub async fn top(
        &self,
        limit: i64,
        country: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let users = self.store.top_users_by_points(limit).await?;

        let mut entries: Vec<LeaderboardEntry> = users
            .into_iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry {
                user_id: user.id,
                display_name: user.display_name,
                total_points: user.total_points,
                current_streak: user.current_streak,
                rank: i as i64 + 1,
                country: user.country,
            })
            .collect();

        if let Some(country) = country {
            entries.retain(|entry| entry.country.as_deref() == Some(country));
        }

        Ok(entries)
    }
}
