//! The persistence boundary the gamification engine talks to.
//!
//! [`ProgressStore`] keeps the engine generic over its store handle, so
//! tests can inject in-memory doubles and retry policy stays with the
//! caller. The production implementation, [`PgProgressStore`], delegates to
//! the repositories and fails fast with [`StoreError::Timeout`] when an
//! operation exceeds its deadline.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use parla_core::types::{DbId, PracticeDay};

use crate::error::StoreError;
use crate::models::achievement::{Achievement, NewAchievement};
use crate::models::progress::{ErrorCount, PhonemeHistory, Progress};
use crate::models::streak::Streak;
use crate::models::user::{CreateUser, User};
use crate::repositories::{AchievementRepo, ProgressRepo, StreakRepo, UserRepo};
use crate::DbPool;

/// Outcome of an idempotent achievement award.
#[derive(Debug, Clone)]
pub struct AwardOutcome {
    /// Whether this call created the award (as opposed to finding it).
    pub created: bool,
    pub achievement: Achievement,
}

/// Atomic read/update primitives over the persistent progress state.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    // -- users --
    async fn get_or_create_user(&self, input: &CreateUser) -> Result<User, StoreError>;
    async fn find_user(&self, uid: &str) -> Result<Option<User>, StoreError>;
    /// Atomic increment; never read-modify-write.
    async fn increment_points(&self, user_id: DbId, delta: i64) -> Result<bool, StoreError>;
    /// Mirror streak counters onto the user row.
    async fn sync_user_streak(
        &self,
        user_id: DbId,
        current: i32,
        longest: i32,
        last_practice: PracticeDay,
    ) -> Result<bool, StoreError>;
    async fn top_users_by_points(&self, limit: i64) -> Result<Vec<User>, StoreError>;
    async fn count_users_with_more_points(&self, points: i64) -> Result<i64, StoreError>;

    // -- progress --
    async fn get_or_create_progress(&self, user_id: DbId) -> Result<Progress, StoreError>;
    /// Atomic increment returning the post-increment row.
    async fn increment_conversation_count(&self, user_id: DbId) -> Result<Progress, StoreError>;
    async fn update_overall_score(
        &self,
        user_id: DbId,
        session_score: f64,
    ) -> Result<bool, StoreError>;
    async fn append_phoneme_score(
        &self,
        user_id: DbId,
        phoneme: &str,
        score: f64,
    ) -> Result<bool, StoreError>;
    async fn phoneme_history(&self, user_id: DbId) -> Result<Vec<PhonemeHistory>, StoreError>;
    async fn increment_error_count(
        &self,
        user_id: DbId,
        error_type: &str,
    ) -> Result<bool, StoreError>;
    async fn error_counts(&self, user_id: DbId) -> Result<Vec<ErrorCount>, StoreError>;

    // -- achievements --
    /// Atomic insert-if-absent on `(user_id, achievement_type)`.
    async fn award_achievement_if_absent(
        &self,
        input: &NewAchievement,
    ) -> Result<AwardOutcome, StoreError>;
    async fn achievements_for_user(&self, user_id: DbId) -> Result<Vec<Achievement>, StoreError>;

    // -- streaks --
    async fn get_streak(&self, user_id: DbId) -> Result<Option<Streak>, StoreError>;
    /// First-practice record; `None` when a concurrent writer created it.
    async fn create_streak(
        &self,
        user_id: DbId,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError>;
    /// CAS-guarded extension; `None` on a miss.
    async fn advance_streak(
        &self,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError>;
    /// CAS-guarded reset; `None` on a miss.
    async fn reset_streak(
        &self,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError>;
}

/// Postgres-backed [`ProgressStore`].
#[derive(Clone)]
pub struct PgProgressStore {
    pool: DbPool,
    /// Per-operation deadline. Operations that exceed it fail fast; callers
    /// decide whether to retry.
    op_timeout: Duration,
}

impl PgProgressStore {
    pub fn new(pool: DbPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    async fn deadline<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(timeout = ?self.op_timeout, "Store operation exceeded deadline");
                Err(StoreError::Timeout(self.op_timeout))
            }
        }
    }
}

#[async_trait]
impl ProgressStore for PgProgressStore {
    async fn get_or_create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        self.deadline(UserRepo::get_or_create(&self.pool, input)).await
    }

    async fn find_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
        self.deadline(UserRepo::find_by_uid(&self.pool, uid)).await
    }

    async fn increment_points(&self, user_id: DbId, delta: i64) -> Result<bool, StoreError> {
        self.deadline(UserRepo::increment_points(&self.pool, user_id, delta))
            .await
    }

    async fn sync_user_streak(
        &self,
        user_id: DbId,
        current: i32,
        longest: i32,
        last_practice: PracticeDay,
    ) -> Result<bool, StoreError> {
        self.deadline(UserRepo::sync_streak(
            &self.pool,
            user_id,
            current,
            longest,
            last_practice,
        ))
        .await
    }

    async fn top_users_by_points(&self, limit: i64) -> Result<Vec<User>, StoreError> {
        self.deadline(UserRepo::top_by_points(&self.pool, limit)).await
    }

    async fn count_users_with_more_points(&self, points: i64) -> Result<i64, StoreError> {
        self.deadline(UserRepo::count_with_more_points(&self.pool, points))
            .await
    }

    async fn get_or_create_progress(&self, user_id: DbId) -> Result<Progress, StoreError> {
        self.deadline(ProgressRepo::get_or_create(&self.pool, user_id))
            .await
    }

    async fn increment_conversation_count(&self, user_id: DbId) -> Result<Progress, StoreError> {
        self.deadline(ProgressRepo::increment_conversation_count(&self.pool, user_id))
            .await
    }

    async fn update_overall_score(
        &self,
        user_id: DbId,
        session_score: f64,
    ) -> Result<bool, StoreError> {
        self.deadline(ProgressRepo::update_overall_score(
            &self.pool,
            user_id,
            session_score,
        ))
        .await
    }

    async fn append_phoneme_score(
        &self,
        user_id: DbId,
        phoneme: &str,
        score: f64,
    ) -> Result<bool, StoreError> {
        self.deadline(ProgressRepo::append_phoneme_score(
            &self.pool, user_id, phoneme, score,
        ))
        .await
    }

    async fn phoneme_history(&self, user_id: DbId) -> Result<Vec<PhonemeHistory>, StoreError> {
        self.deadline(ProgressRepo::phoneme_history(&self.pool, user_id))
            .await
    }

    async fn increment_error_count(
        &self,
        user_id: DbId,
        error_type: &str,
    ) -> Result<bool, StoreError> {
        self.deadline(ProgressRepo::increment_error_count(
            &self.pool, user_id, error_type,
        ))
        .await
    }

    async fn error_counts(&self, user_id: DbId) -> Result<Vec<ErrorCount>, StoreError> {
        self.deadline(ProgressRepo::error_counts(&self.pool, user_id))
            .await
    }

    async fn award_achievement_if_absent(
        &self,
        input: &NewAchievement,
    ) -> Result<AwardOutcome, StoreError> {
        let (created, achievement) = self
            .deadline(AchievementRepo::award_if_absent(&self.pool, input))
            .await?;
        Ok(AwardOutcome {
            created,
            achievement,
        })
    }

    async fn achievements_for_user(&self, user_id: DbId) -> Result<Vec<Achievement>, StoreError> {
        self.deadline(AchievementRepo::list_for_user(&self.pool, user_id))
            .await
    }

    async fn get_streak(&self, user_id: DbId) -> Result<Option<Streak>, StoreError> {
        self.deadline(StreakRepo::get(&self.pool, user_id)).await
    }

    async fn create_streak(
        &self,
        user_id: DbId,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError> {
        self.deadline(StreakRepo::create_first(&self.pool, user_id, today))
            .await
    }

    async fn advance_streak(
        &self,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError> {
        self.deadline(StreakRepo::advance(&self.pool, user_id, expected_last, today))
            .await
    }

    async fn reset_streak(
        &self,
        user_id: DbId,
        expected_last: Option<PracticeDay>,
        today: PracticeDay,
    ) -> Result<Option<Streak>, StoreError> {
        self.deadline(StreakRepo::reset(&self.pool, user_id, expected_last, today))
            .await
    }
}
