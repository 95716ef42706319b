//! Daily-practice streak tracking over the store.

use parla_core::streak::{self, StreakDay};
use parla_core::types::{DbId, PracticeDay};
use parla_db::error::StoreError;
use parla_db::models::streak::Streak;
use parla_db::store::ProgressStore;
use serde::Serialize;

/// Result of recording a practice day.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreakUpdate {
    pub current_streak: i32,
    pub longest_streak: i32,
    /// `false` only when a gap broke the streak.
    pub streak_maintained: bool,
}

/// Maintains per-user practice continuity.
pub struct StreakTracker<'a, S> {
    store: &'a S,
}

impl<'a, S: ProgressStore> StreakTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record a practice event for `today`, updating streak counters and
    /// mirroring them onto the user row.
    ///
    /// Counter-changing writes are CAS-guarded on the stored
    /// `last_practice_date`. A miss means a concurrent same-day event won
    /// the write, so one re-read settles the outcome (the re-classification
    /// lands in `PracticedToday`) instead of looping.
    pub async fn record_practice(
        &self,
        user_id: DbId,
        today: PracticeDay,
    ) -> Result<StreakUpdate, StoreError> {
        for _ in 0..2 {
            let Some(stored) = self.store.get_streak(user_id).await? else {
                match self.store.create_streak(user_id, today).await? {
                    Some(first) => {
                        self.mirror(user_id, &first).await?;
                        return Ok(StreakUpdate {
                            current_streak: first.current_streak,
                            longest_streak: first.longest_streak,
                            streak_maintained: true,
                        });
                    }
                    // Lost the first-practice race; reload and classify.
                    None => continue,
                }
            };

            match streak::classify(stored.last_practice_date, today) {
                StreakDay::NoHistory | StreakDay::PracticedToday => {
                    return Ok(StreakUpdate {
                        current_streak: stored.current_streak,
                        longest_streak: stored.longest_streak,
                        streak_maintained: true,
                    });
                }
                StreakDay::ConsecutiveDay => {
                    if let Some(updated) = self
                        .store
                        .advance_streak(user_id, stored.last_practice_date, today)
                        .await?
                    {
                        self.mirror(user_id, &updated).await?;
                        return Ok(StreakUpdate {
                            current_streak: updated.current_streak,
                            longest_streak: updated.longest_streak,
                            streak_maintained: true,
                        });
                    }
                }
                StreakDay::StreakBroken => {
                    if let Some(updated) = self
                        .store
                        .reset_streak(user_id, stored.last_practice_date, today)
                        .await?
                    {
                        self.mirror(user_id, &updated).await?;
                        return Ok(StreakUpdate {
                            current_streak: updated.current_streak,
                            longest_streak: updated.longest_streak,
                            streak_maintained: false,
                        });
                    }
                }
            }
        }

        // Two CAS misses in a row: settle on whatever is stored now.
        let stored = self.store.get_streak(user_id).await?;
        Ok(match stored {
            Some(s) => StreakUpdate {
                current_streak: s.current_streak,
                longest_streak: s.longest_streak,
                streak_maintained: true,
            },
            None => StreakUpdate {
                current_streak: 1,
                longest_streak: 1,
                streak_maintained: true,
            },
        })
    }

    async fn mirror(&self, user_id: DbId, streak: &Streak) -> Result<(), StoreError> {
        if let Some(last) = streak.last_practice_date {
            self.store
                .sync_user_streak(user_id, streak.current_streak, streak.longest_streak, last)
                .await?;
        }
        Ok(())
    }
}
