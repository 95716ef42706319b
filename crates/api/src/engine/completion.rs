//! Conversation-completion pipeline.
//!
//! Pure scoring runs first (no I/O), then the store commits land through
//! atomic increments, then the streak update, then achievement evaluation
//! against the post-update counters. Leaderboard queries are on demand and
//! not part of this pipeline.

use parla_core::achievements::RuleFacts;
use parla_core::points;
use parla_core::pronunciation::{self, WordConfidence};
use parla_core::types::PracticeDay;
use parla_db::error::StoreError;
use parla_db::models::achievement::Achievement;
use parla_db::models::user::CreateUser;
use parla_db::store::ProgressStore;
use serde::Serialize;

use super::awards::AchievementEngine;
use super::streaks::{StreakTracker, StreakUpdate};

/// Upstream collaborators' outputs for one finished conversation.
#[derive(Debug, Clone)]
pub struct CompletedConversation {
    pub uid: String,
    /// Used when the user is lazily created on first interaction.
    pub display_name: Option<String>,
    pub word_confidences: Vec<WordConfidence>,
    pub error_count: u32,
    pub session_duration_seconds: f64,
    /// Error types from the upstream grammar analysis, for common-error
    /// tracking. May be empty even when `error_count` is not.
    pub error_types: Vec<String>,
}

/// Pronunciation block of the completion outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PronunciationReport {
    pub score: f64,
    pub feedback: String,
    pub problematic_phonemes: Vec<String>,
}

/// Everything the presentation layer needs about one completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub pronunciation: PronunciationReport,
    pub points_awarded: i64,
    pub streak: StreakUpdate,
    pub achievements_awarded: Vec<Achievement>,
}

/// Runs the completion pipeline for incoming conversations.
pub struct CompletionEngine<'a, S> {
    store: &'a S,
}

impl<'a, S: ProgressStore> CompletionEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Process one completed conversation as of `today`.
    pub async fn complete(
        &self,
        conversation: &CompletedConversation,
        today: PracticeDay,
    ) -> Result<CompletionOutcome, StoreError> {
        let score = pronunciation::score(&conversation.word_confidences);
        let phonemes = pronunciation::problematic_phonemes(
            &conversation.word_confidences,
            pronunciation::DEFAULT_PHONEME_THRESHOLD,
        );
        let feedback = pronunciation::feedback(score, &phonemes);
        let points_awarded = points::conversation_points(
            score,
            conversation.error_count,
            conversation.session_duration_seconds,
        );

        let user = self
            .store
            .get_or_create_user(&CreateUser {
                uid: conversation.uid.clone(),
                display_name: conversation.display_name.clone(),
                level: None,
                country: None,
            })
            .await?;

        let progress = self.store.increment_conversation_count(user.id).await?;
        self.store.update_overall_score(user.id, score).await?;
        for phoneme in &phonemes {
            self.store.append_phoneme_score(user.id, phoneme, score).await?;
        }
        for error_type in &conversation.error_types {
            self.store.increment_error_count(user.id, error_type).await?;
        }
        self.store.increment_points(user.id, points_awarded).await?;

        let streak = StreakTracker::new(self.store)
            .record_practice(user.id, today)
            .await?;

        let facts = RuleFacts {
            total_conversations: progress.total_conversations,
            pronunciation_score: score,
            error_count: conversation.error_count,
            current_streak: streak.current_streak,
        };
        let achievements_awarded = AchievementEngine::new(self.store)
            .evaluate(user.id, &facts)
            .await?;

        tracing::info!(
            uid = %conversation.uid,
            score,
            points = points_awarded,
            current_streak = streak.current_streak,
            new_achievements = achievements_awarded.len(),
            "Conversation completed",
        );

        Ok(CompletionOutcome {
            pronunciation: PronunciationReport {
                score,
                feedback,
                problematic_phonemes: phonemes,
            },
            points_awarded,
            streak,
            achievements_awarded,
        })
    }
}
