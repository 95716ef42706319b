//! Achievement evaluation and idempotent awarding.

use parla_core::achievements::{self, AchievementRule, RuleFacts, Trigger};
use parla_core::types::DbId;
use parla_db::error::StoreError;
use parla_db::models::achievement::{Achievement, NewAchievement};
use parla_db::store::ProgressStore;

/// Evaluates the achievement rule table and awards what the user unlocked.
pub struct AchievementEngine<'a, S> {
    store: &'a S,
}

impl<'a, S: ProgressStore> AchievementEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Award every satisfied rule the user does not already hold.
    ///
    /// Returns only the achievements newly granted by this call. A rule
    /// whose award already exists resolves to a no-op without a point
    /// grant, so repeated or concurrent triggers cannot double-award.
    pub async fn evaluate(
        &self,
        user_id: DbId,
        facts: &RuleFacts,
    ) -> Result<Vec<Achievement>, StoreError> {
        let mut granted = Vec::new();
        for rule in achievements::satisfied_rules(facts) {
            let outcome = self
                .store
                .award_achievement_if_absent(&new_award(user_id, rule, facts))
                .await?;
            if outcome.created {
                self.store.increment_points(user_id, rule.points).await?;
                tracing::info!(
                    user_id,
                    achievement = rule.achievement_type,
                    points = rule.points,
                    "Achievement awarded",
                );
                granted.push(outcome.achievement);
            }
        }
        Ok(granted)
    }
}

/// Build the award row for a satisfied rule.
fn new_award(user_id: DbId, rule: &AchievementRule, facts: &RuleFacts) -> NewAchievement {
    // The pronunciation rule records its triggering score.
    let metadata = match rule.trigger {
        Trigger::SessionScoreAtLeast(_) => {
            Some(serde_json::json!({ "score": facts.pronunciation_score }))
        }
        _ => None,
    };

    NewAchievement {
        user_id,
        achievement_type: rule.achievement_type.to_string(),
        title: rule.title.to_string(),
        description: rule.description.to_string(),
        icon: rule.icon.to_string(),
        points: rule.points,
        metadata,
    }
}
