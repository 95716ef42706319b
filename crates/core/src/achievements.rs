//! One-time achievement rules evaluated after each completed conversation.
//!
//! The rule table is plain data so evaluation order and within-group
//! exclusivity stay visible and testable. Rules fire against the counters
//! as they stand *after* the current conversation has been committed.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Rule inputs
// ---------------------------------------------------------------------------

/// Counter snapshot a conversation leaves behind, used as rule input.
#[derive(Debug, Clone, Copy)]
pub struct RuleFacts {
    /// Lifetime conversation count, including the current conversation.
    pub total_conversations: i64,
    /// This session's pronunciation score.
    pub pronunciation_score: f64,
    /// This session's error count.
    pub error_count: u32,
    /// Current streak length after the streak update.
    pub current_streak: i32,
}

/// Condition under which a rule fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Lifetime conversation count equals this value exactly.
    ConversationsExactly(i64),
    /// Session pronunciation score is at least this value.
    SessionScoreAtLeast(f64),
    /// Session had zero errors.
    ErrorFree,
    /// Current streak equals this many days exactly.
    StreakExactly(i32),
}

impl Trigger {
    fn satisfied(self, facts: &RuleFacts) -> bool {
        match self {
            Trigger::ConversationsExactly(n) => facts.total_conversations == n,
            Trigger::SessionScoreAtLeast(s) => facts.pronunciation_score >= s,
            Trigger::ErrorFree => facts.error_count == 0,
            Trigger::StreakExactly(d) => facts.current_streak == d,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// A single achievement definition.
#[derive(Debug, Serialize)]
pub struct AchievementRule {
    #[serde(rename = "type")]
    pub achievement_type: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub points: i64,
    #[serde(skip)]
    pub trigger: Trigger,
}

/// The full rule table, in evaluation order.
///
/// Each inner slice is an exclusivity group: within a group at most one
/// rule fires per event (the first whose trigger is satisfied), so a
/// single conversation cannot land both the 10- and 50-conversation
/// milestones, or both streak milestones.
pub const RULE_GROUPS: &[&[AchievementRule]] = &[
    &[AchievementRule {
        achievement_type: "first_conversation",
        title: "First Steps",
        description: "Completed your first conversation",
        icon: "🎯",
        points: 10,
        trigger: Trigger::ConversationsExactly(1),
    }],
    &[
        AchievementRule {
            achievement_type: "ten_conversations",
            title: "Conversationalist",
            description: "Completed 10 conversations",
            icon: "💬",
            points: 40,
            trigger: Trigger::ConversationsExactly(10),
        },
        AchievementRule {
            achievement_type: "fifty_conversations",
            title: "Language Enthusiast",
            description: "Completed 50 conversations",
            icon: "🌟",
            points: 100,
            trigger: Trigger::ConversationsExactly(50),
        },
        AchievementRule {
            achievement_type: "hundred_conversations",
            title: "Language Expert",
            description: "Completed 100 conversations",
            icon: "🏆",
            points: 250,
            trigger: Trigger::ConversationsExactly(100),
        },
    ],
    &[AchievementRule {
        achievement_type: "pronunciation_master",
        title: "Pronunciation Master",
        description: "Achieved 90+ pronunciation score",
        icon: "🎤",
        points: 30,
        trigger: Trigger::SessionScoreAtLeast(90.0),
    }],
    &[AchievementRule {
        achievement_type: "error_free",
        title: "Perfect Practice",
        description: "Completed a conversation with no errors",
        icon: "💎",
        points: 25,
        trigger: Trigger::ErrorFree,
    }],
    &[
        AchievementRule {
            achievement_type: "week_streak",
            title: "Week Warrior",
            description: "Practiced for 7 days in a row",
            icon: "🔥",
            points: 50,
            trigger: Trigger::StreakExactly(7),
        },
        AchievementRule {
            achievement_type: "month_streak",
            title: "Monthly Master",
            description: "Practiced for 30 days in a row",
            icon: "⭐",
            points: 200,
            trigger: Trigger::StreakExactly(30),
        },
    ],
];

/// All rules in table order, groups flattened.
pub fn all_rules() -> impl Iterator<Item = &'static AchievementRule> {
    RULE_GROUPS.iter().flat_map(|group| group.iter())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate the rule table against post-update counters.
///
/// Groups are evaluated in table order; within a group only the first
/// satisfied rule fires.
pub fn satisfied_rules(facts: &RuleFacts) -> Vec<&'static AchievementRule> {
    RULE_GROUPS
        .iter()
        .filter_map(|group| group.iter().find(|rule| rule.trigger.satisfied(facts)))
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the built-in rule table. Run once at startup; a bad table is a
/// configuration error, not a per-request condition.
pub fn validate_rule_table() -> Result<(), CoreError> {
    validate_rules(all_rules())
}

/// Validate a set of rules: point values must be non-negative, score
/// thresholds finite, and achievement types unique.
pub fn validate_rules<'a>(
    rules: impl Iterator<Item = &'a AchievementRule>,
) -> Result<(), CoreError> {
    let mut seen: Vec<&str> = Vec::new();
    for rule in rules {
        if rule.points < 0 {
            return Err(CoreError::Config(format!(
                "achievement '{}' has negative points ({})",
                rule.achievement_type, rule.points
            )));
        }
        if let Trigger::SessionScoreAtLeast(threshold) = rule.trigger {
            if !threshold.is_finite() {
                return Err(CoreError::Config(format!(
                    "achievement '{}' has a non-finite score threshold",
                    rule.achievement_type
                )));
            }
        }
        if seen.contains(&rule.achievement_type) {
            return Err(CoreError::Config(format!(
                "duplicate achievement type '{}'",
                rule.achievement_type
            )));
        }
        seen.push(rule.achievement_type);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(conversations: i64, score: f64, errors: u32, streak: i32) -> RuleFacts {
        RuleFacts {
            total_conversations: conversations,
            pronunciation_score: score,
            error_count: errors,
            current_streak: streak,
        }
    }

    fn types(rules: &[&AchievementRule]) -> Vec<&'static str> {
        rules.iter().map(|r| r.achievement_type).collect()
    }

    #[test]
    fn first_conversation_fires_on_exactly_one() {
        let hit = satisfied_rules(&facts(1, 50.0, 3, 1));
        assert_eq!(types(&hit), vec!["first_conversation"]);
    }

    #[test]
    fn second_conversation_fires_nothing() {
        assert!(satisfied_rules(&facts(2, 50.0, 3, 1)).is_empty());
    }

    #[test]
    fn milestone_group_is_exclusive() {
        let hit = satisfied_rules(&facts(10, 50.0, 3, 2));
        assert_eq!(types(&hit), vec!["ten_conversations"]);

        let hit = satisfied_rules(&facts(50, 50.0, 3, 2));
        assert_eq!(types(&hit), vec!["fifty_conversations"]);

        let hit = satisfied_rules(&facts(100, 50.0, 3, 2));
        assert_eq!(types(&hit), vec!["hundred_conversations"]);
    }

    #[test]
    fn streak_group_is_exclusive() {
        let hit = satisfied_rules(&facts(5, 50.0, 3, 7));
        assert_eq!(types(&hit), vec!["week_streak"]);

        let hit = satisfied_rules(&facts(5, 50.0, 3, 30));
        assert_eq!(types(&hit), vec!["month_streak"]);

        assert!(satisfied_rules(&facts(5, 50.0, 3, 29)).is_empty());
    }

    #[test]
    fn score_and_error_rules_stack() {
        let hit = satisfied_rules(&facts(2, 95.0, 0, 2));
        assert_eq!(types(&hit), vec!["pronunciation_master", "error_free"]);
    }

    #[test]
    fn pronunciation_master_at_exact_threshold() {
        let hit = satisfied_rules(&facts(2, 90.0, 1, 2));
        assert_eq!(types(&hit), vec!["pronunciation_master"]);
    }

    #[test]
    fn first_conversation_stacks_with_session_rules() {
        let hit = satisfied_rules(&facts(1, 92.0, 0, 1));
        assert_eq!(
            types(&hit),
            vec!["first_conversation", "pronunciation_master", "error_free"]
        );
    }

    #[test]
    fn builtin_table_is_valid() {
        assert!(validate_rule_table().is_ok());
    }

    #[test]
    fn negative_points_rejected() {
        let bad = [AchievementRule {
            achievement_type: "bad",
            title: "Bad",
            description: "Bad",
            icon: "x",
            points: -1,
            trigger: Trigger::ErrorFree,
        }];
        assert!(validate_rules(bad.iter()).is_err());
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let bad = [AchievementRule {
            achievement_type: "bad",
            title: "Bad",
            description: "Bad",
            icon: "x",
            points: 1,
            trigger: Trigger::SessionScoreAtLeast(f64::NAN),
        }];
        assert!(validate_rules(bad.iter()).is_err());
    }

    #[test]
    fn duplicate_types_rejected() {
        let bad = [
            AchievementRule {
                achievement_type: "dup",
                title: "A",
                description: "A",
                icon: "x",
                points: 1,
                trigger: Trigger::ErrorFree,
            },
            AchievementRule {
                achievement_type: "dup",
                title: "B",
                description: "B",
                icon: "x",
                points: 2,
                trigger: Trigger::ErrorFree,
            },
        ];
        assert!(validate_rules(bad.iter()).is_err());
    }
}
