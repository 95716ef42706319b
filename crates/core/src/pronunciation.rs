//! Pronunciation quality scoring from recognizer word confidences.
//!
//! Converts the per-word confidence data reported by the upstream speech
//! recognizer into a 0-100 session score, a set of problematic phoneme
//! categories, and learner-facing feedback text. Phoneme categories are
//! coarse difficulty buckets keyed by trigger words, not true phonetic
//! transcription.

use serde::{Deserialize, Serialize};

/// A single transcribed word with its recognizer confidence in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordConfidence {
    pub word: String,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Session score reported when no word confidences are available.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Confidence below which a word counts as mispronounced.
pub const DEFAULT_PHONEME_THRESHOLD: f64 = 0.7;

/// How many flagged phoneme categories the feedback text names.
const MAX_PHONEMES_IN_FEEDBACK: usize = 3;

/// Phoneme categories that commonly trouble learners, keyed by trigger
/// words. A category is flagged when a low-confidence word contains any of
/// its triggers as a substring.
pub const PHONEME_PATTERNS: &[(&str, &[&str])] = &[
    (
        "th",
        &["the", "that", "this", "think", "three", "mother", "father"],
    ),
    ("r", &["red", "right", "very", "carry", "area"]),
    ("l", &["light", "little", "tell", "people"]),
    ("v", &["very", "have", "voice", "every"]),
    ("w", &["when", "where", "what", "which"]),
    ("ch", &["check", "church", "teacher", "much"]),
    ("sh", &["she", "should", "fish", "wash"]),
];

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Overall session score in `[0, 100]`: the mean word confidence scaled to
/// 100 and rounded to two decimals. An empty session scores [`NEUTRAL_SCORE`].
pub fn score(word_confidences: &[WordConfidence]) -> f64 {
    if word_confidences.is_empty() {
        return NEUTRAL_SCORE;
    }
    let confidences: Vec<f64> = word_confidences.iter().map(|wc| wc.confidence).collect();
    round2(mean(&confidences) * 100.0)
}

/// Phoneme categories the learner struggled with this session.
///
/// Only words strictly below `threshold` contribute; a word at or above it
/// never flags a category regardless of content. The result is
/// deduplicated, in rule-table order.
pub fn problematic_phonemes(word_confidences: &[WordConfidence], threshold: f64) -> Vec<String> {
    let mut flagged: Vec<String> = Vec::new();
    for wc in word_confidences {
        if wc.confidence >= threshold {
            continue;
        }
        let lower = wc.word.to_lowercase();
        for (phoneme, triggers) in PHONEME_PATTERNS {
            if triggers.iter().any(|t| lower.contains(t)) && !flagged.iter().any(|f| f == phoneme)
            {
                flagged.push((*phoneme).to_string());
            }
        }
    }
    flagged
}

/// Practice words for one phoneme category. Unknown categories get an
/// empty list.
pub fn practice_words(phoneme: &str) -> &'static [&'static str] {
    PHONEME_PATTERNS
        .iter()
        .find(|(p, _)| *p == phoneme)
        .map_or(&[], |(_, words)| *words)
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Learner-facing feedback: a score-banded message plus, when phonemes were
/// flagged, a clause naming the first few categories.
pub fn feedback(score: f64, problematic: &[String]) -> String {
    let banded = if score >= 90.0 {
        "Excellent pronunciation! 🌟"
    } else if score >= 75.0 {
        "Great job! Your pronunciation is clear."
    } else if score >= 60.0 {
        "Good effort! Let's work on clarity."
    } else {
        "Keep practicing! Pronunciation takes time."
    };

    if problematic.is_empty() {
        return banded.to_string();
    }

    let named: Vec<String> = problematic
        .iter()
        .take(MAX_PHONEMES_IN_FEEDBACK)
        .map(|p| format!("'{p}'"))
        .collect();
    format!("{banded} Focus on improving: {} sounds.", named.join(", "))
}

/// Percentage change of the recent mean score against the historical mean,
/// rounded to one decimal. Negative when scores declined. Returns `0.0`
/// when either window is empty or the historical mean is zero.
pub fn improvement(historical: &[f64], recent: &[f64]) -> f64 {
    if historical.is_empty() || recent.is_empty() {
        return 0.0;
    }
    let historical_avg = mean(historical);
    if historical_avg == 0.0 {
        return 0.0;
    }
    round1((mean(recent) - historical_avg) / historical_avg * 100.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
