//! Point award for a completed conversation.

/// Points granted for completing any conversation.
const BASE_POINTS: i64 = 5;

/// Cap on the error penalty.
const MAX_ERROR_PENALTY: i64 = 5;

/// Cap on the duration bonus.
const MAX_DURATION_BONUS: i64 = 10;

/// Seconds of practice per duration bonus point.
const SECONDS_PER_BONUS_POINT: f64 = 30.0;

/// Points earned from a single conversation.
///
/// Base points plus one bonus point per ten score points, minus one penalty
/// point per error (capped), plus one bonus point per half minute (capped).
/// Never less than 1.
pub fn conversation_points(
    pronunciation_score: f64,
    error_count: u32,
    session_duration_seconds: f64,
) -> i64 {
    let pronunciation_bonus = (pronunciation_score / 10.0).floor() as i64;
    let error_penalty = i64::from(error_count).min(MAX_ERROR_PENALTY);
    let duration_bonus = ((session_duration_seconds / SECONDS_PER_BONUS_POINT).floor() as i64)
        .min(MAX_DURATION_BONUS);

    (BASE_POINTS + pronunciation_bonus - error_penalty + duration_bonus).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example() {
        // 5 base + 8 pronunciation - 0 errors + 3 duration.
        assert_eq!(conversation_points(85.0, 0, 90.0), 16);
    }

    #[test]
    fn first_conversation_example() {
        // 5 base + 9 pronunciation - 0 errors + 1 duration.
        assert_eq!(conversation_points(92.0, 0, 40.0), 15);
    }

    #[test]
    fn never_below_one() {
        assert_eq!(conversation_points(0.0, 5, 0.0), 1);
        assert_eq!(conversation_points(0.0, 100, 0.0), 1);
    }

    #[test]
    fn error_penalty_is_capped() {
        assert_eq!(
            conversation_points(80.0, 5, 0.0),
            conversation_points(80.0, 50, 0.0)
        );
    }

    #[test]
    fn duration_bonus_is_capped() {
        assert_eq!(
            conversation_points(80.0, 0, 300.0),
            conversation_points(80.0, 0, 3_000.0)
        );
    }

    #[test]
    fn monotonic_in_score() {
        assert!(conversation_points(90.0, 2, 60.0) >= conversation_points(50.0, 2, 60.0));
    }

    #[test]
    fn monotonic_in_duration() {
        assert!(conversation_points(70.0, 2, 120.0) >= conversation_points(70.0, 2, 30.0));
    }

    #[test]
    fn non_increasing_in_errors() {
        assert!(conversation_points(70.0, 4, 60.0) <= conversation_points(70.0, 1, 60.0));
    }
}
