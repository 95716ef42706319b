//! Route definitions for stats, leaderboard, and the achievement catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::gamification;
use crate::state::AppState;

/// Routes mounted at `/gamification`.
///
/// ```text
/// GET  /stats                       -> get_stats
/// GET  /leaderboard                 -> get_leaderboard
/// GET  /achievements                -> list_achievement_catalog
/// GET  /practice-words/{phoneme}    -> get_practice_words
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(gamification::get_stats))
        .route("/leaderboard", get(gamification::get_leaderboard))
        .route("/achievements", get(gamification::list_achievement_catalog))
        .route(
            "/practice-words/{phoneme}",
            get(gamification::get_practice_words),
        )
}
