pub mod conversation;
pub mod gamification;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /conversation/complete                    record a completed conversation (POST)
///
/// /gamification/stats                       learner stats view (GET)
/// /gamification/leaderboard                 ranked top users (GET)
/// /gamification/achievements                static achievement catalog (GET)
/// /gamification/practice-words/{phoneme}    practice suggestions (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/conversation", conversation::router())
        .nest("/gamification", gamification::router())
}
