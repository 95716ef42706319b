//! Route definitions for conversation completion.

use axum::routing::post;
use axum::Router;

use crate::handlers::conversation;
use crate::state::AppState;

/// Routes mounted at `/conversation`.
///
/// ```text
/// POST  /complete   -> complete_conversation
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/complete", post(conversation::complete_conversation))
}
