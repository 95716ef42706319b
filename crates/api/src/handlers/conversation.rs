//! Handler for conversation completion events from upstream collaborators.
//!
//! Transcription, grammar analysis, and TTS happen upstream; this endpoint
//! receives their outputs and drives the progress/gamification pipeline.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use parla_core::pronunciation::WordConfidence;
use serde::Deserialize;
use validator::Validate;

use crate::engine::completion::{CompletedConversation, CompletionEngine};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /api/v1/conversation/complete`.
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteConversationRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
    pub display_name: Option<String>,
    /// Ordered `(word, confidence)` pairs from the recognizer. May be
    /// empty when no speech was recognized.
    #[serde(default)]
    pub word_confidences: Vec<(String, f64)>,
    pub error_count: u32,
    #[validate(range(min = 0.0, message = "session_duration_seconds must be non-negative"))]
    pub session_duration_seconds: f64,
    /// Error types from the grammar analysis, for common-error tracking.
    #[serde(default)]
    pub error_types: Vec<String>,
}

/// POST /api/v1/conversation/complete
///
/// Record one finished conversation: score pronunciation, award points,
/// update the practice streak, and grant any newly unlocked achievements.
pub async fn complete_conversation(
    State(state): State<AppState>,
    Json(input): Json<CompleteConversationRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if let Some((word, confidence)) = input
        .word_confidences
        .iter()
        .find(|(_, c)| !(0.0..=1.0).contains(c))
    {
        return Err(AppError::BadRequest(format!(
            "confidence {confidence} for word '{word}' is outside [0, 1]"
        )));
    }

    let conversation = CompletedConversation {
        uid: input.user_id,
        display_name: input.display_name,
        word_confidences: input
            .word_confidences
            .into_iter()
            .map(|(word, confidence)| WordConfidence { word, confidence })
            .collect(),
        error_count: input.error_count,
        session_duration_seconds: input.session_duration_seconds,
        error_types: input.error_types,
    };

    let today = Utc::now().date_naive();
    let outcome = CompletionEngine::new(state.store.as_ref())
        .complete(&conversation, today)
        .await?;

    Ok(Json(DataResponse { data: outcome }))
}
