//! Handlers for learner stats, the leaderboard, and the achievement
//! catalog.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use parla_core::achievements::{self, AchievementRule};
use parla_core::error::CoreError;
use parla_core::pronunciation;
use parla_db::models::achievement::Achievement;
use parla_db::models::progress::ErrorCount;
use parla_db::store::ProgressStore;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::leaderboard::LeaderboardRanker;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Leaderboard size when the caller does not specify one.
const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

/// How many trailing scores count as "recent" for improvement tracking.
const RECENT_WINDOW: usize = 5;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Query for `GET /gamification/stats`.
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub uid: String,
}

/// Per-phoneme progress in the stats view.
#[derive(Debug, Serialize)]
pub struct PhonemeProgress {
    pub phoneme: String,
    pub scores: Vec<f64>,
    pub improvement_percentage: f64,
}

/// Account block of the stats view.
#[derive(Debug, Serialize)]
pub struct UserStatsBlock {
    pub display_name: String,
    pub level: String,
    pub total_points: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub rank: i64,
}

/// Progress block of the stats view.
#[derive(Debug, Serialize)]
pub struct ProgressStatsBlock {
    pub total_conversations: i64,
    pub overall_pronunciation_score: f64,
    pub pronunciation_progress: Vec<PhonemeProgress>,
    pub common_errors: Vec<ErrorCount>,
}

/// Full stats view for one learner.
#[derive(Debug, Serialize)]
pub struct UserStats {
    pub user: UserStatsBlock,
    pub progress: ProgressStatsBlock,
    pub achievements: Vec<Achievement>,
}

/// GET /api/v1/gamification/stats?uid=
///
/// Comprehensive statistics for one learner: account counters, progress
/// aggregates with per-phoneme history, and earned achievements.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    let store = state.store.as_ref();

    let user = store.find_user(&query.uid).await?.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "user",
            key: query.uid.clone(),
        })
    })?;

    let progress = store.get_or_create_progress(user.id).await?;
    let achievements = store.achievements_for_user(user.id).await?;
    let rank = LeaderboardRanker::new(store).rank(&user).await?;
    let history = store.phoneme_history(user.id).await?;
    let common_errors = store.error_counts(user.id).await?;

    let pronunciation_progress = history
        .into_iter()
        .map(|h| PhonemeProgress {
            improvement_percentage: phoneme_improvement(&h.scores),
            phoneme: h.phoneme,
            scores: h.scores,
        })
        .collect();

    Ok(Json(DataResponse {
        data: UserStats {
            user: UserStatsBlock {
                display_name: user.display_name,
                level: user.level,
                total_points: user.total_points,
                current_streak: user.current_streak,
                longest_streak: user.longest_streak,
                rank,
            },
            progress: ProgressStatsBlock {
                total_conversations: progress.total_conversations,
                overall_pronunciation_score: progress.overall_pronunciation_score,
                pronunciation_progress,
                common_errors,
            },
            achievements,
        },
    }))
}

/// Recent-window improvement for one phoneme's score history.
///
/// The last [`RECENT_WINDOW`] scores count as recent; anything earlier is
/// the historical baseline. Too little history reads as no change.
fn phoneme_improvement(scores: &[f64]) -> f64 {
    if scores.len() <= RECENT_WINDOW {
        return 0.0;
    }
    let split = scores.len() - RECENT_WINDOW;
    pronunciation::improvement(&scores[..split], &scores[split..])
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Query for `GET /gamification/leaderboard`.
#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<i64>,
    pub country: Option<String>,
}

/// GET /api/v1/gamification/leaderboard?limit=&country=
///
/// Global leaderboard ordered by lifetime points, optionally filtered to
/// one country.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> AppResult<impl IntoResponse> {
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let entries = LeaderboardRanker::new(state.store.as_ref())
        .top(limit, query.country.as_deref())
        .await?;

    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// GET /api/v1/gamification/achievements
///
/// The static catalog of unlockable achievements.
pub async fn list_achievement_catalog() -> impl IntoResponse {
    let catalog: Vec<&'static AchievementRule> = achievements::all_rules().collect();
    Json(DataResponse { data: catalog })
}

/// GET /api/v1/gamification/practice-words/{phoneme}
///
/// Practice word suggestions for one phoneme category. Unknown categories
/// get an empty list.
pub async fn get_practice_words(Path(phoneme): Path<String>) -> impl IntoResponse {
    Json(DataResponse {
        data: pronunciation::practice_words(&phoneme),
    })
}
