use std::sync::Arc;

use parla_db::store::PgProgressStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (used directly by the health check).
    pub pool: parla_db::DbPool,
    /// Store handle the engine services are constructed with.
    pub store: Arc<PgProgressStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
