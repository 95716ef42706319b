//! Gamification engine.
//!
//! Orchestrates the pure domain logic in `parla-core` against a
//! [`parla_db::store::ProgressStore`]: the conversation-completion
//! pipeline, the streak tracker, the achievement engine, and the
//! leaderboard ranker. Every service is stateless and generic over the
//! store handle it is constructed with, so tests run against in-memory
//! doubles.

pub mod awards;
pub mod completion;
pub mod leaderboard;
pub mod streaks;
