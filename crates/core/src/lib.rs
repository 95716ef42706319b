//! Pure domain logic for learner progress tracking.
//!
//! Everything in this crate is side-effect free: pronunciation scoring,
//! point calculation, the streak state machine, and the achievement rule
//! table. Persistence and orchestration live in `parla-db` and `parla-api`.

pub mod achievements;
pub mod error;
pub mod points;
pub mod pronunciation;
pub mod streak;
pub mod types;
