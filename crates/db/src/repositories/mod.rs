//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Counter mutations are single
//! SQL statements (increments, `ON CONFLICT` upserts) so concurrent
//! callers cannot lose updates.

pub mod achievement_repo;
pub mod progress_repo;
pub mod streak_repo;
pub mod user_repo;

pub use achievement_repo::AchievementRepo;
pub use progress_repo::ProgressRepo;
pub use streak_repo::StreakRepo;
pub use user_repo::UserRepo;
