/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Practice continuity is tracked at calendar-day granularity.
pub type PracticeDay = chrono::NaiveDate;
