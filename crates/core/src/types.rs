/// All primary keys are UUIDs; user ids are the identity provider's token subject.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Listing prices and sizes are stored as NUMERIC.
pub type Decimal = rust_decimal::Decimal;

/// Generate a new time-ordered primary key.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
