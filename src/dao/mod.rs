/// Database model definitions shared across layers.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Team, event, and user storage operations.
pub mod team_store;
