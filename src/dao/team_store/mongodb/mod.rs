mod connection;
mod error;
mod models;
/// MongoDB-backed store implementation.
pub mod store;

/// Connection settings parsing.
pub mod config;

pub use error::MongoDaoError;
pub use store::MongoTeamStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            conflict @ (MongoDaoError::DuplicateInviteCode | MongoDaoError::MissingTeam { .. }) => {
                StorageError::conflict(conflict.to_string())
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
