//! Error types shared by the MongoDB storage implementation.

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// Building the client from parsed options failed.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// The server never answered the initial ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// Index creation was rejected.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// The unique invite-code index rejected an insert. The caller may
    /// regenerate the code and retry.
    #[error("invite code already taken by another team")]
    DuplicateInviteCode,
    /// Inserting a fresh team failed for a reason other than the invite-code
    /// index.
    #[error("failed to insert team `{id}`")]
    InsertTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Replacing a team document failed.
    #[error("failed to save team `{id}`")]
    SaveTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// A replace matched no document; the team was deleted concurrently.
    #[error("team `{id}` no longer exists")]
    MissingTeam { id: Uuid },
    /// Loading a team by id failed.
    #[error("failed to load team `{id}`")]
    LoadTeam {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Loading a team by invite code failed.
    #[error("failed to load team by invite code")]
    LoadTeamByCode {
        #[source]
        source: MongoError,
    },
    /// A team listing query failed.
    #[error("failed to query teams")]
    QueryTeams {
        #[source]
        source: MongoError,
    },
    /// Loading an event by id failed.
    #[error("failed to load event `{id}`")]
    LoadEvent {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Persisting an event failed.
    #[error("failed to save event `{id}`")]
    SaveEvent {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// A user lookup query failed.
    #[error("failed to query users")]
    QueryUsers {
        #[source]
        source: MongoError,
    },
}
