/// MongoDB backend for the team store.
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{EventEntity, TeamEntity, UserEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for teams and the event/user
/// collections the workflow collaborates with.
pub trait TeamStore: Send + Sync {
    /// Insert a brand-new team. A duplicate invite code surfaces as a
    /// retryable [`StorageError::Conflict`](crate::dao::storage::StorageError).
    fn create_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a persisted team document with its mutated state. A team that
    /// was deleted concurrently surfaces as a
    /// [`StorageError::Conflict`](crate::dao::storage::StorageError).
    fn update_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a team up by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Look a team up by its invite code.
    fn find_team_by_invite_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Team the user leads or is an accepted member of for the given event.
    fn find_event_team_for_user(
        &self,
        event: Uuid,
        user: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Every team created for the given event.
    fn list_event_teams(&self, event: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Teams the user leads or is an accepted member of, across events.
    fn list_user_teams(&self, user: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Look an event up by id.
    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    /// Persist an updated event (registered-user set).
    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the given users, skipping ids with no matching document.
    fn find_users(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// Every verified user, used to build invitation candidate lists.
    fn list_verified_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// Ping the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failure.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
