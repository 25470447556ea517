use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoEventDocument, MongoTeamDocument, MongoUserDocument, doc_id, uuid_as_binary},
};
use crate::dao::{
    models::{EventEntity, TeamEntity, UserEntity},
    storage::StorageResult,
    team_store::TeamStore,
};

const TEAM_COLLECTION_NAME: &str = "teams";
const EVENT_COLLECTION_NAME: &str = "events";
const USER_COLLECTION_NAME: &str = "users";

/// MongoDB-backed [`TeamStore`] holding the team, event, and user collections.
#[derive(Clone)]
pub struct MongoTeamStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.client.database(&self.config.database_name)
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl MongoTeamStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Invite-code uniqueness is enforced here, at the store boundary; the
    /// service retries code generation when an insert reports a collision.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.team_collection().await;

        let invite_code_index = mongodb::IndexModel::builder()
            .keys(doc! {"invite_code": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("team_invite_code_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(invite_code_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEAM_COLLECTION_NAME,
                index: "invite_code",
                source,
            })?;

        let event_index = mongodb::IndexModel::builder()
            .keys(doc! {"event": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("team_event_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(event_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEAM_COLLECTION_NAME,
                index: "event",
                source,
            })?;

        Ok(())
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoTeamDocument>(TEAM_COLLECTION_NAME)
    }

    async fn event_collection(&self) -> Collection<MongoEventDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoEventDocument>(EVENT_COLLECTION_NAME)
    }

    async fn user_collection(&self) -> Collection<MongoUserDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn create_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        let collection = self.team_collection().await;

        collection.insert_one(&document).await.map_err(|source| {
            if is_duplicate_key(&source) {
                MongoDaoError::DuplicateInviteCode
            } else {
                MongoDaoError::InsertTeam { id, source }
            }
        })?;

        Ok(())
    }

    async fn update_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        let collection = self.team_collection().await;

        let result = collection
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::SaveTeam { id, source })?;

        // A zero match means the team vanished between the gated read and
        // this write; pretending the save landed would hand back a view of
        // state that was never persisted.
        if result.matched_count == 0 {
            return Err(MongoDaoError::MissingTeam { id });
        }

        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let collection = self.team_collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTeam { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn find_team_by_invite_code(&self, code: String) -> MongoResult<Option<TeamEntity>> {
        let collection = self.team_collection().await;

        let document = collection
            .find_one(doc! {"invite_code": code})
            .await
            .map_err(|source| MongoDaoError::LoadTeamByCode { source })?;

        Ok(document.map(Into::into))
    }

    async fn find_event_team_for_user(
        &self,
        event: Uuid,
        user: Uuid,
    ) -> MongoResult<Option<TeamEntity>> {
        let collection = self.team_collection().await;

        let filter = doc! {
            "event": uuid_as_binary(event),
            "$or": [
                {"leader": uuid_as_binary(user)},
                {"members": {"$elemMatch": {"user": uuid_as_binary(user), "status": "accepted"}}},
            ],
        };

        let document = collection
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?;

        Ok(document.map(Into::into))
    }

    async fn list_event_teams(&self, event: Uuid) -> MongoResult<Vec<TeamEntity>> {
        let collection = self.team_collection().await;

        let documents: Vec<MongoTeamDocument> = collection
            .find(doc! {"event": uuid_as_binary(event)})
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_user_teams(&self, user: Uuid) -> MongoResult<Vec<TeamEntity>> {
        let collection = self.team_collection().await;

        let filter = doc! {
            "$or": [
                {"leader": uuid_as_binary(user)},
                {"members": {"$elemMatch": {"user": uuid_as_binary(user), "status": "accepted"}}},
            ],
        };

        let documents: Vec<MongoTeamDocument> = collection
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryTeams { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_event(&self, id: Uuid) -> MongoResult<Option<EventEntity>> {
        let collection = self.event_collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadEvent { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn save_event(&self, event: EventEntity) -> MongoResult<()> {
        let id = event.id;
        let document: MongoEventDocument = event.into();
        let collection = self.event_collection().await;

        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveEvent { id, source })?;

        Ok(())
    }

    async fn find_users(&self, ids: Vec<Uuid>) -> MongoResult<Vec<UserEntity>> {
        let collection = self.user_collection().await;

        let id_filters: Vec<_> = ids.into_iter().map(uuid_as_binary).collect();
        let documents: Vec<MongoUserDocument> = collection
            .find(doc! {"_id": {"$in": id_filters}})
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_verified_users(&self) -> MongoResult<Vec<UserEntity>> {
        let collection = self.user_collection().await;

        let documents: Vec<MongoUserDocument> = collection
            .find(doc! {"verified": true})
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::QueryUsers { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl TeamStore for MongoTeamStore {
    fn create_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.create_team(team).await.map_err(Into::into) })
    }

    fn update_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn find_team_by_invite_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team_by_invite_code(code).await.map_err(Into::into) })
    }

    fn find_event_team_for_user(
        &self,
        event: Uuid,
        user: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_event_team_for_user(event, user)
                .await
                .map_err(Into::into)
        })
    }

    fn list_event_teams(
        &self,
        event: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_event_teams(event).await.map_err(Into::into) })
    }

    fn list_user_teams(&self, user: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_user_teams(user).await.map_err(Into::into) })
    }

    fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_event(event).await.map_err(Into::into) })
    }

    fn find_users(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_users(ids).await.map_err(Into::into) })
    }

    fn list_verified_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_verified_users().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}
