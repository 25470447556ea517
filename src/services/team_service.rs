use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::{
        models::{ParticipationType, TeamEntity, UserEntity},
        team_store::TeamStore,
    },
    dto::team::{
        CreateTeamRequest, InviteMembersRequest, RespondInvitationRequest, TeamView, UserSummary,
    },
    error::ServiceError,
    services::{invite_code, mailer},
    state::{
        SharedState,
        state_machine::{InviteReply, TeamPhase},
        team::Team,
    },
};

/// Attempts at inserting a fresh team before giving up on invite-code
/// collisions. One retry is already overkill for a 124-bit code space.
const CREATE_ATTEMPTS: usize = 3;

/// Create a team for a team-based event with the actor as leader.
///
/// The event's size bounds are snapshotted onto the team; later event edits
/// do not affect existing teams.
pub async fn create_team(
    state: &SharedState,
    actor: Uuid,
    request: CreateTeamRequest,
) -> Result<TeamView, ServiceError> {
    let store = state.require_team_store().await?;

    let Some(event) = store.find_event(request.event_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "event `{}` not found",
            request.event_id
        )));
    };

    if event.participation != ParticipationType::Team {
        return Err(ServiceError::InvalidState(
            "event does not take team registrations".into(),
        ));
    }

    if store
        .find_event_team_for_user(event.id, actor)
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(
            "user already belongs to a team for this event".into(),
        ));
    }

    let mut last_conflict = None;
    for _ in 0..CREATE_ATTEMPTS {
        let team = Team::new(
            request.name.clone(),
            event.id,
            actor,
            event.min_team_size,
            event.max_team_size,
            invite_code::generate(),
            request.description.clone(),
        );
        let entity: TeamEntity = team.into();

        match store.create_team(entity.clone()).await {
            Ok(()) => return team_view(&store, entity).await,
            Err(err) if err.is_conflict() => {
                warn!(team = %entity.id, "invite code collision; regenerating");
                last_conflict = Some(err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(last_conflict.map(Into::into).unwrap_or_else(|| {
        ServiceError::Conflict("invite code generation kept colliding".into())
    }))
}

/// Append pending invitations for the given users and enqueue invite emails.
///
/// Unknown user ids are skipped, as are users already present in the
/// membership list (any status). Email delivery is best-effort and happens
/// after the membership mutation is persisted.
pub async fn invite_members(
    state: &SharedState,
    actor: Uuid,
    team_id: Uuid,
    request: InviteMembersRequest,
) -> Result<TeamView, ServiceError> {
    let store = state.require_team_store().await?;

    let gate = state.team_gate(team_id);
    let _guard = gate.lock().await;

    let Some(entity) = store.find_team(team_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "team `{team_id}` not found"
        )));
    };

    if entity.leader != actor {
        return Err(ServiceError::Forbidden(
            "only the team leader can invite members".into(),
        ));
    }

    if entity.status == TeamPhase::Registered {
        return Err(ServiceError::InvalidState(
            "team is registered; membership is closed".into(),
        ));
    }

    let invitees = store.find_users(request.user_ids.clone()).await?;
    let known_ids: HashSet<Uuid> = invitees.iter().map(|user| user.id).collect();
    for unknown in request.user_ids.iter().filter(|id| !known_ids.contains(id)) {
        warn!(user = %unknown, team = %team_id, "skipping invitation for unknown user");
    }

    let mut team = Team::from(entity);
    let now = SystemTime::now();
    let appended: Vec<Uuid> = request
        .user_ids
        .iter()
        .copied()
        .filter(|id| known_ids.contains(id) && team.invite(*id, now))
        .collect();

    let entity: TeamEntity = team.into();
    if !appended.is_empty() {
        store.update_team(entity.clone()).await?;
        enqueue_invitations(state, &store, &entity, &invitees, &appended, &request).await;
    }

    team_view(&store, entity).await
}

/// Record the actor's accept/decline response for the invite code's team.
pub async fn respond_to_invitation(
    state: &SharedState,
    actor: Uuid,
    request: RespondInvitationRequest,
) -> Result<TeamView, ServiceError> {
    let store = state.require_team_store().await?;

    let Some(located) = store
        .find_team_by_invite_code(request.invite_code.clone())
        .await?
    else {
        return Err(ServiceError::NotFound("invalid invite code".into()));
    };

    let gate = state.team_gate(located.id);
    let _guard = gate.lock().await;

    // Re-read inside the gate so the response is applied to the latest
    // committed membership state.
    let Some(entity) = store.find_team(located.id).await? else {
        return Err(ServiceError::NotFound("invalid invite code".into()));
    };

    if request.response == InviteReply::Accept
        && let Some(existing) = store.find_event_team_for_user(entity.event, actor).await?
        && existing.id != entity.id
    {
        return Err(ServiceError::Conflict(
            "user already belongs to a team for this event".into(),
        ));
    }

    let mut team = Team::from(entity);
    team.respond(actor, request.response, SystemTime::now())?;

    let entity: TeamEntity = team.into();
    store.update_team(entity.clone()).await?;

    team_view(&store, entity).await
}

/// Promote a complete team to registered and push its accepted members into
/// the event's registered-user set.
///
/// The team is persisted before the event. The accepted-member set is
/// re-derived from team state, so the event update stays replayable if the
/// second write fails.
pub async fn register_team(
    state: &SharedState,
    actor: Uuid,
    team_id: Uuid,
) -> Result<TeamView, ServiceError> {
    let store = state.require_team_store().await?;

    let gate = state.team_gate(team_id);
    let _guard = gate.lock().await;

    let Some(entity) = store.find_team(team_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "team `{team_id}` not found"
        )));
    };

    if entity.leader != actor {
        return Err(ServiceError::Forbidden(
            "only the team leader can register the team".into(),
        ));
    }

    let Some(mut event) = store.find_event(entity.event).await? else {
        return Err(ServiceError::NotFound(format!(
            "event `{}` not found",
            entity.event
        )));
    };

    let mut team = Team::from(entity);
    team.register(SystemTime::now())?;
    let roster = team.accepted_user_ids();

    let entity: TeamEntity = team.into();
    store.update_team(entity.clone()).await?;

    let registered: HashSet<Uuid> = event.registered_users.iter().copied().collect();
    event
        .registered_users
        .extend(roster.into_iter().filter(|id| !registered.contains(id)));
    store.save_event(event).await?;

    team_view(&store, entity).await
}

/// Verified users that can still be invited for the event: not leading or
/// belonging to any of its teams, and not individually registered.
pub async fn available_users(
    state: &SharedState,
    event_id: Uuid,
) -> Result<Vec<UserSummary>, ServiceError> {
    let store = state.require_team_store().await?;

    let Some(event) = store.find_event(event_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "event `{event_id}` not found"
        )));
    };

    let mut taken: HashSet<Uuid> = event.registered_users.iter().copied().collect();
    for team in store.list_event_teams(event_id).await? {
        let team = Team::from(team);
        taken.insert(team.leader);
        taken.extend(team.accepted_user_ids());
    }

    let candidates = store
        .list_verified_users()
        .await?
        .into_iter()
        .filter(|user| !taken.contains(&user.id))
        .map(Into::into)
        .collect();

    Ok(candidates)
}

/// Teams the actor leads or is an accepted member of.
pub async fn my_teams(state: &SharedState, actor: Uuid) -> Result<Vec<TeamView>, ServiceError> {
    let store = state.require_team_store().await?;

    let mut views = Vec::new();
    for team in store.list_user_teams(actor).await? {
        views.push(team_view(&store, team).await?);
    }
    Ok(views)
}

/// Every team created for the event.
pub async fn event_teams(
    state: &SharedState,
    event_id: Uuid,
) -> Result<Vec<TeamView>, ServiceError> {
    let store = state.require_team_store().await?;

    let mut views = Vec::new();
    for team in store.list_event_teams(event_id).await? {
        views.push(team_view(&store, team).await?);
    }
    Ok(views)
}

/// Resolve a team from its invite code, for the invitation landing page.
pub async fn team_by_invite_code(
    state: &SharedState,
    code: String,
) -> Result<TeamView, ServiceError> {
    let store = state.require_team_store().await?;

    let Some(team) = store.find_team_by_invite_code(code).await? else {
        return Err(ServiceError::NotFound("invalid invite code".into()));
    };

    team_view(&store, team).await
}

/// Hydrate a team entity into its client-facing view, resolving the event
/// title and the user details for the leader and every member.
async fn team_view(
    store: &Arc<dyn TeamStore>,
    team: TeamEntity,
) -> Result<TeamView, ServiceError> {
    let mut ids: Vec<Uuid> = vec![team.leader];
    ids.extend(team.members.iter().map(|member| member.user));

    let users: HashMap<Uuid, _> = store
        .find_users(ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let event = store.find_event(team.event).await?;

    Ok(TeamView::from_parts(team, event.as_ref(), &users))
}

/// Build and enqueue one invitation email per newly appended member.
async fn enqueue_invitations(
    state: &SharedState,
    store: &Arc<dyn TeamStore>,
    team: &TeamEntity,
    invitees: &[UserEntity],
    appended: &[Uuid],
    request: &InviteMembersRequest,
) {
    let event_title = match store.find_event(team.event).await {
        Ok(Some(event)) => event.title,
        Ok(None) => team.name.clone(),
        Err(err) => {
            warn!(error = %err, team = %team.id, "skipping invite emails; event lookup failed");
            return;
        }
    };

    let link = state.config().invite_link(&team.invite_code);
    for user in invitees.iter().filter(|user| appended.contains(&user.id)) {
        let email = mailer::invitation_email(
            user,
            &team.name,
            &event_title,
            &link,
            request.message.as_deref(),
        );
        if state.mailer().send(email).is_err() {
            warn!(to = %user.email, "mailer queue closed; dropping invitation email");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{EventEntity, UserEntity},
            storage::{StorageError, StorageResult},
        },
        state::{AppState, state_machine::InviteReply},
    };

    #[derive(Default)]
    struct MemoryInner {
        teams: HashMap<Uuid, TeamEntity>,
        events: HashMap<Uuid, EventEntity>,
        users: HashMap<Uuid, UserEntity>,
        forced_conflicts: usize,
        rejected_codes: Vec<String>,
    }

    /// Store backed by in-process maps, mirroring the Mongo backend's
    /// semantics (including the unique invite-code constraint).
    #[derive(Clone, Default)]
    struct MemoryStore {
        inner: Arc<Mutex<MemoryInner>>,
    }

    impl MemoryStore {
        fn with_event(self, event: EventEntity) -> Self {
            self.inner.lock().unwrap().events.insert(event.id, event);
            self
        }

        fn with_user(self, user: UserEntity) -> Self {
            self.inner.lock().unwrap().users.insert(user.id, user);
            self
        }

        /// Reject the next `count` inserts as invite-code collisions,
        /// recording the rejected codes.
        fn with_forced_conflicts(self, count: usize) -> Self {
            self.inner.lock().unwrap().forced_conflicts = count;
            self
        }

        fn event(&self, id: Uuid) -> EventEntity {
            self.inner.lock().unwrap().events[&id].clone()
        }

        fn team(&self, id: Uuid) -> TeamEntity {
            self.inner.lock().unwrap().teams[&id].clone()
        }

        fn committed(entity: &TeamEntity, user: Uuid) -> bool {
            Team::from(entity.clone()).is_committed(user)
        }
    }

    impl TeamStore for MemoryStore {
        fn create_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                if inner.forced_conflicts > 0 {
                    inner.forced_conflicts -= 1;
                    inner.rejected_codes.push(team.invite_code.clone());
                    return Err(StorageError::conflict("invite code already taken"));
                }
                if inner
                    .teams
                    .values()
                    .any(|existing| existing.invite_code == team.invite_code)
                {
                    return Err(StorageError::conflict("invite code already taken"));
                }
                inner.teams.insert(team.id, team);
                Ok(())
            })
        }

        fn update_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                let mut inner = store.inner.lock().unwrap();
                if !inner.teams.contains_key(&team.id) {
                    return Err(StorageError::conflict("team no longer exists"));
                }
                inner.teams.insert(team.id, team);
                Ok(())
            })
        }

        fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.inner.lock().unwrap().teams.get(&id).cloned()) })
        }

        fn find_team_by_invite_code(
            &self,
            code: String,
        ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                Ok(store
                    .inner
                    .lock()
                    .unwrap()
                    .teams
                    .values()
                    .find(|team| team.invite_code == code)
                    .cloned())
            })
        }

        fn find_event_team_for_user(
            &self,
            event: Uuid,
            user: Uuid,
        ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                Ok(store
                    .inner
                    .lock()
                    .unwrap()
                    .teams
                    .values()
                    .find(|team| team.event == event && Self::committed(team, user))
                    .cloned())
            })
        }

        fn list_event_teams(
            &self,
            event: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                Ok(store
                    .inner
                    .lock()
                    .unwrap()
                    .teams
                    .values()
                    .filter(|team| team.event == event)
                    .cloned()
                    .collect())
            })
        }

        fn list_user_teams(
            &self,
            user: Uuid,
        ) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                Ok(store
                    .inner
                    .lock()
                    .unwrap()
                    .teams
                    .values()
                    .filter(|team| Self::committed(team, user))
                    .cloned()
                    .collect())
            })
        }

        fn find_event(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
            let store = self.clone();
            Box::pin(async move { Ok(store.inner.lock().unwrap().events.get(&id).cloned()) })
        }

        fn save_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<()>> {
            let store = self.clone();
            Box::pin(async move {
                store.inner.lock().unwrap().events.insert(event.id, event);
                Ok(())
            })
        }

        fn find_users(
            &self,
            ids: Vec<Uuid>,
        ) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                let inner = store.inner.lock().unwrap();
                Ok(ids
                    .into_iter()
                    .filter_map(|id| inner.users.get(&id).cloned())
                    .collect())
            })
        }

        fn list_verified_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
            let store = self.clone();
            Box::pin(async move {
                Ok(store
                    .inner
                    .lock()
                    .unwrap()
                    .users
                    .values()
                    .filter(|user| user.verified)
                    .cloned()
                    .collect())
            })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn team_event(min: u32, max: u32) -> EventEntity {
        EventEntity {
            id: Uuid::new_v4(),
            title: "Hack Night".into(),
            description: None,
            date: None,
            venue: None,
            participation: ParticipationType::Team,
            min_team_size: min,
            max_team_size: max,
            registered_users: Vec::new(),
        }
    }

    fn verified_user(name: &str) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.edu", name.to_lowercase()),
            verified: true,
            department: None,
            year_of_study: None,
        }
    }

    async fn shared_state(store: MemoryStore) -> SharedState {
        let (mailer, _rx) = mpsc::unbounded_channel();
        let state = AppState::new(AppConfig::default(), mailer);
        state.install_team_store(Arc::new(store)).await;
        state
    }

    fn create_request(event: Uuid, name: &str) -> CreateTeamRequest {
        CreateTeamRequest {
            event_id: event,
            name: name.into(),
            description: None,
        }
    }

    fn invite_request(user_ids: Vec<Uuid>) -> InviteMembersRequest {
        InviteMembersRequest {
            user_ids,
            message: None,
        }
    }

    fn respond_request(code: &str, response: InviteReply) -> RespondInvitationRequest {
        RespondInvitationRequest {
            invite_code: code.into(),
            response,
        }
    }

    #[tokio::test]
    async fn forming_team_completes_once_minimum_is_met() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let u2 = verified_user("Umar");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone())
            .with_user(u2.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        assert_eq!(team.status, TeamPhase::Forming);
        assert!(team.members.is_empty());

        let team = invite_members(
            &state,
            leader.id,
            team.id,
            invite_request(vec![u1.id, u2.id]),
        )
        .await
        .unwrap();
        assert_eq!(team.members.len(), 2);

        let team = respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();
        assert_eq!(team.status, TeamPhase::Complete);
    }

    #[tokio::test]
    async fn decline_keeps_team_complete_and_registration_skips_decliner() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let u2 = verified_user("Umar");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone())
            .with_user(u2.clone());
        let state = shared_state(store.clone()).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(
            &state,
            leader.id,
            team.id,
            invite_request(vec![u1.id, u2.id]),
        )
        .await
        .unwrap();
        respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();

        let view = respond_to_invitation(
            &state,
            u2.id,
            respond_request(&team.invite_code, InviteReply::Decline),
        )
        .await
        .unwrap();
        assert_eq!(view.status, TeamPhase::Complete);

        let view = register_team(&state, leader.id, team.id).await.unwrap();
        assert_eq!(view.status, TeamPhase::Registered);

        let registered = store.event(event.id).registered_users;
        assert!(registered.contains(&leader.id));
        assert!(registered.contains(&u1.id));
        assert!(!registered.contains(&u2.id));
    }

    #[tokio::test]
    async fn uninvited_response_is_a_bad_request() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let outsider = verified_user("Otto");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(outsider.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();

        let err = respond_to_invitation(
            &state,
            outsider.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn second_response_conflicts_and_preserves_first() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone());
        let state = shared_state(store.clone()).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(&state, leader.id, team.id, invite_request(vec![u1.id]))
            .await
            .unwrap();
        respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();

        let err = respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Decline),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let persisted = Team::from(store.team(team.id));
        assert_eq!(persisted.accepted_count(), 1);
    }

    #[tokio::test]
    async fn accepted_member_cannot_create_second_team() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone());
        let state = shared_state(store.clone()).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(&state, leader.id, team.id, invite_request(vec![u1.id]))
            .await
            .unwrap();
        respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();

        let err = create_team(&state, u1.id, create_request(event.id, "Beta"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        // The failed attempt must not leave a second team behind.
        assert_eq!(store.inner.lock().unwrap().teams.len(), 1);
    }

    #[tokio::test]
    async fn leader_cannot_create_twice_for_same_event() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone());
        let state = shared_state(store).await;

        create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        let err = create_team(&state, leader.id, create_request(event.id, "Beta"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_regenerates_code_after_collision() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_forced_conflicts(2);
        let state = shared_state(store.clone()).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.teams.len(), 1);
        // Each rejected insert carried a code that was discarded, not reused.
        assert_eq!(inner.rejected_codes.len(), 2);
        assert!(!inner.rejected_codes.contains(&team.invite_code));
    }

    #[tokio::test]
    async fn create_gives_up_after_repeated_collisions() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_forced_conflicts(CREATE_ATTEMPTS);
        let state = shared_state(store.clone()).await;

        let err = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(store.inner.lock().unwrap().teams.is_empty());
    }

    #[tokio::test]
    async fn update_rejects_vanished_team() {
        let store = MemoryStore::default();
        let team = Team::new(
            "Alpha".into(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            2,
            4,
            invite_code::generate(),
            None,
        );

        let err = store.update_team(team.into()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn reinvite_is_a_noop() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(&state, leader.id, team.id, invite_request(vec![u1.id]))
            .await
            .unwrap();
        let view = invite_members(&state, leader.id, team.id, invite_request(vec![u1.id]))
            .await
            .unwrap();
        assert_eq!(view.members.len(), 1);
    }

    #[tokio::test]
    async fn only_leader_invites_and_registers() {
        let event = team_event(1, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();

        let err = invite_members(&state, u1.id, team.id, invite_request(vec![u1.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = register_team(&state, u1.id, team.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn forming_team_cannot_register() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        let err = register_team(&state, leader.id, team.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn solo_event_rejects_team_creation() {
        let mut event = team_event(2, 4);
        event.participation = ParticipationType::Solo;
        let leader = verified_user("Leda");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone());
        let state = shared_state(store).await;

        let err = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn registered_team_is_closed_to_invites_and_responses() {
        let event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let u2 = verified_user("Umar");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone())
            .with_user(u2.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(
            &state,
            leader.id,
            team.id,
            invite_request(vec![u1.id, u2.id]),
        )
        .await
        .unwrap();
        respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();
        register_team(&state, leader.id, team.id).await.unwrap();

        let err = invite_members(&state, leader.id, team.id, invite_request(vec![u2.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = respond_to_invitation(
            &state,
            u2.id,
            respond_request(&team.invite_code, InviteReply::Decline),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = register_team(&state, leader.id, team.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn available_users_excludes_committed_and_registered() {
        let mut event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let pending = verified_user("Pia");
        let solo = verified_user("Sol");
        let free = verified_user("Faye");
        event.registered_users.push(solo.id);
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone())
            .with_user(pending.clone())
            .with_user(solo.clone())
            .with_user(free.clone());
        let state = shared_state(store).await;

        let team = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        invite_members(
            &state,
            leader.id,
            team.id,
            invite_request(vec![u1.id, pending.id]),
        )
        .await
        .unwrap();
        respond_to_invitation(
            &state,
            u1.id,
            respond_request(&team.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();

        let candidates = available_users(&state, event.id).await.unwrap();
        let ids: HashSet<Uuid> = candidates.iter().map(|user| user.id).collect();
        assert!(!ids.contains(&leader.id));
        assert!(!ids.contains(&u1.id));
        assert!(!ids.contains(&solo.id));
        // A pending invitee has not committed yet and stays invitable.
        assert!(ids.contains(&pending.id));
        assert!(ids.contains(&free.id));
    }

    #[tokio::test]
    async fn my_teams_lists_led_and_accepted_teams() {
        let event = team_event(2, 4);
        let other_event = team_event(2, 4);
        let leader = verified_user("Leda");
        let u1 = verified_user("Uma");
        let store = MemoryStore::default()
            .with_event(event.clone())
            .with_event(other_event.clone())
            .with_user(leader.clone())
            .with_user(u1.clone());
        let state = shared_state(store).await;

        let alpha = create_team(&state, leader.id, create_request(event.id, "Alpha"))
            .await
            .unwrap();
        let beta = create_team(&state, u1.id, create_request(other_event.id, "Beta"))
            .await
            .unwrap();
        invite_members(&state, u1.id, beta.id, invite_request(vec![leader.id]))
            .await
            .unwrap();
        respond_to_invitation(
            &state,
            leader.id,
            respond_request(&beta.invite_code, InviteReply::Accept),
        )
        .await
        .unwrap();

        let mine = my_teams(&state, leader.id).await.unwrap();
        let names: HashSet<String> = mine.into_iter().map(|team| team.name).collect();
        assert_eq!(names, HashSet::from(["Alpha".to_string(), "Beta".into()]));

        let code = team_by_invite_code(&state, alpha.invite_code.clone())
            .await
            .unwrap();
        assert_eq!(code.id, alpha.id);
    }
}
