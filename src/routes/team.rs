use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::team::{
        CreateTeamRequest, InviteMembersRequest, RespondInvitationRequest, TeamView, UserSummary,
    },
    error::AppError,
    routes::actor::Actor,
    services::team_service,
    state::SharedState,
};

/// Routes covering the team formation and invitation workflow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(create_team))
        .route("/teams/mine", get(my_teams))
        .route("/teams/invite/{invite_code}", get(team_by_invite_code))
        .route("/teams/{id}/invitations", post(invite_members))
        .route("/teams/respond-invitation", post(respond_invitation))
        .route("/teams/{id}/register", post(register_team))
        .route("/events/{event_id}/teams", get(event_teams))
        .route("/events/{event_id}/available-users", get(available_users))
}

/// Create a team for a team-based event with the caller as leader.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created", body = TeamView),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Caller already belongs to a team for this event"),
        (status = 422, description = "Event does not take team registrations")
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Actor(actor): Actor,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::create_team(&state, actor, payload).await?;
    Ok(Json(team))
}

/// List teams the caller leads or has accepted membership in.
#[utoipa::path(
    get,
    path = "/teams/mine",
    tag = "teams",
    responses((status = 200, description = "Teams of the caller", body = [TeamView]))
)]
pub async fn my_teams(
    State(state): State<SharedState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<TeamView>>, AppError> {
    let teams = team_service::my_teams(&state, actor).await?;
    Ok(Json(teams))
}

/// Resolve a team from its invite code, for the invitation landing page.
#[utoipa::path(
    get,
    path = "/teams/invite/{invite_code}",
    tag = "teams",
    params(("invite_code" = String, Path, description = "Invite code shared out of band")),
    responses(
        (status = 200, description = "Team behind the invite code", body = TeamView),
        (status = 404, description = "Unknown invite code")
    )
)]
pub async fn team_by_invite_code(
    State(state): State<SharedState>,
    Actor(_actor): Actor,
    Path(invite_code): Path<String>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::team_by_invite_code(&state, invite_code).await?;
    Ok(Json(team))
}

/// Invite users into the team and enqueue invitation emails.
#[utoipa::path(
    post,
    path = "/teams/{id}/invitations",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    request_body = InviteMembersRequest,
    responses(
        (status = 200, description = "Invitations recorded", body = TeamView),
        (status = 403, description = "Caller is not the team leader"),
        (status = 404, description = "Team not found"),
        (status = 422, description = "Team is registered; membership is closed")
    )
)]
pub async fn invite_members(
    State(state): State<SharedState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<InviteMembersRequest>>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::invite_members(&state, actor, id, payload).await?;
    Ok(Json(team))
}

/// Accept or decline the invitation behind the given invite code.
#[utoipa::path(
    post,
    path = "/teams/respond-invitation",
    tag = "teams",
    request_body = RespondInvitationRequest,
    responses(
        (status = 200, description = "Response recorded", body = TeamView),
        (status = 400, description = "Caller was never invited"),
        (status = 404, description = "Unknown invite code"),
        (status = 409, description = "Invitation already resolved or caller committed elsewhere")
    )
)]
pub async fn respond_invitation(
    State(state): State<SharedState>,
    Actor(actor): Actor,
    Valid(Json(payload)): Valid<Json<RespondInvitationRequest>>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::respond_to_invitation(&state, actor, payload).await?;
    Ok(Json(team))
}

/// Register a complete team for its event.
#[utoipa::path(
    post,
    path = "/teams/{id}/register",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team registered", body = TeamView),
        (status = 403, description = "Caller is not the team leader"),
        (status = 404, description = "Team not found"),
        (status = 422, description = "Team is not complete or already registered")
    )
)]
pub async fn register_team(
    State(state): State<SharedState>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamView>, AppError> {
    let team = team_service::register_team(&state, actor, id).await?;
    Ok(Json(team))
}

/// List every team created for the event.
#[utoipa::path(
    get,
    path = "/events/{event_id}/teams",
    tag = "events",
    params(("event_id" = Uuid, Path, description = "Event identifier")),
    responses((status = 200, description = "Teams of the event", body = [TeamView]))
)]
pub async fn event_teams(
    State(state): State<SharedState>,
    Actor(_actor): Actor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<TeamView>>, AppError> {
    let teams = team_service::event_teams(&state, event_id).await?;
    Ok(Json(teams))
}

/// List verified users that can still be invited for the event.
#[utoipa::path(
    get,
    path = "/events/{event_id}/available-users",
    tag = "events",
    params(("event_id" = Uuid, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Invitation candidates", body = [UserSummary]),
        (status = 404, description = "Event not found")
    )
)]
pub async fn available_users(
    State(state): State<SharedState>,
    Actor(_actor): Actor,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = team_service::available_users(&state, event_id).await?;
    Ok(Json(users))
}
