use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Glubs Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::team::create_team,
        crate::routes::team::my_teams,
        crate::routes::team::team_by_invite_code,
        crate::routes::team::invite_members,
        crate::routes::team::respond_invitation,
        crate::routes::team::register_team,
        crate::routes::team::event_teams,
        crate::routes::team::available_users,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::team::CreateTeamRequest,
            crate::dto::team::InviteMembersRequest,
            crate::dto::team::RespondInvitationRequest,
            crate::dto::team::TeamView,
            crate::dto::team::MemberView,
            crate::dto::team::EventSummary,
            crate::dto::team::UserSummary,
            crate::state::state_machine::TeamPhase,
            crate::state::state_machine::MembershipStatus,
            crate::state::state_machine::InviteReply,
            crate::dao::models::ParticipationType,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Team formation and invitation workflow"),
        (name = "events", description = "Event-scoped team listings"),
    )
)]
pub struct ApiDoc;
