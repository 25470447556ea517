use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{EventEntity, ParticipationType, TeamEntity, UserEntity},
    dto::{format_system_time, validation::validate_invite_code},
    state::state_machine::{InviteReply, MembershipStatus, TeamPhase},
};

/// Payload used to create a team for a team-based event.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTeamRequest {
    /// Event the team registers for.
    pub event_id: Uuid,
    /// Team display name.
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Payload used by the leader to invite users into the team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InviteMembersRequest {
    /// Users to append as pending members.
    #[validate(length(min = 1))]
    pub user_ids: Vec<Uuid>,
    /// Optional personal note embedded in the invitation email.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

/// Payload used by an invited user to accept or decline an invitation.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RespondInvitationRequest {
    /// Invite code identifying the team.
    #[validate(custom(function = validate_invite_code))]
    pub invite_code: String,
    /// Accept or decline.
    pub response: InviteReply,
}

/// Public projection of a user for candidate lists and member display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    /// User id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Department display string, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Year of study display string, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_study: Option<String>,
}

impl From<UserEntity> for UserSummary {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            department: value.department,
            year_of_study: value.year_of_study,
        }
    }
}

/// Event context embedded in team views.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventSummary {
    /// Event id.
    pub id: Uuid,
    /// Event display title.
    pub title: String,
    /// Participation mode of the event.
    pub participation: ParticipationType,
}

impl From<&EventEntity> for EventSummary {
    fn from(value: &EventEntity) -> Self {
        Self {
            id: value.id,
            title: value.title.clone(),
            participation: value.participation,
        }
    }
}

/// One invitation entry inside a team view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberView {
    /// Invited user id.
    pub user_id: Uuid,
    /// Resolved user details, when the user document still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    /// Invitation response state.
    pub status: MembershipStatus,
    /// When the invitation was issued (RFC 3339).
    pub invited_at: String,
    /// When the user responded (RFC 3339). Absent while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<String>,
}

/// Full team projection returned by the workflow operations.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamView {
    /// Team id.
    pub id: Uuid,
    /// Team display name.
    pub name: String,
    /// Aggregate lifecycle status.
    pub status: TeamPhase,
    /// Invite code shared out of band.
    pub invite_code: String,
    /// Optional free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minimum headcount snapshot.
    pub min_members: u32,
    /// Maximum headcount snapshot.
    pub max_members: u32,
    /// Event context, when the event document still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventSummary>,
    /// Leader user id.
    pub leader_id: Uuid,
    /// Resolved leader details, when the user document still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<UserSummary>,
    /// Invitation entries in invitation order.
    pub members: Vec<MemberView>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last mutation timestamp (RFC 3339).
    pub updated_at: String,
}

impl TeamView {
    /// Assemble a view from the persisted team and its resolved collaborators.
    pub fn from_parts(
        team: TeamEntity,
        event: Option<&EventEntity>,
        users: &HashMap<Uuid, UserEntity>,
    ) -> Self {
        let members = team
            .members
            .into_iter()
            .map(|member| MemberView {
                user_id: member.user,
                user: users.get(&member.user).cloned().map(Into::into),
                status: member.status,
                invited_at: format_system_time(member.invited_at),
                responded_at: member.responded_at.map(format_system_time),
            })
            .collect();

        Self {
            id: team.id,
            name: team.name,
            status: team.status,
            invite_code: team.invite_code,
            description: team.description,
            min_members: team.min_members,
            max_members: team.max_members,
            event: event.map(Into::into),
            leader_id: team.leader,
            leader: users.get(&team.leader).cloned().map(Into::into),
            members,
            created_at: format_system_time(team.created_at),
            updated_at: format_system_time(team.updated_at),
        }
    }
}
