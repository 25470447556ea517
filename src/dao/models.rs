use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::state_machine::{MembershipStatus, TeamPhase};

/// Representation of a team persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Primary key of the team.
    pub id: Uuid,
    /// Display name chosen by the leader.
    pub name: String,
    /// Event the team was created for.
    pub event: Uuid,
    /// User who created the team.
    pub leader: Uuid,
    /// Invitation records, one per user, in invitation order.
    pub members: Vec<MembershipEntity>,
    /// Minimum headcount snapshotted from the event at creation time.
    pub min_members: u32,
    /// Maximum headcount snapshotted from the event at creation time.
    pub max_members: u32,
    /// Aggregate lifecycle phase.
    pub status: TeamPhase,
    /// Globally unique opaque invitation token.
    pub invite_code: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the team entity was updated.
    pub updated_at: SystemTime,
}

/// Invitation record embedded in a team entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipEntity {
    /// Invited user.
    pub user: Uuid,
    /// Current response state of the invitation.
    pub status: MembershipStatus,
    /// When the invitation was issued.
    pub invited_at: SystemTime,
    /// When the user responded. Absent while pending.
    pub responded_at: Option<SystemTime>,
}

/// Participation mode declared on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationType {
    /// Users register individually.
    Solo,
    /// Users register through teams.
    Team,
}

/// Event entity consumed by the team workflow. Owned by the events service;
/// this core only reads it and appends to `registered_users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Primary key of the event.
    pub id: Uuid,
    /// Display title of the event.
    pub title: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Scheduled date of the event.
    pub date: Option<SystemTime>,
    /// Optional venue display string.
    pub venue: Option<String>,
    /// Whether the event accepts individual or team registrations.
    pub participation: ParticipationType,
    /// Smallest allowed team headcount, including the leader.
    pub min_team_size: u32,
    /// Largest allowed team headcount, including the leader.
    pub max_team_size: u32,
    /// Users registered for the event, individually or through a team.
    pub registered_users: Vec<Uuid>,
}

/// User entity consumed for invitation display and email delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email used for invitation delivery.
    pub email: String,
    /// Whether the account passed email verification.
    pub verified: bool,
    /// Department display string.
    pub department: Option<String>,
    /// Year of study display string.
    pub year_of_study: Option<String>,
}
