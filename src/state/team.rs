use std::time::SystemTime;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{MembershipEntity, TeamEntity};
use crate::state::state_machine::{
    InviteReply, MembershipStatus, RegisterError, RespondError, TeamPhase, phase_after_response,
    phase_for_registration, resolve_membership,
};

/// Invitation record for a single user within a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Current response state of the invitation.
    pub status: MembershipStatus,
    /// When the invitation was issued.
    pub invited_at: SystemTime,
    /// When the user accepted or declined. Absent while pending.
    pub responded_at: Option<SystemTime>,
}

/// Runtime representation of a team aggregate.
///
/// The membership collection is keyed by user id, which makes the
/// one-entry-per-user invariant structural while preserving invitation order.
/// The leader is tracked separately and never appears among the members.
#[derive(Debug, Clone)]
pub struct Team {
    /// Primary key of the team.
    pub id: Uuid,
    /// Display name chosen by the leader.
    pub name: String,
    /// Event this team was created for. Immutable after creation.
    pub event: Uuid,
    /// User who created the team; sole holder of invite/register privileges.
    pub leader: Uuid,
    /// Invited users keyed by user id, in invitation order.
    pub members: IndexMap<Uuid, Membership>,
    /// Minimum headcount, snapshotted from the event at creation time.
    pub min_members: u32,
    /// Maximum headcount, snapshotted from the event at creation time.
    pub max_members: u32,
    /// Aggregate lifecycle phase.
    pub phase: TeamPhase,
    /// Opaque token used to share the invitation out of band. Never changes.
    pub invite_code: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
}

impl Team {
    /// Build a fresh team in the forming phase with no invited members.
    pub fn new(
        name: String,
        event: Uuid,
        leader: Uuid,
        min_members: u32,
        max_members: u32,
        invite_code: String,
        description: Option<String>,
    ) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name,
            event,
            leader,
            members: IndexMap::new(),
            min_members,
            max_members,
            phase: TeamPhase::Forming,
            invite_code,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of members who accepted their invitation.
    pub fn accepted_count(&self) -> usize {
        self.members
            .values()
            .filter(|member| member.status == MembershipStatus::Accepted)
            .count()
    }

    /// Accepted members plus the leader.
    pub fn headcount(&self) -> usize {
        self.accepted_count() + 1
    }

    /// Whether the user is committed to this team (leader or accepted member).
    pub fn is_committed(&self, user: Uuid) -> bool {
        self.leader == user
            || self
                .members
                .get(&user)
                .is_some_and(|member| member.status == MembershipStatus::Accepted)
    }

    /// Append a pending invitation for `user`.
    ///
    /// Inviting the leader or a user already present (any status) is a silent
    /// no-op so a re-invitation never resets a prior decline. Returns whether
    /// a new entry was appended.
    pub fn invite(&mut self, user: Uuid, now: SystemTime) -> bool {
        if user == self.leader || self.members.contains_key(&user) {
            return false;
        }

        self.members.insert(
            user,
            Membership {
                status: MembershipStatus::Pending,
                invited_at: now,
                responded_at: None,
            },
        );
        self.updated_at = now;
        true
    }

    /// Record `user`'s response to their invitation and recompute the phase.
    pub fn respond(
        &mut self,
        user: Uuid,
        reply: InviteReply,
        now: SystemTime,
    ) -> Result<TeamPhase, RespondError> {
        if self.phase == TeamPhase::Registered {
            return Err(RespondError::MembershipClosed);
        }

        let accepted = self.accepted_count();
        let max_members = self.max_members;
        let member = self
            .members
            .get_mut(&user)
            .ok_or(RespondError::NotInvited)?;

        let next_status = resolve_membership(member.status, reply)?;

        if next_status == MembershipStatus::Accepted && accepted + 2 > max_members as usize {
            return Err(RespondError::TeamFull);
        }

        member.status = next_status;
        member.responded_at = Some(now);
        self.updated_at = now;

        self.phase = phase_after_response(
            self.phase,
            self.accepted_count(),
            self.min_members,
            self.max_members,
        );
        Ok(self.phase)
    }

    /// Promote a complete team into the registered phase.
    pub fn register(&mut self, now: SystemTime) -> Result<(), RegisterError> {
        self.phase = phase_for_registration(self.phase)?;
        self.updated_at = now;
        Ok(())
    }

    /// Leader followed by every accepted member, in invitation order.
    ///
    /// Re-deriving this set from team state keeps the event registration
    /// update replayable after a partial failure.
    pub fn accepted_user_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.leader];
        ids.extend(
            self.members
                .iter()
                .filter(|(_, member)| member.status == MembershipStatus::Accepted)
                .map(|(user, _)| *user),
        );
        ids
    }
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        let members = value
            .members
            .into_iter()
            .map(|entry| {
                (
                    entry.user,
                    Membership {
                        status: entry.status,
                        invited_at: entry.invited_at,
                        responded_at: entry.responded_at,
                    },
                )
            })
            .collect();

        Self {
            id: value.id,
            name: value.name,
            event: value.event,
            leader: value.leader,
            members,
            min_members: value.min_members,
            max_members: value.max_members,
            phase: value.status,
            invite_code: value.invite_code,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Team> for TeamEntity {
    fn from(value: Team) -> Self {
        let members = value
            .members
            .into_iter()
            .map(|(user, member)| MembershipEntity {
                user,
                status: member.status,
                invited_at: member.invited_at,
                responded_at: member.responded_at,
            })
            .collect();

        Self {
            id: value.id,
            name: value.name,
            event: value.event,
            leader: value.leader,
            members,
            min_members: value.min_members,
            max_members: value.max_members,
            status: value.phase,
            invite_code: value.invite_code,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
