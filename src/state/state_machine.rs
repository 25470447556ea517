use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Aggregate lifecycle phase of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamPhase {
    /// Team is collecting members and has not reached its size bounds yet.
    Forming,
    /// Accepted headcount lies within the event's size bounds.
    Complete,
    /// Team has been registered for the event. Terminal: membership is closed.
    Registered,
}

impl fmt::Display for TeamPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TeamPhase::Forming => "forming",
            TeamPhase::Complete => "complete",
            TeamPhase::Registered => "registered",
        };
        f.write_str(label)
    }
}

/// Lifecycle of a single invited member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Invited, no response recorded yet.
    Pending,
    /// User accepted the invitation. Terminal.
    Accepted,
    /// User declined the invitation. Terminal, entry stays for audit display.
    Declined,
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Accepted => "accepted",
            MembershipStatus::Declined => "declined",
        };
        f.write_str(label)
    }
}

/// Reply an invited user can give to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InviteReply {
    /// Join the team.
    Accept,
    /// Turn the invitation down.
    Decline,
}

impl InviteReply {
    /// Membership status this reply resolves a pending invitation to.
    pub fn resolved_status(self) -> MembershipStatus {
        match self {
            InviteReply::Accept => MembershipStatus::Accepted,
            InviteReply::Decline => MembershipStatus::Declined,
        }
    }
}

/// Error returned when a response cannot be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RespondError {
    /// The responding user has no membership entry on the team.
    #[error("no invitation found for this user")]
    NotInvited,
    /// The invitation was already accepted or declined; responses are one-shot.
    #[error("invitation already resolved as {0}")]
    AlreadyResolved(MembershipStatus),
    /// The team is registered; no further responses are accepted.
    #[error("team is registered; membership is closed")]
    MembershipClosed,
    /// Accepting would push the accepted headcount above the maximum.
    #[error("team is already at maximum capacity")]
    TeamFull,
}

/// Error returned when a team cannot be promoted to registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The team is already registered.
    #[error("team is already registered")]
    AlreadyRegistered,
    /// The accepted headcount does not satisfy the size bounds yet.
    #[error("team is not complete (currently {0})")]
    NotComplete(TeamPhase),
}

/// Resolve a pending membership status against a reply.
///
/// Terminal statuses reject any further reply so a second response is a
/// conflict instead of a silent overwrite.
pub fn resolve_membership(
    status: MembershipStatus,
    reply: InviteReply,
) -> Result<MembershipStatus, RespondError> {
    match status {
        MembershipStatus::Pending => Ok(reply.resolved_status()),
        resolved => Err(RespondError::AlreadyResolved(resolved)),
    }
}

/// Recompute the team phase after a membership change.
///
/// The leader always counts as one member, so the headcount is
/// `accepted + 1`. The bounds are the snapshot stored on the team, never the
/// live event configuration. `Registered` is terminal and never regresses.
pub fn phase_after_response(
    current: TeamPhase,
    accepted: usize,
    min_members: u32,
    max_members: u32,
) -> TeamPhase {
    if current == TeamPhase::Registered {
        return TeamPhase::Registered;
    }

    let headcount = accepted + 1;
    if headcount >= min_members as usize && headcount <= max_members as usize {
        TeamPhase::Complete
    } else if current == TeamPhase::Complete {
        // Accepted responses are terminal, so the headcount never shrinks;
        // a team that once satisfied the bounds keeps its phase.
        TeamPhase::Complete
    } else {
        TeamPhase::Forming
    }
}

/// Validate the promotion of a team into the registered phase.
pub fn phase_for_registration(current: TeamPhase) -> Result<TeamPhase, RegisterError> {
    match current {
        TeamPhase::Complete => Ok(TeamPhase::Registered),
        TeamPhase::Registered => Err(RegisterError::AlreadyRegistered),
        other => Err(RegisterError::NotComplete(other)),
    }
}
