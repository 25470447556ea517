use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{EventEntity, MembershipEntity, ParticipationType, TeamEntity, UserEntity};
use crate::state::state_machine::{MembershipStatus, TeamPhase};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    event: Uuid,
    leader: Uuid,
    members: Vec<MongoMembershipDocument>,
    min_members: u32,
    max_members: u32,
    status: TeamPhase,
    invite_code: String,
    description: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMembershipDocument {
    user: Uuid,
    status: MembershipStatus,
    invited_at: DateTime,
    responded_at: Option<DateTime>,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            event: value.event,
            leader: value.leader,
            members: value.members.into_iter().map(Into::into).collect(),
            min_members: value.min_members,
            max_members: value.max_members,
            status: value.status,
            invite_code: value.invite_code,
            description: value.description,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            event: value.event,
            leader: value.leader,
            members: value.members.into_iter().map(Into::into).collect(),
            min_members: value.min_members,
            max_members: value.max_members,
            status: value.status,
            invite_code: value.invite_code,
            description: value.description,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

impl From<MembershipEntity> for MongoMembershipDocument {
    fn from(value: MembershipEntity) -> Self {
        Self {
            user: value.user,
            status: value.status,
            invited_at: DateTime::from_system_time(value.invited_at),
            responded_at: value.responded_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoMembershipDocument> for MembershipEntity {
    fn from(value: MongoMembershipDocument) -> Self {
        Self {
            user: value.user,
            status: value.status,
            invited_at: value.invited_at.to_system_time(),
            responded_at: value.responded_at.map(|at| at.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    description: Option<String>,
    date: Option<DateTime>,
    venue: Option<String>,
    participation: ParticipationType,
    min_team_size: u32,
    max_team_size: u32,
    #[serde(default)]
    registered_users: Vec<Uuid>,
}

impl From<EventEntity> for MongoEventDocument {
    fn from(value: EventEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            date: value.date.map(DateTime::from_system_time),
            venue: value.venue,
            participation: value.participation,
            min_team_size: value.min_team_size,
            max_team_size: value.max_team_size,
            registered_users: value.registered_users,
        }
    }
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            date: value.date.map(|at| at.to_system_time()),
            venue: value.venue,
            participation: value.participation,
            min_team_size: value.min_team_size,
            max_team_size: value.max_team_size,
            registered_users: value.registered_users,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    email: String,
    #[serde(default)]
    verified: bool,
    department: Option<String>,
    year_of_study: Option<String>,
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            verified: value.verified,
            department: value.department,
            year_of_study: value.year_of_study,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
