use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A stored enum column held a value this build does not know.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Profiles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// A user account: the therapist (admin) or one of her clients.
/// The role is fixed at creation and only ever read by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub next_appointment_date: Option<DateTime<Utc>>,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Appointments --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: DateTime<Utc>,
    /// Free-form service type, e.g. "avaliação" or "tratamento".
    pub kind: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// -- Client updates --

/// Category of a progress update. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpdateCategory {
    #[serde(rename = "evolucao")]
    Evolution,
    #[serde(rename = "rotina")]
    Routine,
    #[serde(rename = "recomendacao")]
    Recommendation,
    #[serde(rename = "agendamento")]
    Scheduling,
    #[serde(rename = "outro")]
    Other,
}

impl UpdateCategory {
    pub const ALL: [UpdateCategory; 5] = [
        Self::Evolution,
        Self::Routine,
        Self::Recommendation,
        Self::Scheduling,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Evolution => "evolucao",
            Self::Routine => "rotina",
            Self::Recommendation => "recomendacao",
            Self::Scheduling => "agendamento",
            Self::Other => "outro",
        }
    }
}

impl fmt::Display for UpdateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("update category", s))
    }
}

/// A note the therapist writes about one client's progress.
/// `client_read_at` goes from `None` to `Some` once and never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub id: Uuid,
    pub client_id: Uuid,
    pub admin_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: UpdateCategory,
    pub client_read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClientUpdate {
    pub fn is_read(&self) -> bool {
        self.client_read_at.is_some()
    }
}

/// File metadata attached to an update. Binary content lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub update_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// -- Posts --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// -- Reactions --

/// Reaction kinds in their canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Celebrate,
    Helpful,
    Question,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [Self::Like, Self::Celebrate, Self::Helpful, Self::Question];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Celebrate => "celebrate",
            Self::Helpful => "helpful",
            Self::Question => "question",
        }
    }

    /// Emoji shown next to the count.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Like => "❤️",
            Self::Celebrate => "🎉",
            Self::Helpful => "💡",
            Self::Question => "❓",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("reaction kind", s))
    }
}

/// The entity a reaction is attached to. Updates and posts keep their
/// reactions in separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum ReactionTarget {
    Update(Uuid),
    Post(Uuid),
}

impl ReactionTarget {
    pub fn id(self) -> Uuid {
        match self {
            Self::Update(id) | Self::Post(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub target: ReactionTarget,
    pub user_id: Uuid,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}
