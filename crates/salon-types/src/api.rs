use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ReactionKind, UpdateCategory};

// -- Token claims --

/// Claims carried by the bearer token the identity provider issues.
/// `sub` is the profile id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

// -- Reactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleReactionRequest {
    pub kind: ReactionKind,
}

// -- Preferences --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationPreferenceRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationPreferenceResponse {
    pub enabled: bool,
}

// -- Read tracking --

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    /// False when the update was already read or does not belong to the caller.
    pub marked: bool,
}

// -- Updates --

/// Query string for the update timeline. `"all"` or absence means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatesQuery {
    pub category: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_url: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUpdateRequest {
    pub title: String,
    pub content: String,
    pub category: UpdateCategory,
    #[serde(default)]
    pub attachments: Vec<NewAttachment>,
}

// -- Appointments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAppointmentRequest {
    pub date: DateTime<Utc>,
    pub kind: String,
    pub notes: Option<String>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}
