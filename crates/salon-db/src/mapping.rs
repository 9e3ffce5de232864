//! Validated conversion from raw rows to typed entities.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use salon_types::{
    Appointment, Attachment, ClientUpdate, Post, Profile, Reaction, ReactionTarget, UnknownVariant,
};

use crate::models::{AppointmentRow, AttachmentRow, ClientUpdateRow, PostRow, ProfileRow, ReactionRow};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("{table}.{column}: invalid id '{value}'")]
    Id {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("{table}.{column}: invalid timestamp '{value}'")]
    Timestamp {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("{table}: {source}")]
    Variant {
        table: &'static str,
        #[source]
        source: UnknownVariant,
    },
}

/// Canonical text form for stored timestamps. Fixed width, so text order
/// matches time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 and SQLite's `datetime('now')` form (naive UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .map(|ndt| ndt.and_utc())
            .ok()
    })
}

fn id(table: &'static str, column: &'static str, value: &str) -> Result<Uuid, MappingError> {
    value.parse().map_err(|_| MappingError::Id {
        table,
        column,
        value: value.to_string(),
    })
}

fn timestamp(table: &'static str, column: &'static str, value: &str) -> Result<DateTime<Utc>, MappingError> {
    parse_timestamp(value).ok_or_else(|| MappingError::Timestamp {
        table,
        column,
        value: value.to_string(),
    })
}

fn optional_timestamp(
    table: &'static str,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, MappingError> {
    value.map(|v| timestamp(table, column, v)).transpose()
}

impl TryFrom<ProfileRow> for Profile {
    type Error = MappingError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|source| MappingError::Variant { table: "profiles", source })?;

        // A bad next date must not break the page: treat it as "nothing booked".
        let next_appointment_date = row.next_appointment_date.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!("Corrupt next_appointment_date '{}' on profile '{}'", raw, row.id);
            }
            parsed
        });

        Ok(Profile {
            id: id("profiles", "id", &row.id)?,
            role,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            next_appointment_date,
            notifications_enabled: row.notifications_enabled,
            created_at: timestamp("profiles", "created_at", &row.created_at)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = MappingError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: id("appointments", "id", &row.id)?,
            client_id: id("appointments", "client_id", &row.client_id)?,
            date: timestamp("appointments", "date", &row.date)?,
            kind: row.kind,
            completed: row.completed,
            notes: row.notes,
            created_at: timestamp("appointments", "created_at", &row.created_at)?,
        })
    }
}

impl TryFrom<ClientUpdateRow> for ClientUpdate {
    type Error = MappingError;

    fn try_from(row: ClientUpdateRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(|source| MappingError::Variant { table: "client_updates", source })?;

        Ok(ClientUpdate {
            id: id("client_updates", "id", &row.id)?,
            client_id: id("client_updates", "client_id", &row.client_id)?,
            admin_id: id("client_updates", "admin_id", &row.admin_id)?,
            title: row.title,
            content: row.content,
            category,
            client_read_at: optional_timestamp(
                "client_updates",
                "client_read_at",
                row.client_read_at.as_deref(),
            )?,
            created_at: timestamp("client_updates", "created_at", &row.created_at)?,
        })
    }
}

impl TryFrom<AttachmentRow> for Attachment {
    type Error = MappingError;

    fn try_from(row: AttachmentRow) -> Result<Self, Self::Error> {
        Ok(Attachment {
            id: id("attachments", "id", &row.id)?,
            update_id: id("attachments", "update_id", &row.update_id)?,
            file_name: row.file_name,
            file_url: row.file_url,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            created_at: timestamp("attachments", "created_at", &row.created_at)?,
        })
    }
}

impl TryFrom<PostRow> for Post {
    type Error = MappingError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: id("posts", "id", &row.id)?,
            author_id: id("posts", "author_id", &row.author_id)?,
            title: row.title,
            content: row.content,
            published: row.published,
            published_at: optional_timestamp("posts", "published_at", row.published_at.as_deref())?,
            created_at: timestamp("posts", "created_at", &row.created_at)?,
        })
    }
}

/// Reaction rows carry no table tag of their own, so the caller supplies
/// the target constructor.
pub fn reaction_from_row(
    row: ReactionRow,
    table: &'static str,
    target: fn(Uuid) -> ReactionTarget,
) -> Result<Reaction, MappingError> {
    let kind = row
        .kind
        .parse()
        .map_err(|source| MappingError::Variant { table, source })?;

    Ok(Reaction {
        target: target(id(table, "target", &row.target_id)?),
        user_id: id(table, "user_id", &row.user_id)?,
        kind,
        created_at: timestamp(table, "created_at", &row.created_at)?,
    })
}
