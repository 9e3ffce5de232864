//! View models shared by the portal and the admin dashboard.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use salon_core::{
    AppointmentPartition, ClientStatus, Countdown, Dated, MonthGroup, ReactionSummary, ReadState,
    UpdateFilter,
};
use salon_db::Database;
use salon_types::{Attachment, ClientUpdate, Post, Profile};

#[derive(Debug, Serialize)]
pub struct UpdateView {
    #[serde(flatten)]
    pub update: ClientUpdate,
    pub read_state: ReadState,
    pub reactions: Vec<ReactionSummary>,
    pub attachments: Vec<Attachment>,
}

impl Dated for UpdateView {
    fn created_at(&self) -> DateTime<Utc> {
        self.update.created_at
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub reactions: Vec<ReactionSummary>,
}

#[derive(Debug, Serialize)]
pub struct Timeline {
    pub groups: Vec<MonthGroup<UpdateView>>,
    /// Years on the unfiltered timeline, for the filter picker.
    pub years: Vec<i32>,
    pub unread_count: usize,
    pub total: usize,
}

/// Everything the dashboards show about one client's bookings.
#[derive(Debug, Serialize)]
pub struct BookingSummary {
    pub status: ClientStatus,
    pub next_appointment_date: Option<DateTime<Utc>>,
    pub countdown: Option<Countdown>,
}

impl BookingSummary {
    /// `next` must already be current as of `now`; see
    /// [`current_next_appointment`].
    pub fn new(next: Option<DateTime<Utc>>, now: DateTime<Utc>, tz: &FixedOffset) -> Self {
        let status = salon_core::client_status(next, now);
        let countdown = match status {
            ClientStatus::HasUpcoming => next.map(|at| salon_core::countdown(at, now, tz)),
            ClientStatus::NoUpcoming => None,
        };
        Self {
            status,
            next_appointment_date: next,
            countdown,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleReactionResponse {
    pub added: bool,
    pub reactions: Vec<ReactionSummary>,
}

/// Load a client's filtered timeline with reactions and attachments, grouped
/// by month. Runs on the blocking pool.
pub fn load_timeline(
    db: &Database,
    client_id: Uuid,
    filter: UpdateFilter,
    viewer: Uuid,
    tz: &FixedOffset,
) -> anyhow::Result<Timeline> {
    let updates = db.list_updates_for_client(client_id)?;
    let years = salon_core::available_years(&updates, tz);
    let unread_count = salon_core::unread_count(&updates);

    let selected: Vec<ClientUpdate> = salon_core::filter_updates(&updates, &filter, tz)
        .into_iter()
        .cloned()
        .collect();
    let ids: Vec<Uuid> = selected.iter().map(|u| u.id).collect();

    let reactions = db.get_reactions_for_updates(&ids)?;
    let mut summaries = salon_core::summarize_by_target(&reactions, Some(viewer));

    let mut attachments: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
    for a in db.get_attachments_for_updates(&ids)? {
        attachments.entry(a.update_id).or_default().push(a);
    }

    let total = selected.len();
    let views = selected.into_iter().map(|update| UpdateView {
        read_state: ReadState::from(update.client_read_at),
        reactions: summaries.remove(&update.id).unwrap_or_default(),
        attachments: attachments.remove(&update.id).unwrap_or_default(),
        update,
    });

    Ok(Timeline {
        groups: salon_core::group_by_month(views, tz),
        years,
        unread_count,
        total,
    })
}

pub fn post_views(db: &Database, posts: Vec<Post>, viewer: Uuid) -> anyhow::Result<Vec<PostView>> {
    let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
    let reactions = db.get_reactions_for_posts(&ids)?;
    let mut summaries = salon_core::summarize_by_target(&reactions, Some(viewer));

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            reactions: summaries.remove(&post.id).unwrap_or_default(),
            post,
        })
        .collect())
}

/// Keep `profiles.next_appointment_date` in step with the appointment list.
pub fn refresh_next_appointment(
    db: &Database,
    client_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let appointments = db.list_appointments(client_id)?;
    let next = salon_core::next_appointment_date(&appointments, now);
    db.set_next_appointment_date(client_id, next)?;
    Ok(next)
}

/// The client's next appointment date as of `now`. A stored date that has
/// already passed is recomputed from the appointment list and written back.
pub fn current_next_appointment(
    db: &Database,
    profile: &Profile,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    match profile.next_appointment_date {
        Some(at) if at < now => refresh_next_appointment(db, profile.id, now),
        stored => Ok(stored),
    }
}

/// Write the partition's next date back when the stored column disagrees.
pub fn reconcile_next_appointment(
    db: &Database,
    profile: &Profile,
    split: &AppointmentPartition,
) -> anyhow::Result<Option<DateTime<Utc>>> {
    let next = split.next().map(|a| a.date);
    if next != profile.next_appointment_date {
        debug!(
            "Refreshing stale next appointment for {}: {:?} -> {:?}",
            profile.id, profile.next_appointment_date, next
        );
        db.set_next_appointment_date(profile.id, next)?;
    }
    Ok(next)
}

pub fn appointment_partition(
    db: &Database,
    client_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<AppointmentPartition> {
    Ok(salon_core::partition(db.list_appointments(client_id)?, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use salon_types::Role;

    #[test]
    fn tomorrow_morning_booking() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        // Today 09:00 local, appointment tomorrow 10:00 local.
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let next = Utc.with_ymd_and_hms(2026, 10, 17, 13, 0, 0).unwrap();
        let profile = Profile {
            id: Uuid::new_v4(),
            role: Role::Client,
            full_name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: None,
            next_appointment_date: Some(next),
            notifications_enabled: true,
            created_at: now,
        };

        let summary = BookingSummary::new(profile.next_appointment_date, now, &tz);
        assert_eq!(summary.status, ClientStatus::HasUpcoming);
        assert_eq!(summary.countdown.map(|c| c.to_string()).as_deref(), Some("Amanhã"));
    }

    #[test]
    fn past_booking_has_no_countdown() {
        let tz = FixedOffset::west_opt(3 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let profile = Profile {
            id: Uuid::new_v4(),
            role: Role::Client,
            full_name: "Bia".into(),
            email: "bia@example.com".into(),
            phone: None,
            next_appointment_date: Some(now - chrono::Duration::days(2)),
            notifications_enabled: true,
            created_at: now,
        };

        let summary = BookingSummary::new(profile.next_appointment_date, now, &tz);
        assert_eq!(summary.status, ClientStatus::NoUpcoming);
        assert!(summary.countdown.is_none());
    }
}
