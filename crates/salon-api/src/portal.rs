//! Client portal: the signed-in client's own appointments, updates and posts.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use salon_core::{Countdown, OptimisticToggle, UpdateFilter};
use salon_types::api::{
    MarkReadResponse, NotificationPreferenceRequest, NotificationPreferenceResponse,
    ToggleReactionRequest, UpdatesQuery,
};
use salon_types::{Appointment, Profile, ReactionTarget};

use crate::error::ApiError;
use crate::state::{AppState, blocking};
use crate::views::{self, BookingSummary, ToggleReactionResponse};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub full_name: String,
    #[serde(flatten)]
    pub booking: BookingSummary,
    pub next_appointment: Option<Appointment>,
    pub next_appointment_countdown: Option<Countdown>,
    pub other_upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
    pub unread_updates: usize,
    pub notifications_enabled: bool,
}

/// GET /portal/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let client_id = viewer.id;
    let stored = viewer.clone();

    let (split, next, updates) = blocking(&state, move |db| {
        let split = views::appointment_partition(db, client_id, now)?;
        let next = views::reconcile_next_appointment(db, &stored, &split)?;
        let updates = db.list_updates_for_client(client_id)?;
        Ok((split, next, updates))
    })
    .await?;

    let booking = BookingSummary::new(next, now, &state.tz);

    Ok(Json(DashboardResponse {
        full_name: viewer.full_name,
        next_appointment: split.next().cloned(),
        next_appointment_countdown: booking.countdown,
        other_upcoming: split.other_upcoming().to_vec(),
        booking,
        past: split.past,
        unread_updates: salon_core::unread_count(&updates),
        notifications_enabled: viewer.notifications_enabled,
    }))
}

/// GET /portal/updates?category=&year=
pub async fn list_updates(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
    Query(query): Query<UpdatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = UpdateFilter::parse(query.category.as_deref(), query.year.as_deref())?;
    let tz = state.tz;
    let viewer_id = viewer.id;

    let timeline = blocking(&state, move |db| {
        views::load_timeline(db, viewer_id, filter, viewer_id, &tz)
    })
    .await?;

    Ok(Json(timeline))
}

/// POST /portal/updates/{update_id}/read
///
/// Sent once the update has stayed on screen long enough. Already-read and
/// unknown updates answer `marked: false`.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
    Path(update_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client_id = viewer.id;
    let marked = blocking(&state, move |db| {
        db.mark_update_read(update_id, client_id, Utc::now())
    })
    .await?;

    if marked {
        info!("Client {} read update {}", client_id, update_id);
    }
    Ok(Json(MarkReadResponse { marked }))
}

/// POST /portal/updates/{update_id}/reactions
pub async fn toggle_update_reaction(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
    Path(update_id): Path<Uuid>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.id;

    let outcome = blocking(&state, move |db| {
        let owned = db
            .get_update(update_id)?
            .is_some_and(|u| u.client_id == viewer_id);
        if !owned {
            return Ok(None);
        }
        let added = db.toggle_reaction(ReactionTarget::Update(update_id), viewer_id, req.kind, Utc::now())?;
        let rows = db.get_reactions_for_updates(&[update_id])?;
        Ok(Some((added, rows)))
    })
    .await?;

    let (added, rows) = outcome.ok_or(ApiError::NotFound("update"))?;
    let reactions = salon_core::summarize_by_target(&rows, Some(viewer_id))
        .remove(&update_id)
        .unwrap_or_default();

    Ok(Json(ToggleReactionResponse { added, reactions }))
}

/// GET /portal/posts — published posts only.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.id;
    let posts = blocking(&state, move |db| {
        let posts = db.list_posts(true)?;
        views::post_views(db, posts, viewer_id)
    })
    .await?;

    Ok(Json(posts))
}

/// POST /portal/posts/{post_id}/reactions — drafts answer 404.
pub async fn toggle_post_reaction(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
    Path(post_id): Path<Uuid>,
    Json(req): Json<ToggleReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer_id = viewer.id;

    let outcome = blocking(&state, move |db| {
        let visible = db.get_post(post_id)?.is_some_and(|p| p.published);
        if !visible {
            return Ok(None);
        }
        let added = db.toggle_reaction(ReactionTarget::Post(post_id), viewer_id, req.kind, Utc::now())?;
        let rows = db.get_reactions_for_posts(&[post_id])?;
        Ok(Some((added, rows)))
    })
    .await?;

    let (added, rows) = outcome.ok_or(ApiError::NotFound("post"))?;
    let reactions = salon_core::summarize_by_target(&rows, Some(viewer_id))
        .remove(&post_id)
        .unwrap_or_default();

    Ok(Json(ToggleReactionResponse { added, reactions }))
}

/// PUT /portal/preferences/notifications
pub async fn set_notifications(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
    Json(req): Json<NotificationPreferenceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let enabled = write_preference(&state, &viewer, Some(req.enabled)).await?;
    Ok(Json(NotificationPreferenceResponse { enabled }))
}

/// POST /portal/preferences/notifications/toggle
pub async fn toggle_notifications(
    State(state): State<AppState>,
    Extension(viewer): Extension<Profile>,
) -> Result<impl IntoResponse, ApiError> {
    let enabled = write_preference(&state, &viewer, None).await?;
    Ok(Json(NotificationPreferenceResponse { enabled }))
}

/// `None` flips the stored value. On failure the caller gets the store's
/// message and the stored value is untouched.
async fn write_preference(state: &AppState, viewer: &Profile, value: Option<bool>) -> Result<bool, ApiError> {
    let profile_id = viewer.id;
    let mut toggle = OptimisticToggle::new(viewer.notifications_enabled);
    let requested = value.unwrap_or(!toggle.shown());

    blocking(state, move |db| {
        toggle.apply(requested, |v| {
            if db.set_notifications_enabled(profile_id, v)? {
                Ok(())
            } else {
                Err(anyhow::anyhow!("Profile {} disappeared while saving preference", profile_id))
            }
        })
    })
    .await
}
