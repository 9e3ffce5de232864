//! Admin dashboard: the therapist's cross-client views and write actions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use salon_core::{AppointmentPartition, UpdateFilter};
use salon_types::api::{
    CreateAppointmentRequest, CreatePostRequest, CreateUpdateRequest, CreatedResponse, UpdatesQuery,
};
use salon_types::{Appointment, Attachment, ClientUpdate, Post, Profile, Role};

use crate::error::ApiError;
use crate::state::{AppState, blocking};
use crate::views::{self, BookingSummary, PostView, Timeline};

#[derive(Debug, Serialize)]
pub struct ClientOverview {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub booking: BookingSummary,
}

#[derive(Debug, Serialize)]
pub struct ClientDetail {
    pub profile: Profile,
    pub booking: BookingSummary,
    pub appointments: AppointmentPartition,
    pub timeline: Timeline,
}

/// GET /admin/clients
pub async fn list_clients(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let clients = blocking(&state, move |db| {
        db.list_clients()?
            .into_iter()
            .map(|c| Ok((views::current_next_appointment(db, &c, now)?, c)))
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await?;

    let overview: Vec<ClientOverview> = clients
        .into_iter()
        .map(|(next, c)| ClientOverview {
            booking: BookingSummary::new(next, now, &state.tz),
            id: c.id,
            full_name: c.full_name,
            email: c.email,
            phone: c.phone,
        })
        .collect();

    Ok(Json(overview))
}

/// GET /admin/clients/{client_id}?category=&year=
pub async fn client_detail(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path(client_id): Path<Uuid>,
    Query(query): Query<UpdatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = UpdateFilter::parse(query.category.as_deref(), query.year.as_deref())?;
    let now = Utc::now();
    let tz = state.tz;
    let admin_id = admin.id;

    let loaded = blocking(&state, move |db| {
        let Some(profile) = find_client(db, client_id)? else {
            return Ok(None);
        };
        let appointments = views::appointment_partition(db, client_id, now)?;
        let next = views::reconcile_next_appointment(db, &profile, &appointments)?;
        let timeline = views::load_timeline(db, client_id, filter, admin_id, &tz)?;
        Ok(Some((profile, next, appointments, timeline)))
    })
    .await?;

    let (mut profile, next, appointments, timeline) = loaded.ok_or(ApiError::NotFound("client"))?;
    profile.next_appointment_date = next;
    Ok(Json(ClientDetail {
        booking: BookingSummary::new(next, now, &state.tz),
        profile,
        appointments,
        timeline,
    }))
}

/// POST /admin/clients/{client_id}/appointments
pub async fn create_appointment(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = req.kind.trim().to_string();
    if kind.is_empty() {
        return Err(ApiError::BadRequest("appointment kind is required".into()));
    }

    let now = Utc::now();
    let appointment = Appointment {
        id: Uuid::new_v4(),
        client_id,
        date: req.date,
        kind,
        completed: false,
        notes: req.notes.filter(|n| !n.trim().is_empty()),
        created_at: now,
    };
    let id = appointment.id;

    let created = blocking(&state, move |db| {
        if find_client(db, client_id)?.is_none() {
            return Ok(false);
        }
        db.insert_appointment(&appointment)?;
        views::refresh_next_appointment(db, client_id, now)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::NotFound("client"));
    }
    info!("Appointment {} booked for client {}", id, client_id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /admin/appointments/{appointment_id}/complete
pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();

    let next = blocking(&state, move |db| {
        let Some(appointment) = db.get_appointment(appointment_id)? else {
            return Ok(None);
        };
        db.complete_appointment(appointment_id)?;
        let next = views::refresh_next_appointment(db, appointment.client_id, now)?;
        Ok(Some(next))
    })
    .await?
    .ok_or(ApiError::NotFound("appointment"))?;

    Ok(Json(serde_json::json!({ "completed": true, "next_appointment_date": next })))
}

/// POST /admin/clients/{client_id}/updates
pub async fn create_update(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<CreateUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("update title is required".into()));
    }

    let now = Utc::now();
    let update = ClientUpdate {
        id: Uuid::new_v4(),
        client_id,
        admin_id: admin.id,
        title: req.title.trim().to_string(),
        content: req.content,
        category: req.category,
        client_read_at: None,
        created_at: now,
    };
    let attachments: Vec<Attachment> = req
        .attachments
        .into_iter()
        .map(|a| Attachment {
            id: Uuid::new_v4(),
            update_id: update.id,
            file_name: a.file_name,
            file_url: a.file_url,
            mime_type: a.mime_type,
            size_bytes: a.size_bytes,
            created_at: now,
        })
        .collect();
    let id = update.id;

    let created = blocking(&state, move |db| {
        if find_client(db, client_id)?.is_none() {
            return Ok(false);
        }
        db.insert_update(&update, &attachments)?;
        Ok(true)
    })
    .await?;

    if !created {
        return Err(ApiError::NotFound("client"));
    }
    info!("Update {} posted for client {}", id, client_id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /admin/posts — drafts included.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
) -> Result<impl IntoResponse, ApiError> {
    let admin_id = admin.id;
    let posts: Vec<PostView> = blocking(&state, move |db| {
        let posts = db.list_posts(false)?;
        views::post_views(db, posts, admin_id)
    })
    .await?;

    Ok(Json(posts))
}

/// POST /admin/posts
pub async fn create_post(
    State(state): State<AppState>,
    Extension(admin): Extension<Profile>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("post title is required".into()));
    }

    let now = Utc::now();
    let post = Post {
        id: Uuid::new_v4(),
        author_id: admin.id,
        title: req.title.trim().to_string(),
        content: req.content,
        published: req.publish,
        published_at: req.publish.then_some(now),
        created_at: now,
    };
    let id = post.id;

    blocking(&state, move |db| db.insert_post(&post)).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// POST /admin/posts/{post_id}/publish
pub async fn publish_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = blocking(&state, move |db| db.publish_post(post_id, Utc::now())).await?;
    if !found {
        return Err(ApiError::NotFound("post"));
    }
    info!("Post {} published", post_id);
    Ok(Json(serde_json::json!({ "published": true })))
}

fn find_client(db: &salon_db::Database, client_id: Uuid) -> anyhow::Result<Option<Profile>> {
    Ok(db.get_profile(client_id)?.filter(|p| p.role == Role::Client))
}
