pub mod admin;
pub mod error;
pub mod middleware;
pub mod portal;
pub mod state;
pub mod views;

use axum::{
    Router, middleware as layer,
    routing::{get, post, put},
};

use crate::middleware::{require_admin, require_auth, require_client};
use crate::state::AppState;

pub use error::ApiError;
pub use state::AppStateInner;

/// Every route of the service. Everything except `/health` needs a token.
pub fn router(state: AppState) -> Router {
    let portal = Router::new()
        .route("/portal/dashboard", get(portal::dashboard))
        .route("/portal/updates", get(portal::list_updates))
        .route("/portal/updates/{update_id}/read", post(portal::mark_read))
        .route("/portal/updates/{update_id}/reactions", post(portal::toggle_update_reaction))
        .route("/portal/posts", get(portal::list_posts))
        .route("/portal/posts/{post_id}/reactions", post(portal::toggle_post_reaction))
        .route("/portal/preferences/notifications", put(portal::set_notifications))
        .route("/portal/preferences/notifications/toggle", post(portal::toggle_notifications))
        .route_layer(layer::from_fn(require_client));

    let admin = Router::new()
        .route("/admin/clients", get(admin::list_clients))
        .route("/admin/clients/{client_id}", get(admin::client_detail))
        .route("/admin/clients/{client_id}/appointments", post(admin::create_appointment))
        .route("/admin/clients/{client_id}/updates", post(admin::create_update))
        .route("/admin/appointments/{appointment_id}/complete", post(admin::complete_appointment))
        .route("/admin/posts", get(admin::list_posts).post(admin::create_post))
        .route("/admin/posts/{post_id}/publish", post(admin::publish_post))
        .route_layer(layer::from_fn(require_admin));

    Router::new()
        .merge(portal)
        .merge(admin)
        .route_layer(layer::from_fn_with_state(state.clone(), require_auth))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::{Duration, FixedOffset, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use salon_db::Database;
    use salon_types::api::Claims;
    use salon_types::{Appointment, ClientUpdate, Profile, Role, UpdateCategory};

    use super::*;

    const SECRET: &str = "test-secret";

    fn profile(role: Role, name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            role,
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            next_appointment_date: None,
            notifications_enabled: true,
            created_at: Utc::now() - Duration::days(90),
        }
    }

    fn token(profile_id: Uuid) -> String {
        let claims = Claims {
            sub: profile_id,
            email: None,
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    fn setup() -> (AppState, Profile, Profile) {
        let db = Database::open_in_memory().unwrap();
        let admin = profile(Role::Admin, "Carla");
        let client = profile(Role::Client, "Ana");
        db.create_profile(&admin).unwrap();
        db.create_profile(&client).unwrap();
        let state = Arc::new(AppStateInner {
            db,
            jwt_secret: SECRET.to_string(),
            tz: FixedOffset::west_opt(3 * 3600).unwrap(),
        });
        (state, admin, client)
    }

    async fn send(state: &AppState, method: &str, uri: &str, who: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = who {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(id)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let (state, _, _) = setup();
        let (status, _) = send(&state, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_or_unknown_identity_is_unauthenticated() {
        let (state, _, _) = setup();
        let (status, body) = send(&state, "GET", "/portal/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");

        let (status, _) = send(&state, "GET", "/portal/dashboard", Some(Uuid::new_v4()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn roles_gate_their_routes() {
        let (state, admin, client) = setup();
        let (status, _) = send(&state, "GET", "/admin/clients", Some(client.id), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&state, "GET", "/portal/dashboard", Some(admin.id), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn booking_sets_status_and_countdown() {
        let (state, admin, client) = setup();
        let date = Utc::now() + Duration::days(10);
        let (status, _) = send(
            &state,
            "POST",
            &format!("/admin/clients/{}/appointments", client.id),
            Some(admin.id),
            Some(serde_json::json!({ "date": date, "kind": "tratamento" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&state, "GET", "/portal/dashboard", Some(client.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "HAS_UPCOMING");
        assert!(body["next_appointment"].is_object());
        assert!(body["next_appointment_countdown"].as_str().unwrap().starts_with("Falta"));

        let (_, clients) = send(&state, "GET", "/admin/clients", Some(admin.id), None).await;
        assert_eq!(clients[0]["status"], "HAS_UPCOMING");
    }

    #[tokio::test]
    async fn read_marking_and_reactions_flow() {
        let (state, admin, client) = setup();
        let update = ClientUpdate {
            id: Uuid::new_v4(),
            client_id: client.id,
            admin_id: admin.id,
            title: "Evolução".into(),
            content: "Fios mais fortes.".into(),
            category: UpdateCategory::Evolution,
            client_read_at: None,
            created_at: Utc::now(),
        };
        state.db.insert_update(&update, &[]).unwrap();

        let (_, timeline) = send(&state, "GET", "/portal/updates", Some(client.id), None).await;
        assert_eq!(timeline["unread_count"], 1);
        assert_eq!(timeline["groups"].as_array().unwrap().len(), 1);

        let read_uri = format!("/portal/updates/{}/read", update.id);
        let (_, first) = send(&state, "POST", &read_uri, Some(client.id), None).await;
        assert_eq!(first["marked"], true);
        let (_, second) = send(&state, "POST", &read_uri, Some(client.id), None).await;
        assert_eq!(second["marked"], false);

        let react_uri = format!("/portal/updates/{}/reactions", update.id);
        let like = Some(serde_json::json!({ "kind": "like" }));
        let (_, added) = send(&state, "POST", &react_uri, Some(client.id), like.clone()).await;
        assert_eq!(added["added"], true);
        assert_eq!(added["reactions"][0]["count"], 1);
        assert_eq!(added["reactions"][0]["viewer_reacted"], true);

        let (_, removed) = send(&state, "POST", &react_uri, Some(client.id), like).await;
        assert_eq!(removed["added"], false);
        assert!(removed["reactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_filter_is_a_bad_request() {
        let (state, _, client) = setup();
        let (status, _) = send(&state, "GET", "/portal/updates?category=hair", Some(client.id), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&state, "GET", "/portal/updates?category=all&year=all", Some(client.id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_clients() {
        let (state, admin, client) = setup();
        let (_, created) = send(
            &state,
            "POST",
            "/admin/posts",
            Some(admin.id),
            Some(serde_json::json!({ "title": "Rascunho", "content": "..." })),
        )
        .await;
        let post_id = created["id"].as_str().unwrap().to_string();

        let (_, posts) = send(&state, "GET", "/portal/posts", Some(client.id), None).await;
        assert!(posts.as_array().unwrap().is_empty());

        let react_uri = format!("/portal/posts/{}/reactions", post_id);
        let (status, _) = send(
            &state,
            "POST",
            &react_uri,
            Some(client.id),
            Some(serde_json::json!({ "kind": "celebrate" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, "POST", &format!("/admin/posts/{}/publish", post_id), Some(admin.id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, posts) = send(&state, "GET", "/portal/posts", Some(client.id), None).await;
        assert_eq!(posts.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn notification_toggle_persists() {
        let (state, _, client) = setup();
        let (status, body) = send(&state, "POST", "/portal/preferences/notifications/toggle", Some(client.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enabled"], false);
        assert!(!state.db.get_profile(client.id).unwrap().unwrap().notifications_enabled);

        let (_, body) = send(
            &state,
            "PUT",
            "/portal/preferences/notifications",
            Some(client.id),
            Some(serde_json::json!({ "enabled": true })),
        )
        .await;
        assert_eq!(body["enabled"], true);
    }

    #[tokio::test]
    async fn passed_booking_does_not_hide_the_next_one() {
        let (state, admin, client) = setup();
        let now = Utc::now();
        let booking = |date| Appointment {
            id: Uuid::new_v4(),
            client_id: client.id,
            date,
            kind: "tratamento".into(),
            completed: false,
            notes: None,
            created_at: now - Duration::days(30),
        };
        let missed = booking(now - Duration::hours(1));
        let later = booking(now + Duration::days(10));
        state.db.insert_appointment(&missed).unwrap();
        state.db.insert_appointment(&later).unwrap();
        // What the column held before the first booking's time passed.
        state.db.set_next_appointment_date(client.id, Some(missed.date)).unwrap();

        let (status, body) = send(&state, "GET", "/portal/dashboard", Some(client.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "HAS_UPCOMING");
        assert_eq!(body["next_appointment"]["id"], later.id.to_string());
        assert_eq!(body["countdown"], "Falta 1 semana");
        assert_eq!(body["countdown"], body["next_appointment_countdown"]);

        let stored = state.db.get_profile(client.id).unwrap().unwrap();
        assert_eq!(
            stored.next_appointment_date.map(|d| d.timestamp_micros()),
            Some(later.date.timestamp_micros())
        );

        // Stale again, seen from the admin list this time.
        state.db.set_next_appointment_date(client.id, Some(missed.date)).unwrap();
        let (_, clients) = send(&state, "GET", "/admin/clients", Some(admin.id), None).await;
        assert_eq!(clients[0]["status"], "HAS_UPCOMING");
        assert_eq!(clients[0]["countdown"], "Falta 1 semana");
    }

    #[tokio::test]
    async fn failed_preference_write_reports_and_keeps_value() {
        let (state, _, client) = setup();
        state
            .db
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER lock_preferences BEFORE UPDATE OF notifications_enabled ON profiles
                     BEGIN SELECT RAISE(ABORT, 'preferences are locked'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let (status, body) = send(&state, "POST", "/portal/preferences/notifications/toggle", Some(client.id), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("preferences are locked"));
        assert!(state.db.get_profile(client.id).unwrap().unwrap().notifications_enabled);
    }
}
