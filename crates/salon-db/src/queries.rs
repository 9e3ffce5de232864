use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use salon_types::{Appointment, Attachment, ClientUpdate, Post, Profile, Role};

use crate::Database;
use crate::mapping::{MappingError, format_timestamp};
use crate::models::{AppointmentRow, AttachmentRow, ClientUpdateRow, PostRow, ProfileRow};

const PROFILE_COLUMNS: &str =
    "id, role, full_name, email, phone, next_appointment_date, notifications_enabled, created_at";
const APPOINTMENT_COLUMNS: &str = "id, client_id, date, kind, completed, notes, created_at";
const UPDATE_COLUMNS: &str =
    "id, client_id, admin_id, title, content, category, client_read_at, created_at";
const ATTACHMENT_COLUMNS: &str =
    "id, update_id, file_name, file_url, mime_type, size_bytes, created_at";
const POST_COLUMNS: &str = "id, author_id, title, content, published, published_at, created_at";

impl Database {
    // -- Profiles --

    pub fn create_profile(&self, profile: &Profile) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, role, full_name, email, phone, next_appointment_date, notifications_enabled, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    profile.id.to_string(),
                    profile.role.as_str(),
                    profile.full_name,
                    profile.email,
                    profile.phone,
                    profile.next_appointment_date.map(format_timestamp),
                    profile.notifications_enabled,
                    format_timestamp(profile.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], read_profile)
                .optional()
        })?;
        Ok(row.map(Profile::try_from).transpose()?)
    }

    /// All client profiles, alphabetically. Admin-only read across profiles.
    pub fn list_clients(&self) -> Result<Vec<Profile>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ?1 ORDER BY full_name COLLATE NOCASE"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([Role::Client.as_str()], read_profile)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        validate(rows)
    }

    pub fn set_next_appointment_date(&self, client_id: Uuid, next: Option<DateTime<Utc>>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE profiles SET next_appointment_date = ?1 WHERE id = ?2",
                rusqlite::params![next.map(format_timestamp), client_id.to_string()],
            )?;
            Ok(())
        })
    }

    /// Returns false when no such profile exists.
    pub fn set_notifications_enabled(&self, profile_id: Uuid, enabled: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE profiles SET notifications_enabled = ?1 WHERE id = ?2",
                rusqlite::params![enabled, profile_id.to_string()],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Appointments --

    pub fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO appointments (id, client_id, date, kind, completed, notes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    appointment.id.to_string(),
                    appointment.client_id.to_string(),
                    format_timestamp(appointment.date),
                    appointment.kind,
                    appointment.completed,
                    appointment.notes,
                    format_timestamp(appointment.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row = self.with_conn(|conn| {
            let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], read_appointment)
                .optional()
        })?;
        Ok(row.map(Appointment::try_from).transpose()?)
    }

    pub fn list_appointments(&self, client_id: Uuid) -> Result<Vec<Appointment>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE client_id = ?1 ORDER BY date ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([client_id.to_string()], read_appointment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        validate(rows)
    }

    /// Returns false when the appointment does not exist.
    pub fn complete_appointment(&self, id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE appointments SET completed = 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(changed == 1)
        })
    }

    // -- Client updates --

    /// Insert an update together with its attachment metadata.
    pub fn insert_update(&self, update: &ClientUpdate, attachments: &[Attachment]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO client_updates (id, client_id, admin_id, title, content, category, client_read_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    update.id.to_string(),
                    update.client_id.to_string(),
                    update.admin_id.to_string(),
                    update.title,
                    update.content,
                    update.category.as_str(),
                    update.client_read_at.map(format_timestamp),
                    format_timestamp(update.created_at),
                ],
            )?;
            for a in attachments {
                tx.execute(
                    "INSERT INTO attachments (id, update_id, file_name, file_url, mime_type, size_bytes, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        a.id.to_string(),
                        a.update_id.to_string(),
                        a.file_name,
                        a.file_url,
                        a.mime_type,
                        a.size_bytes,
                        format_timestamp(a.created_at),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_update(&self, id: Uuid) -> Result<Option<ClientUpdate>> {
        let row = self.with_conn(|conn| {
            let sql = format!("SELECT {UPDATE_COLUMNS} FROM client_updates WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], read_update)
                .optional()
        })?;
        Ok(row.map(ClientUpdate::try_from).transpose()?)
    }

    /// A client's updates, newest first.
    pub fn list_updates_for_client(&self, client_id: Uuid) -> Result<Vec<ClientUpdate>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {UPDATE_COLUMNS} FROM client_updates WHERE client_id = ?1 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([client_id.to_string()], read_update)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        validate(rows)
    }

    /// Set `client_read_at` if, and only if, it is still null and the update
    /// belongs to `client_id`. Returns whether a row changed; already-read
    /// and unknown updates are a silent no-op.
    pub fn mark_update_read(&self, update_id: Uuid, client_id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE client_updates SET client_read_at = ?1
                 WHERE id = ?2 AND client_id = ?3 AND client_read_at IS NULL",
                rusqlite::params![format_timestamp(at), update_id.to_string(), client_id.to_string()],
            )?;
            Ok(changed == 1)
        })
    }

    /// Batch-fetch attachment metadata for a set of updates.
    pub fn get_attachments_for_updates(&self, update_ids: &[Uuid]) -> Result<Vec<Attachment>> {
        if update_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE update_id IN ({}) ORDER BY created_at ASC",
                placeholders(update_ids.len())
            );
            let ids: Vec<String> = update_ids.iter().map(Uuid::to_string).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), read_attachment)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        validate(rows)
    }

    // -- Posts --

    pub fn insert_post(&self, post: &Post) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, title, content, published, published_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    post.id.to_string(),
                    post.author_id.to_string(),
                    post.title,
                    post.content,
                    post.published,
                    post.published_at.map(format_timestamp),
                    format_timestamp(post.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        let row = self.with_conn(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
            conn.query_row(&sql, [id.to_string()], read_post)
                .optional()
        })?;
        Ok(row.map(Post::try_from).transpose()?)
    }

    /// Newest first. With `published_only`, drafts never leave the store.
    pub fn list_posts(&self, published_only: bool) -> Result<Vec<Post>> {
        let rows = self.with_conn(|conn| {
            let filter = if published_only { "WHERE published = 1" } else { "" };
            let sql = format!(
                "SELECT {POST_COLUMNS} FROM posts {filter} ORDER BY COALESCE(published_at, created_at) DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], read_post)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        validate(rows)
    }

    /// Publishing an already published post keeps its original date.
    pub fn publish_post(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET published = 1, published_at = COALESCE(published_at, ?1) WHERE id = ?2",
                rusqlite::params![format_timestamp(at), id.to_string()],
            )?;
            Ok(changed == 1)
        })
    }
}

fn validate<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = MappingError>,
{
    Ok(rows
        .into_iter()
        .map(T::try_from)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

pub(crate) fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn read_profile(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        role: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        next_appointment_date: row.get(5)?,
        notifications_enabled: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn read_appointment(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        date: row.get(2)?,
        kind: row.get(3)?,
        completed: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn read_update(row: &Row<'_>) -> rusqlite::Result<ClientUpdateRow> {
    Ok(ClientUpdateRow {
        id: row.get(0)?,
        client_id: row.get(1)?,
        admin_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        category: row.get(5)?,
        client_read_at: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn read_attachment(row: &Row<'_>) -> rusqlite::Result<AttachmentRow> {
    Ok(AttachmentRow {
        id: row.get(0)?,
        update_id: row.get(1)?,
        file_name: row.get(2)?,
        file_url: row.get(3)?,
        mime_type: row.get(4)?,
        size_bytes: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn read_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        published: row.get(4)?,
        published_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use salon_types::UpdateCategory;

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    pub(crate) fn profile(role: Role, name: &str) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            role,
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            next_appointment_date: None,
            notifications_enabled: true,
            created_at: now() - Duration::days(100),
        }
    }

    pub(crate) fn update(client: &Profile, admin: &Profile, at: DateTime<Utc>) -> ClientUpdate {
        ClientUpdate {
            id: Uuid::new_v4(),
            client_id: client.id,
            admin_id: admin.id,
            title: "Evolução do tratamento".into(),
            content: "Couro cabeludo menos oleoso.".into(),
            category: UpdateCategory::Evolution,
            client_read_at: None,
            created_at: at,
        }
    }

    pub(crate) fn seeded() -> (Database, Profile, Profile) {
        let db = Database::open_in_memory().unwrap();
        let admin = profile(Role::Admin, "Carla");
        let client = profile(Role::Client, "Ana");
        db.create_profile(&admin).unwrap();
        db.create_profile(&client).unwrap();
        (db, admin, client)
    }

    #[test]
    fn profile_roundtrip_and_missing() {
        let (db, admin, client) = seeded();
        let loaded = db.get_profile(client.id).unwrap().unwrap();
        assert_eq!(loaded.full_name, "Ana");
        assert_eq!(loaded.role, Role::Client);
        assert!(db.get_profile(Uuid::new_v4()).unwrap().is_none());

        let clients = db.list_clients().unwrap();
        assert_eq!(clients.len(), 1);
        assert_ne!(clients[0].id, admin.id);
    }

    #[test]
    fn mark_read_is_one_way() {
        let (db, admin, client) = seeded();
        let u = update(&client, &admin, now() - Duration::days(1));
        db.insert_update(&u, &[]).unwrap();

        assert!(db.mark_update_read(u.id, client.id, now()).unwrap());
        let first = db.get_update(u.id).unwrap().unwrap().client_read_at;
        assert_eq!(first, Some(now()));

        // Second mark leaves the original timestamp in place.
        assert!(!db.mark_update_read(u.id, client.id, now() + Duration::hours(1)).unwrap());
        let second = db.get_update(u.id).unwrap().unwrap().client_read_at;
        assert_eq!(second, first);
    }

    #[test]
    fn mark_read_ignores_unknown_and_foreign_updates() {
        let (db, admin, client) = seeded();
        assert!(!db.mark_update_read(Uuid::new_v4(), client.id, now()).unwrap());

        let u = update(&client, &admin, now());
        db.insert_update(&u, &[]).unwrap();
        assert!(!db.mark_update_read(u.id, admin.id, now()).unwrap());
        assert!(db.get_update(u.id).unwrap().unwrap().client_read_at.is_none());
    }

    #[test]
    fn updates_list_newest_first_with_attachments() {
        let (db, admin, client) = seeded();
        let older = update(&client, &admin, now() - Duration::days(40));
        let newer = update(&client, &admin, now() - Duration::days(2));
        let attachment = Attachment {
            id: Uuid::new_v4(),
            update_id: newer.id,
            file_name: "antes.jpg".into(),
            file_url: "https://files.example.com/antes.jpg".into(),
            mime_type: Some("image/jpeg".into()),
            size_bytes: Some(120_000),
            created_at: now(),
        };
        db.insert_update(&older, &[]).unwrap();
        db.insert_update(&newer, &[attachment]).unwrap();

        let listed = db.list_updates_for_client(client.id).unwrap();
        assert_eq!(listed.iter().map(|u| u.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let attachments = db.get_attachments_for_updates(&[older.id, newer.id]).unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].update_id, newer.id);
        assert!(db.get_attachments_for_updates(&[]).unwrap().is_empty());
    }

    #[test]
    fn appointments_complete_and_next_date() {
        let (db, _admin, client) = seeded();
        let appt = Appointment {
            id: Uuid::new_v4(),
            client_id: client.id,
            date: now() + Duration::days(1),
            kind: "tratamento".into(),
            completed: false,
            notes: None,
            created_at: now(),
        };
        db.insert_appointment(&appt).unwrap();
        db.set_next_appointment_date(client.id, Some(appt.date)).unwrap();
        assert_eq!(
            db.get_profile(client.id).unwrap().unwrap().next_appointment_date,
            Some(appt.date)
        );

        assert!(db.complete_appointment(appt.id).unwrap());
        assert!(db.get_appointment(appt.id).unwrap().unwrap().completed);
        assert!(!db.complete_appointment(Uuid::new_v4()).unwrap());

        db.set_next_appointment_date(client.id, None).unwrap();
        assert!(db.get_profile(client.id).unwrap().unwrap().next_appointment_date.is_none());
        assert_eq!(db.list_appointments(client.id).unwrap().len(), 1);
    }

    #[test]
    fn notification_preference_updates_single_row() {
        let (db, _admin, client) = seeded();
        assert!(db.set_notifications_enabled(client.id, false).unwrap());
        assert!(!db.get_profile(client.id).unwrap().unwrap().notifications_enabled);
        assert!(!db.set_notifications_enabled(Uuid::new_v4(), true).unwrap());
    }

    #[test]
    fn drafts_stay_out_of_published_listing() {
        let (db, admin, _client) = seeded();
        let draft = Post {
            id: Uuid::new_v4(),
            author_id: admin.id,
            title: "Rascunho".into(),
            content: String::new(),
            published: false,
            published_at: None,
            created_at: now(),
        };
        db.insert_post(&draft).unwrap();
        assert!(db.list_posts(true).unwrap().is_empty());
        assert_eq!(db.list_posts(false).unwrap().len(), 1);

        assert!(db.publish_post(draft.id, now()).unwrap());
        assert!(db.publish_post(draft.id, now() + Duration::days(1)).unwrap());
        let published = db.list_posts(true).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].published_at, Some(now()));
    }
}
