/// Database row types — these map directly to SQLite rows.
/// Everything is still text here; `mapping` validates rows into the
/// typed entities of salon-types before anything else sees them.

pub struct ProfileRow {
    pub id: String,
    pub role: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub next_appointment_date: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: String,
}

pub struct AppointmentRow {
    pub id: String,
    pub client_id: String,
    pub date: String,
    pub kind: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

pub struct ClientUpdateRow {
    pub id: String,
    pub client_id: String,
    pub admin_id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub client_read_at: Option<String>,
    pub created_at: String,
}

pub struct AttachmentRow {
    pub id: String,
    pub update_id: String,
    pub file_name: String,
    pub file_url: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
}

/// A row of `update_reactions` or `post_reactions`; `target_id` is the
/// update or post id depending on the table it came from.
pub struct ReactionRow {
    pub target_id: String,
    pub user_id: String,
    pub kind: String,
    pub created_at: String,
}
