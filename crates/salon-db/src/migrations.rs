use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS profiles (
            id                      TEXT PRIMARY KEY,
            role                    TEXT NOT NULL CHECK (role IN ('admin', 'client')),
            full_name               TEXT NOT NULL,
            email                   TEXT NOT NULL UNIQUE,
            phone                   TEXT,
            next_appointment_date   TEXT,
            notifications_enabled   INTEGER NOT NULL DEFAULT 1,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS appointments (
            id          TEXT PRIMARY KEY,
            client_id   TEXT NOT NULL REFERENCES profiles(id),
            date        TEXT NOT NULL,
            kind        TEXT NOT NULL,
            completed   INTEGER NOT NULL DEFAULT 0,
            notes       TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_appointments_client
            ON appointments(client_id, date);

        CREATE TABLE IF NOT EXISTS client_updates (
            id              TEXT PRIMARY KEY,
            client_id       TEXT NOT NULL REFERENCES profiles(id),
            admin_id        TEXT NOT NULL REFERENCES profiles(id),
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            category        TEXT NOT NULL,
            client_read_at  TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_client_updates_client
            ON client_updates(client_id, created_at);

        CREATE TABLE IF NOT EXISTS attachments (
            id          TEXT PRIMARY KEY,
            update_id   TEXT NOT NULL REFERENCES client_updates(id) ON DELETE CASCADE,
            file_name   TEXT NOT NULL,
            file_url    TEXT NOT NULL,
            mime_type   TEXT,
            size_bytes  INTEGER,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_attachments_update
            ON attachments(update_id);

        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            author_id       TEXT NOT NULL REFERENCES profiles(id),
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            published       INTEGER NOT NULL DEFAULT 0,
            published_at    TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per (entity, user, kind): presence is the reaction.
        CREATE TABLE IF NOT EXISTS update_reactions (
            update_id   TEXT NOT NULL REFERENCES client_updates(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES profiles(id),
            kind        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (update_id, user_id, kind)
        );

        CREATE TABLE IF NOT EXISTS post_reactions (
            post_id     TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES profiles(id),
            kind        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (post_id, user_id, kind)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
