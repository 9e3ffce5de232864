use std::sync::Arc;

use chrono::FixedOffset;

use salon_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Shared HS256 secret of the identity provider's tokens.
    pub jwt_secret: String,
    /// The practice's local offset; month grouping and countdowns use it.
    pub tz: FixedOffset,
}

/// Run a store call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db)).await?;
    Ok(result?)
}
