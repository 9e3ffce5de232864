use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use tracing::debug;
use uuid::Uuid;

use salon_types::{Reaction, ReactionKind, ReactionTarget};

use crate::Database;
use crate::mapping::{format_timestamp, reaction_from_row};
use crate::models::ReactionRow;
use crate::queries::placeholders;

/// Table and foreign-key column holding reactions for a target kind.
fn table_for(target: ReactionTarget) -> (&'static str, &'static str) {
    match target {
        ReactionTarget::Update(_) => ("update_reactions", "update_id"),
        ReactionTarget::Post(_) => ("post_reactions", "post_id"),
    }
}

impl Database {
    /// Toggle a reaction: removes it if present, inserts it if not.
    /// Returns true when the reaction was added.
    ///
    /// Insert-or-delete runs inside one immediate transaction under the
    /// connection lock, so a double submission flips twice instead of
    /// leaving duplicates or losing a toggle.
    pub fn toggle_reaction(
        &self,
        target: ReactionTarget,
        user_id: Uuid,
        kind: ReactionKind,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let (table, column) = table_for(target);
        let target_id = target.id().to_string();
        let user_id = user_id.to_string();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let inserted = tx.execute(
                &format!(
                    "INSERT INTO {table} ({column}, user_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT ({column}, user_id, kind) DO NOTHING"
                ),
                rusqlite::params![target_id, user_id, kind.as_str(), format_timestamp(at)],
            )?;

            let added = if inserted == 1 {
                true
            } else {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE {column} = ?1 AND user_id = ?2 AND kind = ?3"),
                    rusqlite::params![target_id, user_id, kind.as_str()],
                )?;
                false
            };

            tx.commit()?;
            debug!(
                "Reaction {} {} on {} {} by {}",
                kind.as_str(),
                if added { "added" } else { "removed" },
                table,
                target_id,
                user_id
            );
            Ok(added)
        })
    }

    /// Batch-fetch reactions for a set of updates.
    pub fn get_reactions_for_updates(&self, update_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        self.get_reactions(update_ids, ReactionTarget::Update)
    }

    /// Batch-fetch reactions for a set of posts.
    pub fn get_reactions_for_posts(&self, post_ids: &[Uuid]) -> Result<Vec<Reaction>> {
        self.get_reactions(post_ids, ReactionTarget::Post)
    }

    fn get_reactions(&self, ids: &[Uuid], target: fn(Uuid) -> ReactionTarget) -> Result<Vec<Reaction>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let (table, column) = table_for(target(Uuid::nil()));

        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {column}, user_id, kind, created_at FROM {table} WHERE {column} IN ({}) ORDER BY created_at ASC",
                placeholders(ids.len())
            );
            let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
                    Ok(ReactionRow {
                        target_id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| reaction_from_row(row, table, target))
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
