use std::collections::HashMap;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};

use super::PlayRecord;
use crate::error::StoreError;

/// Appends plays to the history log. Plays at or before the newest stored
/// `played_at` are skipped, so pulling the same page twice is harmless.
pub fn append_plays(conn: &mut Connection, plays: &[PlayRecord]) -> Result<usize, StoreError> {
    let newest = latest_played_at(conn)?;
    let tx = conn.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt =
            tx.prepare("INSERT INTO play_history (track_id, played_at) VALUES (?1, ?2)")?;
        for play in plays {
            if newest.is_some_and(|n| play.played_at <= n) {
                continue;
            }
            stmt.execute(params![play.track_id, play.played_at])?;
            inserted += 1;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Most recent play across the whole history, if any.
pub fn latest_played_at(conn: &Connection) -> Result<Option<NaiveDateTime>, StoreError> {
    let latest = conn
        .query_row("SELECT MAX(played_at) FROM play_history", [], |row| {
            row.get::<_, Option<NaiveDateTime>>(0)
        })
        .optional()?
        .flatten();
    Ok(latest)
}

/// Most recent play per track.
pub fn last_played(conn: &Connection) -> Result<HashMap<String, NaiveDateTime>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT track_id, MAX(played_at) FROM play_history GROUP BY track_id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<HashMap<String, NaiveDateTime>, _>>()?;
    Ok(rows)
}
