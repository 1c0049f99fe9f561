//! SQLite store for the library mirror, root playlists and credentials.
//!
//! One database file holds everything. A command opens a single
//! [`Connection`] at start-up and drops it on the way out, including on error
//! paths.

mod history;
mod library;

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::error::StoreError;

pub use history::{append_plays, last_played, latest_played_at};
pub use library::{
    artist_ids_without_metadata, replace_library, track_ids_without_features,
    upsert_artists, upsert_audio_features,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS library_tracks (
    track_id   TEXT PRIMARY KEY,
    track_name TEXT NOT NULL,
    date_added TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS track_artists (
    track_id  TEXT NOT NULL,
    artist_id TEXT NOT NULL,
    PRIMARY KEY (track_id, artist_id)
);

CREATE TABLE IF NOT EXISTS artists (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS artist_genres (
    artist_id TEXT NOT NULL,
    genre     TEXT NOT NULL,
    PRIMARY KEY (artist_id, genre)
);

CREATE TABLE IF NOT EXISTS track_audio_features (
    track_id         TEXT PRIMARY KEY,
    acousticness     REAL,
    danceability     REAL,
    duration_ms      INTEGER,
    energy           REAL,
    instrumentalness REAL,
    "key"            INTEGER,
    liveness         REAL,
    loudness         REAL,
    "mode"           INTEGER,
    speechiness      REAL,
    tempo            REAL,
    time_signature   INTEGER,
    valence          REAL
);

CREATE TABLE IF NOT EXISTS play_history (
    track_id  TEXT NOT NULL,
    played_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS play_history_track_played
    ON play_history (track_id, played_at);

CREATE TABLE IF NOT EXISTS root_playlists (
    name     TEXT NOT NULL,
    track_id TEXT NOT NULL,
    rotate   INTEGER NOT NULL,
    PRIMARY KEY (name, track_id)
);

CREATE TABLE IF NOT EXISTS credentials (
    service TEXT NOT NULL,
    creds   TEXT NOT NULL
);
"#;

/// A saved track as mirrored from the user's library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryTrack {
    pub track_id: String,
    pub name: String,
    pub date_added: NaiveDateTime,
    pub artist_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
}

/// One row of `track_audio_features`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioFeatureRecord {
    pub track_id: String,
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: i64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub key: i64,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: i64,
    pub speechiness: f64,
    pub tempo: f64,
    pub time_signature: i64,
    pub valence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub track_id: String,
    /// UTC, stored without a timezone.
    pub played_at: NaiveDateTime,
}

/// Opens (creating if needed) the database file and makes sure the schema
/// exists.
pub fn open(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Directory {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Opens a throwaway in-memory database with the full schema.
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
