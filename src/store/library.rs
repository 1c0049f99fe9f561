use rusqlite::{Connection, params};

use super::{ArtistRecord, AudioFeatureRecord, LibraryTrack};
use crate::error::StoreError;

/// Replaces the mirrored library wholesale: `library_tracks` and
/// `track_artists` are cleared and refilled in one transaction.
pub fn replace_library(conn: &mut Connection, tracks: &[LibraryTrack]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM track_artists", [])?;
    tx.execute("DELETE FROM library_tracks", [])?;

    {
        let mut track_stmt = tx.prepare(
            "INSERT OR REPLACE INTO library_tracks (track_id, track_name, date_added)
             VALUES (?1, ?2, ?3)",
        )?;
        let mut artist_stmt = tx.prepare(
            "INSERT OR IGNORE INTO track_artists (track_id, artist_id) VALUES (?1, ?2)",
        )?;

        for track in tracks {
            track_stmt.execute(params![track.track_id, track.name, track.date_added])?;
            for artist_id in &track.artist_ids {
                artist_stmt.execute(params![track.track_id, artist_id])?;
            }
        }
    }

    tx.commit()?;
    Ok(tracks.len())
}

/// Artist ids referenced by library tracks that have no `artists` row yet.
pub fn artist_ids_without_metadata(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT ta.artist_id
         FROM track_artists AS ta
         LEFT JOIN artists AS a ON a.id = ta.artist_id
         WHERE a.id IS NULL
         ORDER BY ta.artist_id",
    )?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Inserts or refreshes artists and their genres.
pub fn upsert_artists(conn: &mut Connection, artists: &[ArtistRecord]) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    {
        let mut artist_stmt =
            tx.prepare("INSERT OR REPLACE INTO artists (id, name) VALUES (?1, ?2)")?;
        let mut clear_genres = tx.prepare("DELETE FROM artist_genres WHERE artist_id = ?1")?;
        let mut genre_stmt = tx.prepare(
            "INSERT OR IGNORE INTO artist_genres (artist_id, genre) VALUES (?1, ?2)",
        )?;

        for artist in artists {
            artist_stmt.execute(params![artist.id, artist.name])?;
            clear_genres.execute([&artist.id])?;
            for genre in &artist.genres {
                genre_stmt.execute(params![artist.id, genre])?;
            }
        }
    }
    tx.commit()?;
    Ok(artists.len())
}

/// Library tracks that have no audio features mirrored yet.
pub fn track_ids_without_features(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT lt.track_id
         FROM library_tracks AS lt
         LEFT JOIN track_audio_features AS taf ON taf.track_id = lt.track_id
         WHERE taf.track_id IS NULL
         ORDER BY lt.track_id",
    )?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Writes audio features, keeping at most one row per track.
pub fn upsert_audio_features(
    conn: &mut Connection,
    features: &[AudioFeatureRecord],
) -> Result<usize, StoreError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"INSERT OR REPLACE INTO track_audio_features (
                track_id, acousticness, danceability, duration_ms, energy,
                instrumentalness, "key", liveness, loudness, "mode",
                speechiness, tempo, time_signature, valence
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
        )?;

        for f in features {
            stmt.execute(params![
                f.track_id,
                f.acousticness,
                f.danceability,
                f.duration_ms,
                f.energy,
                f.instrumentalness,
                f.key,
                f.liveness,
                f.loudness,
                f.mode,
                f.speechiness,
                f.tempo,
                f.time_signature,
                f.valence,
            ])?;
        }
    }
    tx.commit()?;
    Ok(features.len())
}
