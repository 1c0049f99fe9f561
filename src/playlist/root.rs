//! Root playlist compiler.
//!
//! Turns a [`PlaylistConfig`] plus the mirrored library into the full
//! candidate set for one playlist and stores it in `root_playlists`,
//! replacing whatever was there for that name.

use std::collections::BTreeMap;

use rusqlite::{Connection, params, params_from_iter, types::Value};

use super::{
    config::{PlaylistConfig, TrackOverride},
    predicate::Predicate,
};
use crate::{
    error::{CompileError, StoreError},
    warning,
};

/// How to treat pinned tracks that match nothing (or more than one track
/// while no artist is given) in the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum UnresolvedPolicy {
    /// Log a warning and leave the track out.
    #[default]
    Skip,
    /// Abort compiling the playlist.
    Fail,
}

/// One candidate track of a root playlist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RootTrack {
    pub track_id: String,
    /// `false` exempts the track from the rotation window.
    pub rotate: bool,
}

/// The compiled candidate set for one playlist, ordered by track id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPlaylist {
    pub name: String,
    pub tracks: Vec<RootTrack>,
}

impl RootPlaylist {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn pinned(&self) -> usize {
        self.tracks.iter().filter(|t| !t.rotate).count()
    }
}

const BASE_QUERY: &str = "SELECT DISTINCT library_tracks.track_id
FROM library_tracks
LEFT JOIN track_artists
    ON library_tracks.track_id = track_artists.track_id
LEFT JOIN artists
    ON track_artists.artist_id = artists.id
LEFT JOIN artist_genres
    ON track_artists.artist_id = artist_genres.artist_id
LEFT JOIN track_audio_features
    ON library_tracks.track_id = track_audio_features.track_id";

/// Compiles and stores the root playlist for `config`.
///
/// A track matches the filters when some combination of its artists, their
/// genres and its audio features satisfies every configured dimension. A
/// definition without any filter matches nothing; its pinned tracks still
/// make it in. Pinned tracks override the `rotate` flag of a filter match for
/// the same track.
///
/// The previous set for `config.name` is replaced inside one transaction.
pub fn compile_root_playlist(
    conn: &mut Connection,
    config: &PlaylistConfig,
    policy: UnresolvedPolicy,
) -> Result<RootPlaylist, CompileError> {
    let mut tracks: BTreeMap<String, bool> = BTreeMap::new();

    for track_id in filter_matches(conn, config)? {
        tracks.insert(track_id, true);
    }

    for pin in &config.additional_tracks {
        let resolved = resolve_override(conn, pin)?;
        let reason = match (resolved.len(), &pin.artist) {
            (0, _) => "not found in library",
            (1, _) | (_, Some(_)) => {
                for track_id in resolved {
                    tracks.insert(track_id, pin.rotate);
                }
                continue;
            }
            (_, None) => "matches several library tracks, add `artist` to pick one",
        };

        match policy {
            UnresolvedPolicy::Skip => warning!(
                "Pinned track `{}` for playlist `{}` {}; skipping.",
                pin.name,
                config.name,
                reason
            ),
            UnresolvedPolicy::Fail => {
                return Err(CompileError::UnresolvedTrack {
                    playlist: config.name.clone(),
                    name: pin.name.clone(),
                });
            }
        }
    }

    let root = RootPlaylist {
        name: config.name.clone(),
        tracks: tracks
            .into_iter()
            .map(|(track_id, rotate)| RootTrack { track_id, rotate })
            .collect(),
    };

    store_root_playlist(conn, &root)?;
    Ok(root)
}

/// Track ids matching the definition's filters, or none when it has no
/// filters at all.
pub fn filter_matches(conn: &Connection, config: &PlaylistConfig) -> Result<Vec<String>, StoreError> {
    if !config.has_filters() {
        return Ok(Vec::new());
    }

    let predicate = Predicate::from_config(config);
    let mut params: Vec<Value> = Vec::new();
    let Some(where_clause) = predicate.render(&mut params) else {
        return Ok(Vec::new());
    };

    let query = format!("{BASE_QUERY}\nWHERE {where_clause}\nORDER BY library_tracks.track_id");
    let mut stmt = conn.prepare(&query)?;
    let ids = stmt
        .query_map(params_from_iter(params), |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

/// Library track ids for a pinned track: exact, case-sensitive name match,
/// narrowed by artist name when one is given.
pub fn resolve_override(conn: &Connection, pin: &TrackOverride) -> Result<Vec<String>, StoreError> {
    let ids = match &pin.artist {
        Some(artist) => {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT lt.track_id
                 FROM library_tracks AS lt
                 INNER JOIN track_artists AS ta ON ta.track_id = lt.track_id
                 INNER JOIN artists AS a ON a.id = ta.artist_id
                 WHERE lt.track_name = ?1 AND a.name = ?2
                 ORDER BY lt.track_id",
            )?;
            stmt.query_map(params![pin.name, artist], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT track_id FROM library_tracks WHERE track_name = ?1 ORDER BY track_id",
            )?;
            stmt.query_map([&pin.name], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?
        }
    };
    Ok(ids)
}

/// Replaces the stored set for `root.name` atomically.
pub fn store_root_playlist(conn: &mut Connection, root: &RootPlaylist) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM root_playlists WHERE name = ?1", [&root.name])?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO root_playlists (name, track_id, rotate) VALUES (?1, ?2, ?3)")?;
        for track in &root.tracks {
            stmt.execute(params![root.name, track.track_id, track.rotate])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Reads a stored root playlist back, ordered by track id.
pub fn load_root_playlist(conn: &Connection, name: &str) -> Result<RootPlaylist, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT track_id, rotate FROM root_playlists WHERE name = ?1 ORDER BY track_id",
    )?;
    let tracks = stmt
        .query_map([name], |row| {
            Ok(RootTrack {
                track_id: row.get(0)?,
                rotate: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RootPlaylist {
        name: name.to_string(),
        tracks,
    })
}

/// Names of all stored root playlists.
pub fn root_playlist_names(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare("SELECT DISTINCT name FROM root_playlists ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Drops stored root playlists whose definition is gone. Returns the names
/// removed.
///
/// An empty `keep` list removes nothing.
pub fn prune_root_playlists(conn: &mut Connection, keep: &[String]) -> Result<Vec<String>, StoreError> {
    if keep.is_empty() {
        return Ok(Vec::new());
    }

    let stale: Vec<String> = root_playlist_names(conn)?
        .into_iter()
        .filter(|name| !keep.contains(name))
        .collect();

    let tx = conn.transaction()?;
    for name in &stale {
        tx.execute("DELETE FROM root_playlists WHERE name = ?1", [name])?;
    }
    tx.commit()?;
    Ok(stale)
}
