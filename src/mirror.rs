//! Mirroring jobs that copy the user's Spotify data into the local store.
//!
//! Each job reads through a [`LibraryService`] and writes through the `store`
//! functions. Metadata jobs (artists, audio features) only fetch what is
//! missing locally and commit after every batch, so an interrupted run keeps
//! what it already pulled.

use indicatif::ProgressBar;
use rusqlite::Connection;

use crate::{
    Error,
    spotify::{ARTIST_BATCH_SIZE, AUDIO_FEATURE_BATCH_SIZE, LibraryService},
    store::{self, ArtistRecord, AudioFeatureRecord, LibraryTrack, PlayRecord},
    types::{AudioFeatures, PlayHistoryItem, SavedTrack},
    utils, warning,
};

pub const SAVED_TRACKS_PAGE_SIZE: u32 = 50;

/// Counts written by [`pull_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullSummary {
    pub library_tracks: usize,
    pub plays: usize,
    pub artists: usize,
    pub audio_features: usize,
}

/// Replaces the mirrored library with every saved track.
pub async fn pull_library<S>(
    conn: &mut Connection,
    service: &S,
    progress: &ProgressBar,
) -> Result<usize, Error>
where
    S: LibraryService + ?Sized,
{
    let mut tracks: Vec<LibraryTrack> = Vec::new();
    let mut offset = 0;

    loop {
        let page = service.saved_tracks(offset, SAVED_TRACKS_PAGE_SIZE).await?;
        let fetched = page.items.len() as u32;
        tracks.extend(page.items.into_iter().filter_map(library_track));
        progress.set_message(format!("Pulled {} library tracks...", tracks.len()));

        if !page.has_next || fetched == 0 {
            break;
        }
        offset += fetched;
    }

    Ok(store::replace_library(conn, &tracks)?)
}

/// Appends plays newer than the latest stored one.
pub async fn pull_history<S>(
    conn: &mut Connection,
    service: &S,
    progress: &ProgressBar,
) -> Result<usize, Error>
where
    S: LibraryService + ?Sized,
{
    let after = store::latest_played_at(conn)?;
    progress.set_message("Pulling recently played tracks...");

    let items = service.recently_played(after).await?;
    let plays: Vec<PlayRecord> = items.into_iter().filter_map(play_record).collect();

    Ok(store::append_plays(conn, &plays)?)
}

/// Fetches names and genres for artists referenced by the library but not yet
/// stored.
pub async fn pull_artists<S>(
    conn: &mut Connection,
    service: &S,
    progress: &ProgressBar,
) -> Result<usize, Error>
where
    S: LibraryService + ?Sized,
{
    let missing = store::artist_ids_without_metadata(conn)?;
    let mut written = 0;

    for batch in missing.chunks(ARTIST_BATCH_SIZE) {
        progress.set_message(format!(
            "Pulling artists {} of {}...",
            written + batch.len(),
            missing.len()
        ));
        let artists: Vec<ArtistRecord> = service
            .artists(batch)
            .await?
            .into_iter()
            .map(|a| ArtistRecord {
                id: a.id,
                name: a.name,
                genres: a.genres,
            })
            .collect();
        written += store::upsert_artists(conn, &artists)?;
    }

    Ok(written)
}

/// Fetches audio features for library tracks that have none stored.
pub async fn pull_audio_features<S>(
    conn: &mut Connection,
    service: &S,
    progress: &ProgressBar,
) -> Result<usize, Error>
where
    S: LibraryService + ?Sized,
{
    let missing = store::track_ids_without_features(conn)?;
    let mut written = 0;

    for (index, batch) in missing.chunks(AUDIO_FEATURE_BATCH_SIZE).enumerate() {
        progress.set_message(format!(
            "Pulling audio features, batch {} of {}...",
            index + 1,
            missing.len().div_ceil(AUDIO_FEATURE_BATCH_SIZE)
        ));
        let features: Vec<AudioFeatureRecord> = service
            .audio_features(batch)
            .await?
            .into_iter()
            .map(AudioFeatureRecord::from)
            .collect();
        written += store::upsert_audio_features(conn, &features)?;
    }

    Ok(written)
}

/// Runs every job, library first so metadata jobs see the new tracks.
pub async fn pull_all<S>(
    conn: &mut Connection,
    service: &S,
    progress: &ProgressBar,
) -> Result<PullSummary, Error>
where
    S: LibraryService + ?Sized,
{
    Ok(PullSummary {
        library_tracks: pull_library(conn, service, progress).await?,
        plays: pull_history(conn, service, progress).await?,
        artists: pull_artists(conn, service, progress).await?,
        audio_features: pull_audio_features(conn, service, progress).await?,
    })
}

fn library_track(saved: SavedTrack) -> Option<LibraryTrack> {
    let track_id = saved.track.id?;
    let Some(date_added) = utils::parse_spotify_timestamp(&saved.added_at) else {
        warning!(
            "Skipping saved track {}: unreadable added_at {}",
            track_id,
            saved.added_at
        );
        return None;
    };

    Some(LibraryTrack {
        track_id,
        name: saved.track.name,
        date_added,
        artist_ids: saved
            .track
            .artists
            .into_iter()
            .filter_map(|a| a.id)
            .collect(),
    })
}

fn play_record(item: PlayHistoryItem) -> Option<PlayRecord> {
    let track_id = item.track.id?;
    let played_at = utils::parse_spotify_timestamp(&item.played_at)?;
    Some(PlayRecord {
        track_id,
        played_at,
    })
}

impl From<AudioFeatures> for AudioFeatureRecord {
    fn from(f: AudioFeatures) -> Self {
        Self {
            track_id: f.id,
            acousticness: f.acousticness,
            danceability: f.danceability,
            duration_ms: f.duration_ms,
            energy: f.energy,
            instrumentalness: f.instrumentalness,
            key: f.key,
            liveness: f.liveness,
            loudness: f.loudness,
            mode: f.mode,
            speechiness: f.speechiness,
            tempo: f.tempo,
            time_signature: f.time_signature,
            valence: f.valence,
        }
    }
}
