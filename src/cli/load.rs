use chrono::{NaiveDateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rusqlite::Connection;

use crate::{
    Error,
    config::Settings,
    error, info,
    playlist::{
        SelectionOptions, SyncOutcome, eligible_tracks, root_playlist_names, rotation_violations,
        select_tracks, sync_playlist,
    },
    spotify::PlaylistService,
    success, warning,
};

use super::{open_store, spotify_client};

/// Selects and syncs every stored root playlist, one after another.
pub async fn load(settings: &Settings) {
    let conn = open_store(settings);
    let names = match root_playlist_names(&conn) {
        Ok(names) => names,
        Err(e) => error!("Cannot read root playlists: {}", e),
    };
    if names.is_empty() {
        warning!("No root playlists stored. Run smartlists build first.");
        return;
    }

    let client = spotify_client(settings);
    let options = SelectionOptions::with_target_size(settings.target_size);
    let mut rng = StdRng::from_os_rng();
    let now = Utc::now().naive_utc();

    let mut synced = 0;
    for name in &names {
        match load_playlist(&conn, &client, name, &options, &mut rng, now).await {
            Ok(outcome) => {
                success!("Synced {} tracks to {}.", outcome.tracks, name);
                synced += 1;
            }
            Err(e) => warning!("Playlist {} was not updated: {}", name, e),
        }
    }

    info!("Updated {} of {} playlists.", synced, names.len());
}

/// Runs select and sync for one root playlist.
///
/// Tracks that rotate but were played inside the rotation window are only
/// reported; they can come back through recommendations.
pub async fn load_playlist<P, R>(
    conn: &Connection,
    service: &P,
    name: &str,
    options: &SelectionOptions,
    rng: &mut R,
    now: NaiveDateTime,
) -> Result<SyncOutcome, Error>
where
    P: PlaylistService + ?Sized,
    R: Rng + ?Sized,
{
    let eligible = eligible_tracks(conn, name, now)?;
    info!("Playlist {} has {} eligible tracks.", name, eligible.len());

    let selection = select_tracks(service, name, &eligible, options, rng).await?;
    if selection.is_short(options.target_size) {
        warning!(
            "Playlist {} only has {} of {} tracks.",
            name,
            selection.tracks.len(),
            options.target_size
        );
    }

    for track_id in rotation_violations(conn, name, &selection.tracks, now)? {
        warning!(
            "Track {} in {} was played within the rotation window.",
            track_id,
            name
        );
    }

    Ok(sync_playlist(service, name, &selection.tracks).await?)
}
