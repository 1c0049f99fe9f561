//! Pushing a selection to Spotify.
//!
//! Sync is a full replace: whatever the remote playlist held before,
//! including manual edits made in the Spotify app since the last run, is
//! overwritten with the selection. A run that fails after creating the
//! playlist leaves it empty until the next run.

use crate::{error::SpotifyError, info, spotify::PlaylistService};

/// Page size used when scanning the user's playlists.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub playlist_id: String,
    /// True when the playlist did not exist and was created by this run.
    pub created: bool,
    pub tracks: usize,
}

/// Finds a playlist owned by the current user by exact name, paging through
/// all of them.
pub async fn find_playlist<P>(service: &P, name: &str) -> Result<Option<String>, SpotifyError>
where
    P: PlaylistService + ?Sized,
{
    let mut offset = 0;
    loop {
        let page = service.user_playlists(offset, PLAYLIST_PAGE_SIZE).await?;
        if let Some(found) = page.items.iter().find(|p| p.name == name) {
            return Ok(Some(found.id.clone()));
        }
        if !page.has_next || page.items.is_empty() {
            return Ok(None);
        }
        offset += page.items.len() as u32;
    }
}

/// Makes sure playlist `name` exists and holds exactly `tracks`.
pub async fn sync_playlist<P>(
    service: &P,
    name: &str,
    tracks: &[String],
) -> Result<SyncOutcome, SpotifyError>
where
    P: PlaylistService + ?Sized,
{
    let (playlist_id, created) = match find_playlist(service, name).await? {
        Some(id) => (id, false),
        None => {
            info!("Playlist {} does not exist yet, creating it.", name);
            (service.create_playlist(name).await?, true)
        }
    };

    info!("Replacing tracks of {} with {} tracks.", name, tracks.len());
    service.replace_playlist_tracks(&playlist_id, tracks).await?;

    Ok(SyncOutcome {
        playlist_id,
        created,
        tracks: tracks.len(),
    })
}
