use clap::ValueEnum;

use crate::{config::Settings, error, info, mirror, success};

use super::{open_store, spinner, spotify_client};

/// What `smartlists pull` mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PullTarget {
    /// Saved library tracks, replacing the previous mirror
    Library,
    /// Plays newer than the latest stored play
    History,
    /// Names and genres of artists missing locally
    Artists,
    /// Audio features of tracks missing locally
    Features,
    /// Everything above, in that order
    All,
}

pub async fn pull(settings: &Settings, target: PullTarget) {
    let mut conn = open_store(settings);
    let client = spotify_client(settings);
    let pb = spinner("Pulling from Spotify...");

    let result = match target {
        PullTarget::Library => mirror::pull_library(&mut conn, &client, &pb)
            .await
            .map(|n| format!("Mirrored {} library tracks.", n)),
        PullTarget::History => mirror::pull_history(&mut conn, &client, &pb)
            .await
            .map(|n| format!("Stored {} new plays.", n)),
        PullTarget::Artists => mirror::pull_artists(&mut conn, &client, &pb)
            .await
            .map(|n| format!("Stored {} artists.", n)),
        PullTarget::Features => mirror::pull_audio_features(&mut conn, &client, &pb)
            .await
            .map(|n| format!("Stored audio features for {} tracks.", n)),
        PullTarget::All => mirror::pull_all(&mut conn, &client, &pb).await.map(|s| {
            info!(
                "Library: {}, plays: {}, artists: {}, audio features: {}",
                s.library_tracks, s.plays, s.artists, s.audio_features
            );
            "Mirror is up to date.".to_string()
        }),
    };

    pb.finish_and_clear();
    match result {
        Ok(message) => success!("{}", message),
        Err(e) => error!("Cannot pull from remote: {}", e),
    }
}
