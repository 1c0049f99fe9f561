use chrono::Utc;
use tabled::Table;

use crate::{
    config::Settings,
    error,
    playlist::{eligible_tracks, load_root_playlist, root_playlist_names},
    types::RootPlaylistTableRow,
    warning,
};

use super::open_store;

/// Prints candidate, pinned and currently eligible counts per root playlist.
pub async fn playlists(settings: &Settings) {
    let conn = open_store(settings);
    let names = match root_playlist_names(&conn) {
        Ok(names) => names,
        Err(e) => error!("Cannot read root playlists: {}", e),
    };

    if names.is_empty() {
        warning!("No root playlists stored. Run smartlists build first.");
        return;
    }

    let now = Utc::now().naive_utc();
    let mut rows: Vec<RootPlaylistTableRow> = Vec::with_capacity(names.len());
    for name in names {
        let root = match load_root_playlist(&conn, &name) {
            Ok(root) => root,
            Err(e) => {
                warning!("Cannot read root playlist {}: {}", name, e);
                continue;
            }
        };
        let eligible = eligible_tracks(&conn, &name, now)
            .map(|tracks| tracks.len())
            .unwrap_or_default();

        rows.push(RootPlaylistTableRow {
            candidates: root.len(),
            pinned: root.pinned(),
            eligible,
            name,
        });
    }

    let table = Table::new(rows);
    println!("{}", table);
}
