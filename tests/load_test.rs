use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{SeedableRng, rngs::StdRng};
use rusqlite::Connection;
use smartlists::{
    Error,
    cli::load_playlist,
    error::{SelectionError, SpotifyError},
    playlist::{RootPlaylist, RootTrack, SelectionOptions, root::store_root_playlist},
    spotify::PlaylistService,
    store::{self, PlayRecord, append_plays},
    types::{Playlist, PlaylistPage},
};

/// Remembers the last pushed track list; recommends `rec-N` ids.
#[derive(Default)]
struct FakeSpotify {
    playlists: Mutex<Vec<Playlist>>,
    pushed: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl PlaylistService for FakeSpotify {
    async fn user_playlists(&self, offset: u32, limit: u32) -> Result<PlaylistPage, SpotifyError> {
        let playlists = self.playlists.lock().unwrap();
        let start = (offset as usize).min(playlists.len());
        let end = (start + limit as usize).min(playlists.len());
        Ok(PlaylistPage {
            items: playlists[start..end].to_vec(),
            has_next: end < playlists.len(),
        })
    }

    async fn create_playlist(&self, name: &str) -> Result<String, SpotifyError> {
        let mut playlists = self.playlists.lock().unwrap();
        let id = format!("remote-{}", playlists.len());
        playlists.push(Playlist {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn replace_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        self.pushed
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), track_ids.to_vec()));
        Ok(())
    }

    async fn recommendations(
        &self,
        _seed_track_ids: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SpotifyError> {
        Ok((0..limit).map(|i| format!("rec-{i}")).collect())
    }
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn store_with(name: &str, tracks: &[(&str, bool)], plays: &[(&str, i64)]) -> Connection {
    let mut conn = store::open_in_memory().unwrap();
    store_root_playlist(
        &mut conn,
        &RootPlaylist {
            name: name.to_string(),
            tracks: tracks
                .iter()
                .map(|(id, rotate)| RootTrack {
                    track_id: id.to_string(),
                    rotate: *rotate,
                })
                .collect(),
        },
    )
    .unwrap();
    let plays: Vec<PlayRecord> = plays
        .iter()
        .map(|(id, days_ago)| PlayRecord {
            track_id: id.to_string(),
            played_at: now() - Duration::days(*days_ago),
        })
        .collect();
    append_plays(&mut conn, &plays).unwrap();
    conn
}

#[tokio::test]
async fn test_load_playlist_skips_recent_plays() {
    let conn = store_with(
        "chill",
        &[("t1", true), ("t2", true), ("t3", true), ("pin", false)],
        &[("t2", 3), ("pin", 1), ("t3", 20)],
    );
    let service = FakeSpotify::default();
    let options = SelectionOptions {
        target_size: 6,
        backfill_count: 3,
        ..Default::default()
    };

    let outcome = load_playlist(
        &conn,
        &service,
        "chill",
        &options,
        &mut StdRng::seed_from_u64(9),
        now(),
    )
    .await
    .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.tracks, 6);

    let pushed = service.pushed.lock().unwrap().clone();
    assert_eq!(pushed.len(), 1);
    let (playlist_id, tracks) = &pushed[0];
    assert_eq!(playlist_id, &outcome.playlist_id);

    // Three eligible root tracks plus three recommendations; t2 rests
    assert!(!tracks.contains(&"t2".to_string()));
    for id in ["t1", "t3", "pin", "rec-0", "rec-1", "rec-2"] {
        assert!(tracks.contains(&id.to_string()), "missing {id}");
    }
}

#[tokio::test]
async fn test_load_playlist_reuses_remote_playlist() {
    let conn = store_with("focus", &[("t1", true)], &[]);
    let service = FakeSpotify::default();
    let options = SelectionOptions::with_target_size(6);

    let mut rng = StdRng::seed_from_u64(1);

    let first = load_playlist(&conn, &service, "focus", &options, &mut rng, now())
        .await
        .unwrap();
    let second = load_playlist(&conn, &service, "focus", &options, &mut rng, now())
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.playlist_id, second.playlist_id);
    assert_eq!(service.playlists.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_load_playlist_without_seeds_leaves_remote_untouched() {
    let conn = store_with("rested", &[("t1", true)], &[("t1", 2)]);
    let service = FakeSpotify::default();
    let options = SelectionOptions::with_target_size(6);

    let err = load_playlist(
        &conn,
        &service,
        "rested",
        &options,
        &mut StdRng::seed_from_u64(4),
        now(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Selection(SelectionError::NoSeedTracks(ref name)) if name == "rested"
    ));
    assert!(service.pushed.lock().unwrap().is_empty());
    assert!(service.playlists.lock().unwrap().is_empty());
}
