use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use indicatif::ProgressBar;
use rusqlite::Connection;
use smartlists::{
    error::SpotifyError,
    mirror::{pull_all, pull_artists, pull_audio_features, pull_history, pull_library},
    spotify::LibraryService,
    store::{self, artist_ids_without_metadata, last_played, track_ids_without_features},
    types::{
        Artist, ArtistRef, AudioFeatures, PlayHistoryItem, SavedTrack, SavedTrackPage, Track,
    },
};

/// Serves a fixed library and records how it was asked for it.
#[derive(Default)]
struct FakeLibrary {
    saved: Vec<SavedTrack>,
    history: Vec<PlayHistoryItem>,
    history_after: Mutex<Vec<Option<NaiveDateTime>>>,
    artist_batches: Mutex<Vec<usize>>,
    feature_batches: Mutex<Vec<usize>>,
}

#[async_trait]
impl LibraryService for FakeLibrary {
    async fn saved_tracks(&self, offset: u32, limit: u32) -> Result<SavedTrackPage, SpotifyError> {
        let start = (offset as usize).min(self.saved.len());
        let end = (start + limit as usize).min(self.saved.len());
        Ok(SavedTrackPage {
            items: self.saved[start..end].to_vec(),
            has_next: end < self.saved.len(),
        })
    }

    async fn recently_played(
        &self,
        after: Option<NaiveDateTime>,
    ) -> Result<Vec<PlayHistoryItem>, SpotifyError> {
        self.history_after.lock().unwrap().push(after);
        Ok(self.history.clone())
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<Artist>, SpotifyError> {
        self.artist_batches.lock().unwrap().push(ids.len());
        Ok(ids
            .iter()
            .map(|id| Artist {
                id: id.clone(),
                name: format!("Artist {id}"),
                genres: vec!["indie".to_string()],
            })
            .collect())
    }

    async fn audio_features(&self, ids: &[String]) -> Result<Vec<AudioFeatures>, SpotifyError> {
        self.feature_batches.lock().unwrap().push(ids.len());
        Ok(ids
            .iter()
            .map(|id| AudioFeatures {
                id: id.clone(),
                acousticness: 0.1,
                danceability: 0.5,
                duration_ms: 200_000,
                energy: 0.7,
                instrumentalness: 0.0,
                key: 5,
                liveness: 0.1,
                loudness: -6.0,
                mode: 1,
                speechiness: 0.05,
                tempo: 120.0,
                time_signature: 4,
                valence: 0.6,
            })
            .collect())
    }
}

// Helper function to create a saved track with `artists` artist ids
fn saved(id: Option<&str>, name: &str, artists: &[&str]) -> SavedTrack {
    SavedTrack {
        added_at: "2024-01-15T08:00:00Z".to_string(),
        track: Track {
            id: id.map(str::to_string),
            name: name.to_string(),
            artists: artists
                .iter()
                .map(|a| ArtistRef {
                    id: Some(a.to_string()),
                    name: a.to_string(),
                })
                .collect(),
        },
    }
}

fn played(id: &str, at: &str) -> PlayHistoryItem {
    PlayHistoryItem {
        track: Track {
            id: Some(id.to_string()),
            name: id.to_string(),
            artists: Vec::new(),
        },
        played_at: at.to_string(),
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[tokio::test]
async fn test_pull_library_pages_and_replaces() {
    let mut conn = store::open_in_memory().unwrap();
    let service = FakeLibrary {
        saved: (0..120)
            .map(|i| saved(Some(&format!("t{i}")), "Song", &["a1", "a2"]))
            .chain([saved(None, "Local file", &["a1"])])
            .collect(),
        ..Default::default()
    };

    let pulled = pull_library(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(pulled, 120);
    assert_eq!(count(&conn, "library_tracks"), 120);
    assert_eq!(count(&conn, "track_artists"), 240);

    // A smaller library replaces the old mirror
    let service = FakeLibrary {
        saved: vec![saved(Some("t0"), "Song", &["a1"])],
        ..Default::default()
    };
    pull_library(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(count(&conn, "library_tracks"), 1);
    assert_eq!(count(&conn, "track_artists"), 1);
}

#[tokio::test]
async fn test_pull_history_only_appends_new_plays() {
    let mut conn = store::open_in_memory().unwrap();
    let service = FakeLibrary {
        history: vec![
            played("t1", "2024-06-01T10:00:00Z"),
            played("t2", "2024-06-02T10:00:00Z"),
            played("t1", "not a date"),
        ],
        ..Default::default()
    };

    let first = pull_history(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(first, 2);

    // Same page again: nothing new
    let second = pull_history(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(second, 0);
    assert_eq!(count(&conn, "play_history"), 2);

    let cursors = service.history_after.lock().unwrap().clone();
    assert_eq!(cursors, vec![None, Some(at(2, 10))]);

    let last = last_played(&conn).unwrap();
    assert_eq!(last.get("t1"), Some(&at(1, 10)));
    assert_eq!(last.get("t2"), Some(&at(2, 10)));
}

#[tokio::test]
async fn test_metadata_jobs_fetch_only_missing_in_batches() {
    let mut conn = store::open_in_memory().unwrap();
    let artist_ids: Vec<String> = (0..120).map(|i| format!("a{i:03}")).collect();
    let service = FakeLibrary {
        saved: (0..250)
            .map(|i| {
                let artist = artist_ids[i % artist_ids.len()].as_str();
                saved(Some(&format!("t{i:03}")), "Song", &[artist])
            })
            .collect(),
        ..Default::default()
    };
    pull_library(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();

    let artists = pull_artists(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(artists, 120);
    assert_eq!(*service.artist_batches.lock().unwrap(), vec![50, 50, 20]);
    assert!(artist_ids_without_metadata(&conn).unwrap().is_empty());
    assert_eq!(count(&conn, "artist_genres"), 120);

    let features = pull_audio_features(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();
    assert_eq!(features, 250);
    assert_eq!(*service.feature_batches.lock().unwrap(), vec![100, 100, 50]);
    assert!(track_ids_without_features(&conn).unwrap().is_empty());

    // Nothing left to fetch on the next run
    assert_eq!(
        pull_artists(&mut conn, &service, &ProgressBar::hidden())
            .await
            .unwrap(),
        0
    );
    assert_eq!(service.artist_batches.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_pull_all() {
    let mut conn = store::open_in_memory().unwrap();
    let service = FakeLibrary {
        saved: vec![
            saved(Some("t1"), "One", &["a1"]),
            saved(Some("t2"), "Two", &["a1", "a2"]),
        ],
        history: vec![played("t1", "2024-06-03T09:30:00.250Z")],
        ..Default::default()
    };

    let summary = pull_all(&mut conn, &service, &ProgressBar::hidden())
        .await
        .unwrap();

    assert_eq!(summary.library_tracks, 2);
    assert_eq!(summary.plays, 1);
    assert_eq!(summary.artists, 2);
    assert_eq!(summary.audio_features, 2);
}
