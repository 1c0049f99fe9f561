//! # Spotify Integration Module
//!
//! The engine talks to Spotify only through two traits:
//!
//! - [`PlaylistService`] - playlist lookup, creation, full replace and
//!   recommendations, used by the selector and sync steps
//! - [`LibraryService`] - saved tracks, play history, artists and audio
//!   features, used by the mirroring jobs
//!
//! [`SpotifyClient`] implements both against the Web API with reqwest. Tests
//! substitute in-memory fakes.
//!
//! ## Architecture
//!
//! ```text
//! CLI layer (pull / build / load)
//!          ↓
//! Engine (mirror, playlist::{selector, sync})
//!          ↓
//! PlaylistService / LibraryService
//!          ↓
//! SpotifyClient (reqwest, TokenManager)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Rate limiting
//!
//! Every request goes through [`SpotifyClient::send`]:
//! - `429 Too Many Requests` waits for `Retry-After` when it is at most 120
//!   seconds and fails with [`SpotifyError::RateLimited`] otherwise
//! - `502 Bad Gateway` waits 10 seconds and retries
//! - other error statuses are returned to the caller
//!
//! ## API Coverage
//!
//! - `GET /me` - current user id for playlist creation
//! - `GET /me/tracks` - saved library tracks, offset paginated
//! - `GET /me/player/recently-played` - play history after a cursor
//! - `GET /artists` - artist names and genres, 50 per call
//! - `GET /audio-features` - audio features, 100 per call
//! - `GET /me/playlists` - the user's playlists, offset paginated
//! - `POST /users/{user_id}/playlists` - create a playlist
//! - `PUT /playlists/{id}/tracks` - replace playlist items
//! - `POST /playlists/{id}/tracks` - append items past the first 100
//! - `GET /recommendations` - recommendations from seed tracks

pub mod auth;
mod library;
mod playlist;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::{sync::Mutex, time::sleep};

use crate::{
    config::Settings,
    error::SpotifyError,
    management::TokenManager,
    types::{Artist, AudioFeatures, PlayHistoryItem, PlaylistPage, SavedTrackPage},
    warning,
};

/// Longest `Retry-After` the client is willing to sleep through.
pub const MAX_RETRY_AFTER_SECS: u64 = 120;
pub const ARTIST_BATCH_SIZE: usize = 50;
pub const AUDIO_FEATURE_BATCH_SIZE: usize = 100;
pub const PLAYLIST_ITEMS_BATCH_SIZE: usize = 100;

/// Remote playlist operations the selector and sync steps depend on.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// One page of the current user's playlists.
    async fn user_playlists(&self, offset: u32, limit: u32) -> Result<PlaylistPage, SpotifyError>;

    /// Creates a playlist and returns its id.
    async fn create_playlist(&self, name: &str) -> Result<String, SpotifyError>;

    /// Replaces every item of the playlist with `track_ids`, in order.
    async fn replace_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError>;

    /// Up to `limit` recommended track ids for the given seeds.
    async fn recommendations(
        &self,
        seed_track_ids: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SpotifyError>;
}

/// Remote reads used to mirror the library into the local store.
#[async_trait]
pub trait LibraryService: Send + Sync {
    async fn saved_tracks(&self, offset: u32, limit: u32) -> Result<SavedTrackPage, SpotifyError>;

    /// Plays strictly after `after`, or the most recent ones when `None`.
    async fn recently_played(
        &self,
        after: Option<NaiveDateTime>,
    ) -> Result<Vec<PlayHistoryItem>, SpotifyError>;

    /// Artists for up to [`ARTIST_BATCH_SIZE`] ids.
    async fn artists(&self, ids: &[String]) -> Result<Vec<Artist>, SpotifyError>;

    /// Audio features for up to [`AUDIO_FEATURE_BATCH_SIZE`] ids.
    async fn audio_features(&self, ids: &[String]) -> Result<Vec<AudioFeatures>, SpotifyError>;
}

/// Spotify Web API client.
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    tokens: Mutex<TokenManager>,
    user_id: Mutex<Option<String>>,
}

impl SpotifyClient {
    pub fn new(settings: &Settings, tokens: TokenManager) -> Self {
        Self {
            http: Client::new(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            tokens: Mutex::new(tokens),
            user_id: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Sends a request built by `build`, retrying on 502 and on short
    /// `Retry-After` waits.
    async fn send<F>(&self, build: F) -> Result<Response, SpotifyError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        loop {
            let token = self.tokens.lock().await.get_valid_token().await?;
            let response = build(&self.http).bearer_auth(token).send().await?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1);
                    if retry_after > MAX_RETRY_AFTER_SECS {
                        warning!(
                            "Retry after has reached an abnormal high of {} seconds.",
                            retry_after
                        );
                        return Err(SpotifyError::RateLimited(retry_after));
                    }
                    sleep(Duration::from_secs(retry_after)).await;
                }
                StatusCode::BAD_GATEWAY => {
                    sleep(Duration::from_secs(10)).await;
                }
                _ => return Ok(response.error_for_status()?),
            }
        }
    }

    /// Id of the authorized user, fetched once.
    async fn current_user_id(&self) -> Result<String, SpotifyError> {
        if let Some(id) = self.user_id.lock().await.as_ref() {
            return Ok(id.clone());
        }

        let url = self.url("/me");
        let user = self
            .send(|c| c.get(&url))
            .await?
            .json::<crate::types::CurrentUser>()
            .await?;
        *self.user_id.lock().await = Some(user.id.clone());
        Ok(user.id)
    }
}
