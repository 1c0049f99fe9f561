//! # CLI Module
//!
//! User-facing commands of smartlists. Each command takes the [`Settings`]
//! built once in `main`, opens what it needs (the SQLite store, the credential
//! cache, the Spotify client) and reports progress through the crate's
//! logging macros.
//!
//! ## Commands
//!
//! - [`auth`] - OAuth 2.0 PKCE authorization, token saved to the encrypted
//!   credential cache
//! - [`pull`] - mirror library, play history, artists and audio features
//! - [`build`] - compile every playlist definition into its root playlist
//! - [`load`] - select a rotation-aware track list per root playlist and sync
//!   it to Spotify
//! - [`update`] - `pull`, `build` and `load` in one go
//! - [`playlists`] - summary table of the stored root playlists
//!
//! ## Failure handling
//!
//! Problems that leave the command without a usable state (unreadable
//! database, missing cache key, no cached token) end the process through
//! [`error!`](crate::error!). A single broken playlist only produces a
//! [`warning!`](crate::warning!); the remaining playlists are still processed
//! and the broken one keeps its last synced state on Spotify.
//!
//! ## Typical session
//!
//! ```bash
//! smartlists auth            # once, opens the browser
//! smartlists update          # pull + build + load
//! smartlists playlists       # inspect root playlists
//! ```

mod auth;
mod build;
mod load;
mod playlists;
mod pull;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;

use crate::{
    config::Settings, credentials::CredentialCache, error, management::TokenManager,
    spotify::SpotifyClient, store,
};

pub use auth::{auth, print_new_key};
pub use build::build;
pub use load::{load, load_playlist};
pub use playlists::playlists;
pub use pull::{PullTarget, pull};

/// Runs every step against the same settings: pull, build, load.
pub async fn update(settings: &Settings) {
    pull(settings, PullTarget::All).await;
    build(settings).await;
    load(settings).await;
}

fn open_store(settings: &Settings) -> Connection {
    match store::open(&settings.database) {
        Ok(conn) => conn,
        Err(e) => error!(
            "Cannot open database {}: {}",
            settings.database.display(),
            e
        ),
    }
}

fn open_cache(settings: &Settings) -> CredentialCache {
    let key = match settings.require_cache_key() {
        Ok(key) => key,
        Err(e) => error!(
            "{}\nGenerate one with `smartlists auth --generate-key` and set SPOTIFY_CACHE_KEY.",
            e
        ),
    };

    match CredentialCache::open(&settings.database, key) {
        Ok(cache) => cache,
        Err(e) => error!("Cannot open credential cache: {}", e),
    }
}

/// Exits unless the Spotify app credentials are configured. Offline commands
/// (`build`, `playlists`) never call this.
fn require_spotify_app(settings: &Settings) {
    if let Err(e) = settings
        .require_client_id()
        .and(settings.require_redirect_uri())
    {
        error!("{}. Set it in your environment or .env file.", e);
    }
}

fn spotify_client(settings: &Settings) -> SpotifyClient {
    require_spotify_app(settings);
    let tokens = match TokenManager::load(open_cache(settings), settings) {
        Ok(tokens) => tokens,
        Err(e) => error!("Failed to load token. Please run smartlists auth\n Error: {}", e),
    };
    SpotifyClient::new(settings, tokens)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
