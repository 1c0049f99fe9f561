//! Configuration management for smartlists.
//!
//! Settings are read from environment variables and `.env` files exactly once,
//! in `main`, and then passed around as an explicit [`Settings`] value. Nothing
//! below the CLI layer looks at the process environment.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the working directory
//! 3. `.env` in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use crate::{
    error::ConfigError,
    playlist::{
        UnresolvedPolicy,
        selector::{DEFAULT_BACKFILL_COUNT, DEFAULT_TARGET_SIZE},
    },
};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

/// Scopes needed to read the library and history and to manage playlists.
pub const DEFAULT_SCOPE: &str = "playlist-read-private user-read-recently-played playlist-modify-public playlist-modify-private user-library-read";

/// Loads environment variables from `.env` files.
///
/// Looks in the working directory first and then in the platform-specific
/// local data directory under `smartlists/.env`. Variables that are already
/// set are never overwritten, so the process environment always wins.
///
/// The data directory is created if it does not exist yet, which gives users
/// an obvious place to drop their `.env`.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/smartlists/.env`
/// - macOS: `~/Library/Application Support/smartlists/.env`
/// - Windows: `%LOCALAPPDATA%/smartlists/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    dotenv::dotenv().ok();
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Platform-specific data directory for smartlists.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("smartlists");
    path
}

/// Everything the engine and the Spotify client need at runtime.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite file holding the library mirror, root playlists and credentials.
    pub database: PathBuf,
    /// Directory with one playlist definition per `*.yaml` / `*.toml` / `*.json` file.
    pub playlists_dir: PathBuf,
    /// Size of each synced playlist.
    pub target_size: usize,
    /// What to do with pinned tracks that cannot be found in the library.
    pub unresolved: UnresolvedPolicy,
    /// Required only by commands that talk to Spotify, see
    /// [`Settings::require_client_id`].
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: String,
    pub server_address: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    /// Base64 key for the credential cache. Only commands that talk to
    /// Spotify need it.
    pub cache_key: Option<String>,
}

impl Settings {
    /// Builds settings from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `SMARTLISTS_TARGET_SIZE` is set but unusable. Spotify
    /// credentials are checked later by the commands that need them.
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_size = match optional("SMARTLISTS_TARGET_SIZE") {
            Some(value) => parse_target_size(&value)?,
            None => DEFAULT_TARGET_SIZE,
        };

        Ok(Self {
            database: optional("SMARTLISTS_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir().join("spotify.db")),
            playlists_dir: optional("SMARTLISTS_PLAYLISTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("playlists")),
            target_size,
            unresolved: UnresolvedPolicy::default(),
            client_id: optional("SPOTIFY_CLIENT_ID"),
            client_secret: optional("SPOTIFY_CLIENT_SECRET"),
            redirect_uri: optional("SPOTIFY_REDIRECT_URI"),
            scope: optional("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            server_address: optional("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            api_url: optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            auth_url: optional("SPOTIFY_API_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: optional("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            cache_key: optional("SPOTIFY_CACHE_KEY"),
        })
    }

    /// Settings for local-only work and tests: no real Spotify credentials.
    pub fn local(database: PathBuf, playlists_dir: PathBuf) -> Self {
        Self {
            database,
            playlists_dir,
            target_size: DEFAULT_TARGET_SIZE,
            unresolved: UnresolvedPolicy::default(),
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            scope: DEFAULT_SCOPE.to_string(),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            cache_key: None,
        }
    }

    /// The Spotify app client id, or [`ConfigError::MissingSetting`].
    pub fn require_client_id(&self) -> Result<&str, ConfigError> {
        self.client_id
            .as_deref()
            .ok_or(ConfigError::MissingSetting("SPOTIFY_CLIENT_ID"))
    }

    pub fn require_redirect_uri(&self) -> Result<&str, ConfigError> {
        self.redirect_uri
            .as_deref()
            .ok_or(ConfigError::MissingSetting("SPOTIFY_REDIRECT_URI"))
    }

    /// The cache key, or [`CacheError::MissingKey`](crate::error::CacheError::MissingKey).
    pub fn require_cache_key(&self) -> Result<&str, crate::error::CacheError> {
        self.cache_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(crate::error::CacheError::MissingKey)
    }
}

/// Parses a target playlist size. It must leave room for at least one root
/// track next to the [`DEFAULT_BACKFILL_COUNT`] recommendation slots.
pub fn parse_target_size(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(size) if size > DEFAULT_BACKFILL_COUNT => Ok(size),
        _ => Err(ConfigError::InvalidSetting {
            name: "SMARTLISTS_TARGET_SIZE",
            value: value.to_string(),
        }),
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
