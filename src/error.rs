//! Error types for the playlist engine.
//!
//! Each concern owns an enum so callers can decide what is fatal: a
//! [`ConfigError`] or [`SelectionError`] only aborts the playlist being
//! processed, while a [`CacheError`] leaves the process without usable
//! credentials.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("playlist definition is missing the required `name` field")]
    MissingName,

    #[error("additional track #{index} in playlist `{playlist}` is missing `name`")]
    MissingTrackName { playlist: String, index: usize },

    #[error("unknown audio feature `{0}`")]
    UnknownAudioFeature(String),

    #[error("audio feature `{feature}` has min {min} greater than max {max}")]
    InvalidRange { feature: String, min: f64, max: f64 },

    #[error("malformed playlist definition: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing setting {0}")]
    MissingSetting(&'static str),

    #[error("invalid value `{value}` for setting {name}")]
    InvalidSetting { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot create database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("pinned track `{name}` could not be resolved in the library for playlist `{playlist}`")]
    UnresolvedTrack { playlist: String, name: String },
}

impl From<rusqlite::Error> for CompileError {
    fn from(err: rusqlite::Error) -> Self {
        CompileError::Store(StoreError::Sqlite(err))
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("cannot seed recommendations with zero tracks for playlist `{0}`")]
    NoSeedTracks(String),

    #[error("target size {target_size} must exceed backfill count {backfill_count}")]
    InvalidTarget {
        target_size: usize,
        backfill_count: usize,
    },

    #[error(transparent)]
    Spotify(#[from] SpotifyError),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("credential cache key is not configured")]
    MissingKey,

    #[error("credential cache key must be 32 base64-encoded bytes")]
    InvalidKey,

    #[error("cannot decrypt cached credentials for `{0}` (corrupt data or wrong key)")]
    Decrypt(String),

    #[error("cannot encrypt credentials for `{0}`")]
    Encrypt(String),

    #[error("cached credentials are not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Store(StoreError::Sqlite(err))
    }
}

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spotify asked to retry after {0} seconds")]
    RateLimited(u64),

    #[error("no valid access token: {0}")]
    Auth(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Any failure of a single playlist run or a mirroring job.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(StoreError::Sqlite(err))
    }
}
