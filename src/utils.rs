use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, NaiveDateTime};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Parses Spotify's RFC 3339 timestamps (`2024-03-01T18:20:00.123Z`) into
/// naive UTC, the form stored in the database.
pub fn parse_spotify_timestamp(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Milliseconds since the epoch, as used by the `after` cursor of the play
/// history endpoint.
pub fn unix_millis(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}
