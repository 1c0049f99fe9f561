use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// Audio features Spotify reports per track, one column each in
/// `track_audio_features`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioFeature {
    Acousticness,
    Danceability,
    DurationMs,
    Energy,
    Instrumentalness,
    Key,
    Liveness,
    Loudness,
    Mode,
    Speechiness,
    Tempo,
    TimeSignature,
    Valence,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 13] = [
        AudioFeature::Acousticness,
        AudioFeature::Danceability,
        AudioFeature::DurationMs,
        AudioFeature::Energy,
        AudioFeature::Instrumentalness,
        AudioFeature::Key,
        AudioFeature::Liveness,
        AudioFeature::Loudness,
        AudioFeature::Mode,
        AudioFeature::Speechiness,
        AudioFeature::Tempo,
        AudioFeature::TimeSignature,
        AudioFeature::Valence,
    ];

    /// Column name in `track_audio_features`, identical to the config key.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Danceability => "danceability",
            AudioFeature::DurationMs => "duration_ms",
            AudioFeature::Energy => "energy",
            AudioFeature::Instrumentalness => "instrumentalness",
            AudioFeature::Key => "key",
            AudioFeature::Liveness => "liveness",
            AudioFeature::Loudness => "loudness",
            AudioFeature::Mode => "mode",
            AudioFeature::Speechiness => "speechiness",
            AudioFeature::Tempo => "tempo",
            AudioFeature::TimeSignature => "time_signature",
            AudioFeature::Valence => "valence",
        }
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFeature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AudioFeature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownAudioFeature(s.to_string()))
    }
}

/// Inclusive bounds on one audio feature. A missing side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct FeatureRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FeatureRange {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// A track pinned into a playlist by name.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOverride {
    pub name: String,
    /// Narrows the name match when several library tracks share a name.
    pub artist: Option<String>,
    /// Pinned tracks are exempt from rotation unless this is set.
    pub rotate: bool,
}

/// A parsed playlist definition.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistConfig {
    /// Root playlist key and remote playlist name.
    pub name: String,
    /// `None` when the definition has no `audio_features` section.
    pub audio_features: Option<BTreeMap<AudioFeature, FeatureRange>>,
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub additional_tracks: Vec<TrackOverride>,
}

#[derive(Deserialize)]
struct RawPlaylist {
    name: Option<String>,
    audio_features: Option<BTreeMap<String, FeatureRange>>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    additional_tracks: Vec<RawTrack>,
}

#[derive(Deserialize)]
struct RawTrack {
    name: Option<String>,
    artist: Option<String>,
    rotate: Option<bool>,
}

impl PlaylistConfig {
    /// Parses an untyped definition document.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingName`] without a `name`
    /// - [`ConfigError::MissingTrackName`] for an additional track without `name`
    /// - [`ConfigError::UnknownAudioFeature`] / [`ConfigError::InvalidRange`] for
    ///   bad `audio_features` entries
    /// - [`ConfigError::Malformed`] when a field has the wrong shape
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let raw: RawPlaylist = serde_json::from_value(value)?;
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .ok_or(ConfigError::MissingName)?;

        let audio_features = match raw.audio_features {
            Some(features) => {
                let mut ranges = BTreeMap::new();
                for (key, range) in features {
                    let feature: AudioFeature = key.parse()?;
                    if let (Some(min), Some(max)) = (range.min, range.max) {
                        if min > max {
                            return Err(ConfigError::InvalidRange {
                                feature: key,
                                min,
                                max,
                            });
                        }
                    }
                    ranges.insert(feature, range);
                }
                Some(ranges)
            }
            None => None,
        };

        let mut additional_tracks = Vec::with_capacity(raw.additional_tracks.len());
        for (index, track) in raw.additional_tracks.into_iter().enumerate() {
            let Some(track_name) = track.name.filter(|n| !n.is_empty()) else {
                return Err(ConfigError::MissingTrackName {
                    playlist: name,
                    index,
                });
            };
            additional_tracks.push(TrackOverride {
                name: track_name,
                artist: track.artist,
                rotate: track.rotate.unwrap_or(false),
            });
        }

        Ok(Self {
            name,
            audio_features,
            genres: raw.genres,
            artists: raw.artists,
            additional_tracks,
        })
    }

    /// Parses a definition from YAML, TOML or JSON text, chosen by file
    /// extension. Anything else is read as YAML.
    pub fn from_str_with_format(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let parse_error = |reason: String| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        };

        let value: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
            Some("toml") => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
            _ => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        };
        Self::from_value(value)
    }

    /// True when at least one filter dimension constrains the library.
    pub fn has_filters(&self) -> bool {
        !self.genres.is_empty()
            || !self.artists.is_empty()
            || self
                .audio_features
                .as_ref()
                .is_some_and(|f| f.values().any(|r| !r.is_unbounded()))
    }
}

const DEFINITION_EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];

/// Lists playlist definition files (`*.yaml`, `*.yml`, `*.toml`, `*.json`) in
/// `dir`, sorted by path so playlists are always processed in the same order.
pub async fn definition_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut entries = async_fs::read_dir(dir).await.map_err(io_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.try_next().await.map_err(io_error)? {
        let path = entry.path();
        let is_definition = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| DEFINITION_EXTENSIONS.contains(&ext));
        if !is_definition {
            continue;
        }
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Reads and parses one definition file.
pub async fn load_file(path: &Path) -> Result<PlaylistConfig, ConfigError> {
    let text = async_fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
    PlaylistConfig::from_str_with_format(&text, path)
}

/// Loads every definition in `dir`. Each file gets its own result so one
/// broken definition does not hide the others.
pub async fn load_dir(
    dir: &Path,
) -> Result<Vec<(PathBuf, Result<PlaylistConfig, ConfigError>)>, ConfigError> {
    let mut loaded = Vec::new();
    for path in definition_files(dir).await? {
        let config = load_file(&path).await;
        loaded.push((path, config));
    }
    Ok(loaded)
}
