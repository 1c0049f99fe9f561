use std::path::{Path, PathBuf};

use serde_json::json;
use smartlists::{
    config::{Settings, parse_target_size},
    error::{ConfigError, SpotifyError},
    playlist::{
        AudioFeature, FeatureRange, PlaylistConfig, SelectionOptions,
        config::{definition_files, load_dir},
    },
    spotify::auth::authorize_url,
};

// Helper to get a fresh scratch directory per test
fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("smartlists-{}-{}", test, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_minimal_definition_defaults() {
    let config = PlaylistConfig::from_value(json!({ "name": "empty" })).unwrap();

    assert_eq!(config.name, "empty");
    assert!(config.audio_features.is_none());
    assert!(config.genres.is_empty());
    assert!(config.artists.is_empty());
    assert!(config.additional_tracks.is_empty());
    assert!(!config.has_filters());
}

#[test]
fn test_full_definition() {
    let config = PlaylistConfig::from_value(json!({
        "name": "chill",
        "audio_features": {
            "energy": { "max": 0.4 },
            "tempo": { "min": 60, "max": 110 }
        },
        "genres": ["ambient", "downtempo"],
        "artists": ["Bonobo"],
        "additional_tracks": [
            { "name": "Kiara" },
            { "name": "Foo", "artist": "Bar", "rotate": true }
        ]
    }))
    .unwrap();

    let features = config.audio_features.as_ref().unwrap();
    assert_eq!(
        features.get(&AudioFeature::Energy),
        Some(&FeatureRange {
            min: None,
            max: Some(0.4)
        })
    );
    assert_eq!(
        features.get(&AudioFeature::Tempo),
        Some(&FeatureRange {
            min: Some(60.0),
            max: Some(110.0)
        })
    );
    assert_eq!(config.genres, vec!["ambient", "downtempo"]);
    assert_eq!(config.artists, vec!["Bonobo"]);

    // Pinned tracks do not rotate unless asked to
    assert_eq!(config.additional_tracks[0].name, "Kiara");
    assert_eq!(config.additional_tracks[0].artist, None);
    assert!(!config.additional_tracks[0].rotate);
    assert_eq!(config.additional_tracks[1].artist.as_deref(), Some("Bar"));
    assert!(config.additional_tracks[1].rotate);
    assert!(config.has_filters());
}

#[test]
fn test_missing_name() {
    let err = PlaylistConfig::from_value(json!({ "genres": ["jazz"] })).unwrap_err();
    assert!(matches!(err, ConfigError::MissingName));
}

#[test]
fn test_track_override_without_name() {
    let err = PlaylistConfig::from_value(json!({
        "name": "pins",
        "additional_tracks": [{ "name": "ok" }, { "artist": "Nobody" }]
    }))
    .unwrap_err();

    match err {
        ConfigError::MissingTrackName { playlist, index } => {
            assert_eq!(playlist, "pins");
            assert_eq!(index, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_audio_feature() {
    let err = PlaylistConfig::from_value(json!({
        "name": "odd",
        "audio_features": { "loudnes": { "min": -10 } }
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownAudioFeature(ref f) if f == "loudnes"));
}

#[test]
fn test_inverted_range() {
    let err = PlaylistConfig::from_value(json!({
        "name": "odd",
        "audio_features": { "energy": { "min": 0.8, "max": 0.2 } }
    }))
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRange { .. }));
}

#[test]
fn test_wrong_shape() {
    let err = PlaylistConfig::from_value(json!({ "name": "odd", "genres": "jazz" })).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed(_)));
}

#[test]
fn test_unbounded_feature_is_not_a_filter() {
    let config = PlaylistConfig::from_value(json!({
        "name": "loose",
        "audio_features": { "energy": {} }
    }))
    .unwrap();
    assert!(!config.has_filters());
}

#[test]
fn test_toml_and_json_text() {
    let toml = r#"
name = "focus"
genres = ["classical"]

[audio_features.instrumentalness]
min = 0.8

[[additional_tracks]]
name = "Gymnopédie No.1"
artist = "Erik Satie"
"#;
    let from_toml = PlaylistConfig::from_str_with_format(toml, Path::new("focus.toml")).unwrap();

    let json = r#"{
        "name": "focus",
        "genres": ["classical"],
        "audio_features": { "instrumentalness": { "min": 0.8 } },
        "additional_tracks": [{ "name": "Gymnopédie No.1", "artist": "Erik Satie" }]
    }"#;
    let from_json = PlaylistConfig::from_str_with_format(json, Path::new("focus.json")).unwrap();

    assert_eq!(from_toml, from_json);
}

#[test]
fn test_yaml_definition() {
    let yaml = r#"
name: focus
genres:
  - classical
audio_features:
  instrumentalness:
    min: 0.8
additional_tracks:
  - name: Gymnopédie No.1
    artist: Erik Satie
"#;
    let from_yaml = PlaylistConfig::from_str_with_format(yaml, Path::new("focus.yaml")).unwrap();
    let from_yml = PlaylistConfig::from_str_with_format(yaml, Path::new("focus.yml")).unwrap();

    assert_eq!(from_yaml, from_yml);
    assert_eq!(from_yaml.name, "focus");
    assert_eq!(from_yaml.genres, vec!["classical".to_string()]);
    assert_eq!(
        from_yaml.audio_features.unwrap()[&AudioFeature::Instrumentalness],
        FeatureRange {
            min: Some(0.8),
            max: None
        }
    );
    assert_eq!(from_yaml.additional_tracks[0].artist.as_deref(), Some("Erik Satie"));
    assert!(!from_yaml.additional_tracks[0].rotate);
}

#[test]
fn test_unparsable_yaml() {
    let err = PlaylistConfig::from_str_with_format("name: [unclosed", Path::new("bad.yaml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "bad.yaml"));
}

#[tokio::test]
async fn test_definition_files_include_yaml() {
    let dir = scratch_dir("yaml-dir");
    std::fs::write(dir.join("chill.yaml"), "name: chill
genres: [ambient]
").unwrap();
    std::fs::write(dir.join("focus.yml"), "name: focus
").unwrap();
    std::fs::write(dir.join("readme.md"), "# playlists").unwrap();
    std::fs::create_dir_all(dir.join("nested.yaml")).unwrap();

    let files: Vec<String> = definition_files(&dir)
        .await
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(files, vec!["chill.yaml".to_string(), "focus.yml".to_string()]);

    let loaded = load_dir(&dir).await.unwrap();
    assert!(loaded.iter().all(|(_, result)| result.is_ok()));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unparsable_text() {
    let err = PlaylistConfig::from_str_with_format("name = ", Path::new("bad.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "bad.toml"));
}

#[tokio::test]
async fn test_load_dir_isolates_broken_files() {
    let dir = scratch_dir("load-dir");
    std::fs::write(dir.join("b_chill.toml"), "name = \"chill\"\ngenres = [\"ambient\"]\n").unwrap();
    std::fs::write(dir.join("a_focus.json"), r#"{ "name": "focus" }"#).unwrap();
    std::fs::write(dir.join("c_broken.toml"), "genres = [\"jazz\"]\n").unwrap();
    std::fs::write(dir.join("notes.txt"), "not a playlist").unwrap();

    let files = definition_files(&dir).await.unwrap();
    assert_eq!(files.len(), 3);

    let loaded = load_dir(&dir).await.unwrap();
    let names: Vec<_> = loaded
        .iter()
        .map(|(path, result)| {
            (
                path.file_name().unwrap().to_string_lossy().to_string(),
                result.as_ref().map(|c| c.name.clone()).ok(),
            )
        })
        .collect();

    assert_eq!(
        names,
        vec![
            ("a_focus.json".to_string(), Some("focus".to_string())),
            ("b_chill.toml".to_string(), Some("chill".to_string())),
            ("c_broken.toml".to_string(), None),
        ]
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_load_dir_missing_directory() {
    let dir = std::env::temp_dir().join("smartlists-does-not-exist-at-all");
    let err = load_dir(&dir).await.unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_parse_target_size() {
    assert_eq!(parse_target_size("30").unwrap(), 30);
    assert_eq!(parse_target_size(" 12 ").unwrap(), 12);
    assert_eq!(parse_target_size("6").unwrap(), 6);
    assert!(parse_target_size("0").is_err());

    // Sizes that leave no room next to the backfill slots are unusable
    for value in ["1", "4", "5"] {
        let err = parse_target_size(value).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting { name: "SMARTLISTS_TARGET_SIZE", value: ref v } if v == value
        ));
    }
    assert!(parse_target_size("-3").is_err());
    assert!(parse_target_size("many").is_err());
}

#[test]
fn test_parsed_target_size_is_always_selectable() {
    let size = parse_target_size("6").unwrap();
    let options = SelectionOptions::with_target_size(size);
    assert_eq!(options.root_sample_size(), 1);

    let undersized = SelectionOptions::with_target_size(4);
    assert_eq!(undersized.root_sample_size(), 0);
}

#[test]
fn test_spotify_credentials_are_checked_lazily() {
    let mut settings = Settings::local("spotify.db".into(), "playlists".into());

    assert!(matches!(
        settings.require_client_id(),
        Err(ConfigError::MissingSetting("SPOTIFY_CLIENT_ID"))
    ));
    assert!(matches!(
        settings.require_redirect_uri(),
        Err(ConfigError::MissingSetting("SPOTIFY_REDIRECT_URI"))
    ));

    settings.client_id = Some("client".to_string());
    settings.redirect_uri = Some("http://127.0.0.1:8888/callback".to_string());
    assert_eq!(settings.require_client_id().unwrap(), "client");
    assert_eq!(
        settings.require_redirect_uri().unwrap(),
        "http://127.0.0.1:8888/callback"
    );
}

#[test]
fn test_authorize_url_needs_client_id() {
    let mut settings = Settings::local("spotify.db".into(), "playlists".into());
    settings.redirect_uri = Some("http://127.0.0.1:8888/callback".to_string());

    let err = authorize_url(&settings, "challenge").unwrap_err();
    assert!(matches!(
        err,
        SpotifyError::Config(ConfigError::MissingSetting("SPOTIFY_CLIENT_ID"))
    ));

    settings.client_id = Some("client".to_string());
    let url = authorize_url(&settings, "challenge").unwrap();
    let query = url.query().unwrap();
    assert!(query.contains("client_id=client"));
    assert!(query.contains("code_challenge=challenge"));
}
