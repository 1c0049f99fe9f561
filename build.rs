//! Build script for smartlists.
//!
//! Installs templates into the local data directory, where `config::load_env`
//! looks for `.env`:
//!
//! - `.env.example` from the crate root
//! - the sample definitions from `playlists/` into `playlists.example/`
//!
//! Data directory per platform:
//!
//! - Linux: `~/.local/share/smartlists/`
//! - macOS: `~/Library/Application Support/smartlists/`
//! - Windows: `%LOCALAPPDATA%/smartlists/`
//!
//! Missing templates only produce a cargo warning.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

type BuildResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> BuildResult<()> {
    println!("cargo:rerun-if-changed=.env.example");
    println!("cargo:rerun-if-changed=playlists");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    let mut data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    data_dir.push("smartlists");
    fs::create_dir_all(&data_dir)?;

    install_template(
        &manifest_dir.join(".env.example"),
        &data_dir.join(".env.example"),
    )?;
    install_sample_playlists(
        &manifest_dir.join("playlists"),
        &data_dir.join("playlists.example"),
    )?;

    Ok(())
}

fn install_template(source: &Path, target: &Path) -> BuildResult<()> {
    if !source.is_file() {
        println!("cargo:warning={} not found", source.display());
        return Ok(());
    }

    let contents = fs::read_to_string(source)?;
    fs::write(target, contents)?;
    Ok(())
}

/// Copies every `*.yaml` / `*.yml` / `*.toml` / `*.json` definition. User
/// files in the target directory with other names are left alone.
fn install_sample_playlists(source_dir: &Path, target_dir: &Path) -> BuildResult<()> {
    if !source_dir.is_dir() {
        println!(
            "cargo:warning=sample playlists not found at {}",
            source_dir.display()
        );
        return Ok(());
    }

    fs::create_dir_all(target_dir)?;
    for entry in fs::read_dir(source_dir)? {
        let path = entry?.path();
        let is_definition = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml") | Some("toml") | Some("json")
        );
        if !is_definition {
            continue;
        }
        if let Some(file_name) = path.file_name() {
            install_template(&path, &target_dir.join(file_name))?;
        }
    }

    Ok(())
}
