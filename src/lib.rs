//! Smart playlist engine for Spotify
//!
//! This library keeps a set of personally curated playlists alive on Spotify. It
//! mirrors the user's library, play history and track metadata into a local
//! SQLite store, compiles declarative playlist definitions into candidate track
//! sets ("root playlists"), selects a rotation-aware track list from each root
//! playlist and pushes it back to Spotify.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Settings loaded from the environment and `.env` files
//! - `credentials` - Encrypted token cache stored next to the library mirror
//! - `error` - Error types shared across the engine
//! - `management` - Token lifecycle management
//! - `mirror` - Jobs that copy library, history and metadata into the store
//! - `playlist` - Playlist definitions, root playlist compiler, selector and sync
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `store` - SQLite schema and mirroring queries
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use smartlists::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> smartlists::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     cli::build(&settings).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod management;
pub mod mirror;
pub mod playlist;
pub mod server;
pub mod spotify;
pub mod store;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for CLI glue that may fail.
///
/// Core modules return their own error enums from [`error`]; this alias is
/// used where any of them may surface, boxed behind a trait object that keeps
/// the Send + Sync bounds needed in async contexts.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```ignore
/// info!("Compiling root playlist {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```ignore
/// success!("Synced {} tracks to {}", count, name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for failures that leave the process without a usable state, such as a
/// missing cache key or an unreadable database. Per-playlist failures use
/// [`warning!`] and carry on with the next playlist.
///
/// # Example
///
/// ```ignore
/// error!("Cannot open database {}: {}", path.display(), e);
/// // Program exits here
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```ignore
/// warning!("Pinned track {} not found in library", name);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
