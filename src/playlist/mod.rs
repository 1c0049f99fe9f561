//! Playlist assembly: definitions, root playlists, selection and sync.
//!
//! ```text
//! PlaylistConfig ──compile──▶ root_playlists ──select──▶ Selection ──sync──▶ Spotify
//!                                   ▲                        ▲
//!                              library mirror          play history +
//!                                                     recommendations
//! ```
//!
//! Playlists are processed one after another. Compiling replaces stored
//! state, so two runs against the same database must not overlap.

pub mod config;
pub mod predicate;
pub mod root;
pub mod selector;
pub mod sync;

pub use config::{AudioFeature, FeatureRange, PlaylistConfig, TrackOverride};
pub use predicate::{Column, Predicate};
pub use root::{
    RootPlaylist, RootTrack, UnresolvedPolicy, compile_root_playlist, load_root_playlist,
    prune_root_playlists, root_playlist_names,
};
pub use selector::{
    ROTATION_WINDOW_DAYS, Selection, SelectionOptions, eligible_tracks, is_eligible,
    rotation_violations, select_tracks,
};
pub use sync::{SyncOutcome, find_playlist, sync_playlist};
