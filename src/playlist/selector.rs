//! Rotation-aware track selection.
//!
//! Picks the tracks that go out to Spotify: a random sample of the root
//! playlist minus everything played inside the rotation window, topped up
//! with recommendations seeded from what was already picked.

use chrono::{Duration, NaiveDateTime};
use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom},
};
use rusqlite::Connection;

use super::root::{RootTrack, load_root_playlist};
use crate::{error::SelectionError, error::StoreError, spotify::PlaylistService, store, warning};

/// Tracks played within this many days are rested.
pub const ROTATION_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_TARGET_SIZE: usize = 25;
pub const DEFAULT_BACKFILL_COUNT: usize = 5;
/// Spotify accepts at most five seed tracks.
pub const MAX_SEED_TRACKS: usize = 5;
pub const MAX_RECOMMENDATIONS_PER_CALL: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    pub target_size: usize,
    /// Slots held back from the root sample for recommendations.
    pub backfill_count: usize,
    pub max_seed_tracks: usize,
    pub max_recommendations_per_call: usize,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            backfill_count: DEFAULT_BACKFILL_COUNT,
            max_seed_tracks: MAX_SEED_TRACKS,
            max_recommendations_per_call: MAX_RECOMMENDATIONS_PER_CALL,
        }
    }
}

impl SelectionOptions {
    pub fn with_target_size(target_size: usize) -> Self {
        Self {
            target_size,
            ..Self::default()
        }
    }

    /// How many root tracks to sample before backfilling.
    pub fn root_sample_size(&self) -> usize {
        self.target_size.saturating_sub(self.backfill_count)
    }

    fn validate(&self) -> Result<(), SelectionError> {
        if self.target_size == 0 || self.backfill_count >= self.target_size {
            return Err(SelectionError::InvalidTarget {
                target_size: self.target_size,
                backfill_count: self.backfill_count,
            });
        }
        Ok(())
    }
}

/// Outcome of one selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Final track list, in push order.
    pub tracks: Vec<String>,
    /// How many of them came from the root playlist.
    pub from_root: usize,
    /// How many came from recommendations.
    pub recommended: usize,
    /// Recommendation calls made.
    pub recommendation_calls: usize,
}

impl Selection {
    pub fn is_short(&self, target_size: usize) -> bool {
        self.tracks.len() < target_size
    }
}

/// Whether `track` may be picked at `now`, given its most recent play.
///
/// Non-rotating tracks are always eligible. Rotating tracks are rested while
/// their last play is no more than [`ROTATION_WINDOW_DAYS`] old.
pub fn is_eligible(track: &RootTrack, last_played: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    if !track.rotate {
        return true;
    }
    match last_played {
        Some(played_at) => now - played_at > Duration::days(ROTATION_WINDOW_DAYS),
        None => true,
    }
}

/// Root playlist tracks of `name` that are eligible at `now`.
pub fn eligible_tracks(
    conn: &Connection,
    name: &str,
    now: NaiveDateTime,
) -> Result<Vec<RootTrack>, StoreError> {
    let root = load_root_playlist(conn, name)?;
    let history = store::last_played(conn)?;

    Ok(root
        .tracks
        .into_iter()
        .filter(|track| is_eligible(track, history.get(&track.track_id).copied(), now))
        .collect())
}

/// Tracks in `selection` that rotate in playlist `name` but were played
/// inside the window. A correct selection has none coming from the root
/// playlist; recommendations can still land here.
pub fn rotation_violations(
    conn: &Connection,
    name: &str,
    selection: &[String],
    now: NaiveDateTime,
) -> Result<Vec<String>, StoreError> {
    let root = load_root_playlist(conn, name)?;
    let history = store::last_played(conn)?;

    Ok(selection
        .iter()
        .filter(|id| {
            let rotate = root
                .tracks
                .iter()
                .find(|t| &t.track_id == *id)
                .is_none_or(|t| t.rotate);
            let track = RootTrack {
                track_id: (*id).clone(),
                rotate,
            };
            !is_eligible(&track, history.get(*id).copied(), now)
        })
        .cloned()
        .collect())
}

/// Picks the final track list for playlist `name` out of `eligible`.
///
/// Samples up to `target_size - backfill_count` eligible tracks, then asks
/// `service` for recommendations seeded by a random subset of the picks until
/// the list is full. A call returning nothing ends the backfill early and the
/// list stays short. The result is shuffled so recommendations are mixed in.
///
/// # Errors
///
/// - [`SelectionError::InvalidTarget`] for unusable options
/// - [`SelectionError::NoSeedTracks`] when nothing is eligible, so there is
///   nothing to seed recommendations with
/// - [`SelectionError::Spotify`] when a recommendation call fails
pub async fn select_tracks<P, R>(
    service: &P,
    name: &str,
    eligible: &[RootTrack],
    options: &SelectionOptions,
    rng: &mut R,
) -> Result<Selection, SelectionError>
where
    P: PlaylistService + ?Sized,
    R: Rng + ?Sized,
{
    options.validate()?;

    let mut tracks: Vec<String> = eligible
        .choose_multiple(rng, options.root_sample_size().min(eligible.len()))
        .map(|t| t.track_id.clone())
        .collect();
    let from_root = tracks.len();
    let mut recommendation_calls = 0;

    while tracks.len() < options.target_size {
        if tracks.is_empty() {
            return Err(SelectionError::NoSeedTracks(name.to_string()));
        }

        let seeds: Vec<String> = tracks
            .choose_multiple(rng, options.max_seed_tracks.min(tracks.len()))
            .cloned()
            .collect();
        let shortfall = options.target_size - tracks.len();
        let limit = shortfall.min(options.max_recommendations_per_call);

        let mut recommended = service.recommendations(&seeds, limit).await?;
        recommendation_calls += 1;

        if recommended.is_empty() {
            warning!(
                "No recommendations returned for playlist `{}`; it will have {} of {} tracks.",
                name,
                tracks.len(),
                options.target_size
            );
            break;
        }

        recommended.truncate(shortfall);
        tracks.extend(recommended);
    }

    let recommended = tracks.len() - from_root;
    tracks.shuffle(rng);

    Ok(Selection {
        tracks,
        from_root,
        recommended,
        recommendation_calls,
    })
}
