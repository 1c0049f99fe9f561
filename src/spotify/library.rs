use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{LibraryService, SpotifyClient};
use crate::{
    error::SpotifyError,
    types::{
        Artist, AudioFeatures, AudioFeaturesResponse, PlayHistoryItem, RecentlyPlayedResponse,
        SavedTrackPage, SavedTracksResponse, SeveralArtistsResponse,
    },
    utils,
};

/// The play history endpoint never returns more than this per call.
const RECENTLY_PLAYED_LIMIT: u32 = 50;

#[async_trait]
impl LibraryService for SpotifyClient {
    async fn saved_tracks(&self, offset: u32, limit: u32) -> Result<SavedTrackPage, SpotifyError> {
        let url = self.url("/me/tracks");
        let response: SavedTracksResponse = self
            .send(|c| c.get(&url).query(&[("offset", offset), ("limit", limit)]))
            .await?
            .json()
            .await?;

        Ok(SavedTrackPage {
            has_next: response.next.is_some(),
            items: response.items,
        })
    }

    async fn recently_played(
        &self,
        after: Option<NaiveDateTime>,
    ) -> Result<Vec<PlayHistoryItem>, SpotifyError> {
        let url = self.url("/me/player/recently-played");
        let after = after.map(utils::unix_millis);
        let response: RecentlyPlayedResponse = self
            .send(|c| {
                let request = c.get(&url).query(&[("limit", RECENTLY_PLAYED_LIMIT)]);
                match after {
                    Some(ms) => request.query(&[("after", ms)]),
                    None => request,
                }
            })
            .await?
            .json()
            .await?;

        Ok(response.items)
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<Artist>, SpotifyError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.url("/artists");
        let joined = ids.join(",");
        let response: SeveralArtistsResponse = self
            .send(|c| c.get(&url).query(&[("ids", joined.as_str())]))
            .await?
            .json()
            .await?;

        Ok(response.artists.into_iter().flatten().collect())
    }

    async fn audio_features(&self, ids: &[String]) -> Result<Vec<AudioFeatures>, SpotifyError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.url("/audio-features");
        let joined = ids.join(",");
        let response: AudioFeaturesResponse = self
            .send(|c| c.get(&url).query(&[("ids", joined.as_str())]))
            .await?
            .json()
            .await?;

        Ok(response.audio_features.into_iter().flatten().collect())
    }
}
