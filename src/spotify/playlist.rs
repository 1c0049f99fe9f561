use async_trait::async_trait;

use super::{PLAYLIST_ITEMS_BATCH_SIZE, PlaylistService, SpotifyClient};
use crate::{
    error::SpotifyError,
    types::{
        CreatePlaylistRequest, CreatePlaylistResponse, GetUserPlaylistsResponse, PlaylistPage,
        RecommendationsResponse, TrackUrisRequest,
    },
    utils,
};

#[async_trait]
impl PlaylistService for SpotifyClient {
    async fn user_playlists(&self, offset: u32, limit: u32) -> Result<PlaylistPage, SpotifyError> {
        let url = self.url("/me/playlists");
        let response: GetUserPlaylistsResponse = self
            .send(|c| c.get(&url).query(&[("offset", offset), ("limit", limit)]))
            .await?
            .json()
            .await?;

        Ok(PlaylistPage {
            has_next: response.next.is_some(),
            items: response.items,
        })
    }

    async fn create_playlist(&self, name: &str) -> Result<String, SpotifyError> {
        let user_id = self.current_user_id().await?;
        let url = self.url(&format!("/users/{}/playlists", user_id));
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: "Rotating smart playlist managed by smartlists".to_string(),
            public: true,
            collaborative: false,
        };

        let response: CreatePlaylistResponse = self
            .send(|c| c.post(&url).json(&body))
            .await?
            .json()
            .await?;

        Ok(response.id)
    }

    /// The first batch replaces the playlist, later batches are appended, so
    /// selections longer than one request still end up in order.
    async fn replace_playlist_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        let url = self.url(&format!("/playlists/{}/tracks", playlist_id));
        let uris: Vec<String> = track_ids.iter().map(|id| utils::track_uri(id)).collect();
        let mut batches = uris.chunks(PLAYLIST_ITEMS_BATCH_SIZE);

        let first = TrackUrisRequest {
            uris: batches.next().map(<[String]>::to_vec).unwrap_or_default(),
        };
        self.send(|c| c.put(&url).json(&first)).await?;

        for batch in batches {
            let body = TrackUrisRequest {
                uris: batch.to_vec(),
            };
            self.send(|c| c.post(&url).json(&body)).await?;
        }

        Ok(())
    }

    async fn recommendations(
        &self,
        seed_track_ids: &[String],
        limit: usize,
    ) -> Result<Vec<String>, SpotifyError> {
        if seed_track_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.url("/recommendations");
        let seeds = seed_track_ids.join(",");
        let limit = limit.to_string();
        let response: RecommendationsResponse = self
            .send(|c| {
                c.get(&url)
                    .query(&[("seed_tracks", seeds.as_str()), ("limit", limit.as_str())])
            })
            .await?
            .json()
            .await?;

        Ok(response.tracks.into_iter().filter_map(|t| t.id).collect())
    }
}
