use async_trait::async_trait;
use futures_util::FutureExt;
use reqwest::Client;
use serde_json::Value;

use super::{first_success, get_json, millis_to_secs, str_field, Attempt, FetchError, PlaylistSource};
use crate::config::AppleMusicConfig;
use crate::models::{FetchedPlaylist, ImportedTrack, Platform};

const APPLE_MUSIC_ORIGIN: &str = "https://music.apple.com";
const DEFAULT_STOREFRONT: &str = "us";

/// Apple Music catalog playlists. One request, no fallback.
pub struct AppleMusicSource {
    client: Client,
    config: AppleMusicConfig,
}

impl AppleMusicSource {
    pub fn new(client: Client, config: AppleMusicConfig) -> Self {
        Self { client, config }
    }

    async fn fetch_from_catalog(
        &self,
        storefront: &str,
        playlist_id: &str,
    ) -> Result<FetchedPlaylist, FetchError> {
        let url = format!(
            "{}/v1/catalog/{}/playlists/{}?include=tracks",
            self.config.api_url.trim_end_matches('/'),
            storefront,
            playlist_id
        );

        let data = get_json(
            &self.client,
            &url,
            &[("Origin", APPLE_MUSIC_ORIGIN), ("Accept", "application/json")],
        )
        .await?;

        parse_catalog_response(&data)
    }
}

#[async_trait]
impl PlaylistSource for AppleMusicSource {
    fn platform(&self) -> Platform {
        Platform::AppleMusic
    }

    async fn fetch(&self, playlist_id: &str, storefront: Option<&str>) -> Option<FetchedPlaylist> {
        let storefront = storefront.unwrap_or(DEFAULT_STOREFRONT);
        log::info!("Fetching Apple Music playlist: {} ({})", playlist_id, storefront);

        let attempts: Vec<Attempt<'_>> = vec![(
            "catalog api".to_string(),
            self.fetch_from_catalog(storefront, playlist_id).boxed(),
        )];

        first_success("Apple Music", attempts).await
    }
}

/// JSON:API shape: `data[0].attributes.name` and
/// `data[0].relationships.tracks.data[].attributes`.
pub fn parse_catalog_response(data: &Value) -> Result<FetchedPlaylist, FetchError> {
    let playlist = data
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .ok_or_else(|| FetchError::Parse("Missing playlist in 'data'".to_string()))?;

    let name = playlist
        .pointer("/attributes/name")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let items = playlist
        .pointer("/relationships/tracks/data")
        .and_then(|t| t.as_array())
        .ok_or_else(|| FetchError::Parse("Missing track relationship".to_string()))?;

    // Unlike Spotify, entries with missing fields are kept as-is.
    let tracks = items
        .iter()
        .map(|item| {
            let attrs = item.get("attributes").unwrap_or(&Value::Null);
            ImportedTrack {
                title: str_field(attrs, "name").unwrap_or_default().to_string(),
                artist: str_field(attrs, "artistName").unwrap_or_default().to_string(),
                album: str_field(attrs, "albumName").map(String::from),
                duration: millis_to_secs(attrs.get("durationInMillis")),
            }
        })
        .collect();

    Ok(FetchedPlaylist { name, tracks })
}
