use async_trait::async_trait;
use futures_util::FutureExt;
use reqwest::Client;
use serde_json::Value;

use super::{first_success, get_json, str_field, Attempt, FetchError, PlaylistSource};
use crate::config::YoutubeMusicConfig;
use crate::models::{FetchedPlaylist, ImportedTrack, Platform};

const TOPIC_SUFFIX: &str = " - Topic";

/// YouTube Music playlists through a federation of Piped API instances.
///
/// Instances are interchangeable; each one is a separate attempt and the first
/// to answer with tracks wins.
pub struct YoutubeMusicSource {
    client: Client,
    instances: Vec<String>,
}

impl YoutubeMusicSource {
    pub fn new(client: Client, config: YoutubeMusicConfig) -> Self {
        Self {
            client,
            instances: config.instances,
        }
    }

    async fn fetch_from_instance(
        &self,
        instance: &str,
        playlist_id: &str,
    ) -> Result<FetchedPlaylist, FetchError> {
        let url = format!("{}/playlists/{}", instance.trim_end_matches('/'), playlist_id);
        let data = get_json(&self.client, &url, &[]).await?;
        parse_piped_playlist(&data)
    }
}

#[async_trait]
impl PlaylistSource for YoutubeMusicSource {
    fn platform(&self) -> Platform {
        Platform::YoutubeMusic
    }

    async fn fetch(&self, playlist_id: &str, _storefront: Option<&str>) -> Option<FetchedPlaylist> {
        log::info!(
            "Fetching YouTube Music playlist {} across {} instances",
            playlist_id,
            self.instances.len()
        );

        let attempts: Vec<Attempt<'_>> = self
            .instances
            .iter()
            .map(|instance| {
                (
                    instance.clone(),
                    self.fetch_from_instance(instance, playlist_id).boxed(),
                )
            })
            .collect();

        first_success("YouTube Music", attempts).await
    }
}

/// `{ "name", "relatedStreams": [{ "title", "uploaderName", "duration" }] }`
pub fn parse_piped_playlist(data: &Value) -> Result<FetchedPlaylist, FetchError> {
    if let Some(error) = str_field(data, "error") {
        return Err(FetchError::Parse(error.to_string()));
    }

    let items = data
        .get("relatedStreams")
        .and_then(|s| s.as_array())
        .ok_or_else(|| FetchError::Parse("Missing 'relatedStreams'".to_string()))?;

    let tracks = items
        .iter()
        .map(|item| ImportedTrack {
            title: str_field(item, "title").unwrap_or_default().to_string(),
            artist: strip_topic(str_field(item, "uploaderName").unwrap_or_default()),
            album: None,
            duration: item.get("duration").and_then(|d| d.as_u64()).filter(|d| *d > 0),
        })
        .collect();

    Ok(FetchedPlaylist {
        name: str_field(data, "name").unwrap_or_default().to_string(),
        tracks,
    })
}

// Auto-generated artist channels are named "<Artist> - Topic".
fn strip_topic(uploader: &str) -> String {
    uploader
        .strip_suffix(TOPIC_SUFFIX)
        .unwrap_or(uploader)
        .to_string()
}
