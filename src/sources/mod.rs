//! Platform playlist sources.
//!
//! Each source owns an ordered list of retrieval attempts. Attempts are plain
//! futures, so nothing runs until [`first_success`] polls it; the first attempt
//! yielding at least one track wins and the rest are dropped unpolled.

pub mod apple_music;
pub mod error;
pub mod spotify;
pub mod youtube_music;

pub use apple_music::AppleMusicSource;
pub use error::FetchError;
pub use spotify::SpotifySource;
pub use youtube_music::YoutubeMusicSource;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde_json::Value;

use crate::models::{FetchedPlaylist, Platform};

/// A labelled retrieval attempt, evaluated lazily.
pub type Attempt<'a> = (String, BoxFuture<'a, Result<FetchedPlaylist, FetchError>>);

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetches a playlist by its platform-native id. `storefront` is only used
    /// by Apple Music. Failures are logged and reported as `None`.
    async fn fetch(&self, playlist_id: &str, storefront: Option<&str>) -> Option<FetchedPlaylist>;
}

/// Runs `attempts` in order and returns the first playlist with tracks.
pub async fn first_success(source: &str, attempts: Vec<Attempt<'_>>) -> Option<FetchedPlaylist> {
    let total = attempts.len();

    for (idx, (label, attempt)) in attempts.into_iter().enumerate() {
        log::debug!("[{}/{}] {}: trying {}", idx + 1, total, source, label);

        match attempt.await.and_then(require_tracks) {
            Ok(playlist) => {
                log::info!(
                    "{}: fetched '{}' ({} tracks) via {}",
                    source,
                    playlist.name,
                    playlist.tracks.len(),
                    label
                );
                return Some(playlist);
            }
            Err(e) => {
                log::warn!("[{}/{}] {}: {} failed: {}", idx + 1, total, source, label, e);
            }
        }
    }

    log::error!("{}: all {} attempts failed", source, total);
    None
}

fn require_tracks(playlist: FetchedPlaylist) -> Result<FetchedPlaylist, FetchError> {
    if playlist.tracks.is_empty() {
        Err(FetchError::Empty)
    } else {
        Ok(playlist)
    }
}

pub(crate) async fn get_text(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String, FetchError> {
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        log::debug!("Request failed ({}) at {}", status, url);
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok(response.text().await?)
}

pub(crate) async fn get_json(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<Value, FetchError> {
    let text = get_text(client, url, headers).await?;
    serde_json::from_str(&text).map_err(|e| FetchError::Parse(format!("JSON error at {}: {}", url, e)))
}

pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

pub(crate) fn millis_to_secs(value: Option<&Value>) -> Option<u64> {
    value.and_then(|v| v.as_u64()).map(|ms| ms / 1000)
}
