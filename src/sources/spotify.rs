use async_trait::async_trait;
use futures_util::FutureExt;
use reqwest::Client;
use serde_json::Value;

use super::{first_success, get_json, get_text, millis_to_secs, str_field, Attempt, FetchError, PlaylistSource};
use crate::config::SpotifyConfig;
use crate::models::{FetchedPlaylist, ImportedTrack, Platform};

const NEXT_DATA_OPEN_TAG: &str = r#"<script id="__NEXT_DATA__" type="application/json">"#;
const DEFAULT_PLAYLIST_NAME: &str = "Spotify Playlist";

/// Spotify playlists, read without authentication.
///
/// Three strategies are tried in order: a metadata service returning a ready
/// track list, a scraper service with a different payload shape, and finally
/// the JSON blob embedded in the public embed page.
pub struct SpotifySource {
    client: Client,
    config: SpotifyConfig,
}

impl SpotifySource {
    pub fn new(client: Client, config: SpotifyConfig) -> Self {
        Self { client, config }
    }

    async fn fetch_from_metadata_api(&self, playlist_id: &str) -> Result<FetchedPlaylist, FetchError> {
        let playlist_url = format!("https://open.spotify.com/playlist/{}", playlist_id);
        let url = format!(
            "{}/spotify/get?url={}",
            self.config.metadata_api_url.trim_end_matches('/'),
            urlencoding::encode(&playlist_url)
        );

        let data = get_json(&self.client, &url, &[]).await?;
        parse_metadata_response(&data)
    }

    async fn fetch_from_scraper(&self, playlist_id: &str) -> Result<FetchedPlaylist, FetchError> {
        let base = self.config.scraper_api_url.trim_end_matches('/');
        let origin = self.config.scraper_origin.as_str();
        let referer = format!("{}/", origin.trim_end_matches('/'));
        let headers = [("Origin", origin), ("Referer", referer.as_str())];

        let metadata = get_json(
            &self.client,
            &format!("{}/metadata/playlist/{}", base, playlist_id),
            &headers,
        )
        .await?;
        let track_list = get_json(
            &self.client,
            &format!("{}/trackList/playlist/{}", base, playlist_id),
            &headers,
        )
        .await?;

        parse_scraper_response(&metadata, &track_list)
    }

    async fn fetch_from_embed(&self, playlist_id: &str) -> Result<FetchedPlaylist, FetchError> {
        let url = format!(
            "{}/embed/playlist/{}",
            self.config.embed_url.trim_end_matches('/'),
            playlist_id
        );

        let html = get_text(&self.client, &url, &[("Accept", "text/html")]).await?;
        parse_embed_page(&html)
    }
}

#[async_trait]
impl PlaylistSource for SpotifySource {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    async fn fetch(&self, playlist_id: &str, _storefront: Option<&str>) -> Option<FetchedPlaylist> {
        log::info!("Fetching Spotify playlist: {}", playlist_id);

        let attempts: Vec<Attempt<'_>> = vec![
            ("metadata api".to_string(), self.fetch_from_metadata_api(playlist_id).boxed()),
            ("scraper api".to_string(), self.fetch_from_scraper(playlist_id).boxed()),
            ("embed page".to_string(), self.fetch_from_embed(playlist_id).boxed()),
        ];

        first_success("Spotify", attempts).await
    }
}

/// `{ "result": { "name", "tracks": [{ "name", "artists", "album"?, "duration_ms" }] } }`
pub fn parse_metadata_response(data: &Value) -> Result<FetchedPlaylist, FetchError> {
    let result = data
        .get("result")
        .ok_or_else(|| FetchError::Parse("Missing 'result' section".to_string()))?;

    let items = result
        .get("tracks")
        .and_then(|t| t.as_array())
        .ok_or_else(|| FetchError::Parse("Missing 'tracks' list".to_string()))?;

    let tracks = items
        .iter()
        .filter_map(|item| {
            track_from_parts(
                str_field(item, "name"),
                item.get("artists").and_then(join_artists),
                item.get("album").and_then(album_name),
                millis_to_secs(item.get("duration_ms")),
            )
        })
        .collect();

    Ok(FetchedPlaylist {
        name: playlist_name(str_field(result, "name")),
        tracks,
    })
}

/// Metadata `{ "title" }` plus track list `{ "trackList": [{ "title", "artists", "album"? }] }`.
pub fn parse_scraper_response(metadata: &Value, track_list: &Value) -> Result<FetchedPlaylist, FetchError> {
    if metadata.get("success").and_then(|v| v.as_bool()) == Some(false) {
        let message = str_field(metadata, "message").unwrap_or("unsuccessful response");
        return Err(FetchError::Parse(message.to_string()));
    }

    let items = track_list
        .get("trackList")
        .and_then(|t| t.as_array())
        .ok_or_else(|| FetchError::Parse("Missing 'trackList'".to_string()))?;

    let tracks = items
        .iter()
        .filter_map(|item| {
            track_from_parts(
                str_field(item, "title"),
                item.get("artists").and_then(join_artists),
                item.get("album").and_then(album_name),
                millis_to_secs(item.get("duration")),
            )
        })
        .collect();

    Ok(FetchedPlaylist {
        name: playlist_name(str_field(metadata, "title").or_else(|| str_field(metadata, "name"))),
        tracks,
    })
}

/// Reads the `__NEXT_DATA__` JSON the embed page ships for client hydration.
pub fn parse_embed_page(html: &str) -> Result<FetchedPlaylist, FetchError> {
    let start = html
        .find(NEXT_DATA_OPEN_TAG)
        .map(|idx| idx + NEXT_DATA_OPEN_TAG.len())
        .ok_or_else(|| FetchError::Parse("No __NEXT_DATA__ script in embed page".to_string()))?;
    let end = html[start..]
        .find("</script>")
        .ok_or_else(|| FetchError::Parse("Unterminated __NEXT_DATA__ script".to_string()))?;

    let data: Value = serde_json::from_str(&html[start..start + end])?;

    let entity = data
        .pointer("/props/pageProps/state/data/entity")
        .ok_or_else(|| FetchError::Parse("Missing playlist entity in embed data".to_string()))?;

    let items = entity
        .get("trackList")
        .and_then(|t| t.as_array())
        .ok_or_else(|| FetchError::Parse("Missing 'trackList' in embed data".to_string()))?;

    let tracks = items
        .iter()
        .filter_map(|item| {
            track_from_parts(
                str_field(item, "title"),
                str_field(item, "subtitle").map(tidy_subtitle),
                None,
                millis_to_secs(item.get("duration")),
            )
        })
        .collect();

    Ok(FetchedPlaylist {
        name: playlist_name(str_field(entity, "name").or_else(|| str_field(entity, "title"))),
        tracks,
    })
}

// Tracks without a title or artist are dropped.
fn track_from_parts(
    title: Option<&str>,
    artist: Option<String>,
    album: Option<String>,
    duration: Option<u64>,
) -> Option<ImportedTrack> {
    let title = title.map(str::trim).filter(|t| !t.is_empty())?;
    let artist = artist.map(|a| a.trim().to_string()).filter(|a| !a.is_empty())?;

    Some(ImportedTrack {
        title: title.to_string(),
        artist,
        album: album.filter(|a| !a.is_empty()),
        duration,
    })
}

/// Accepts `"A, B"`, `["A", "B"]` or `[{ "name": "A" }, ...]`.
fn join_artists(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let names: Vec<&str> = items
                .iter()
                .filter_map(|a| a.as_str().or_else(|| str_field(a, "name")))
                .collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        _ => None,
    }
}

fn album_name(value: &Value) -> Option<String> {
    value
        .as_str()
        .or_else(|| str_field(value, "name"))
        .map(String::from)
}

// The embed page separates artists with a non-breaking space after the comma.
fn tidy_subtitle(subtitle: &str) -> String {
    subtitle.replace('\u{a0}', " ")
}

fn playlist_name(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_PLAYLIST_NAME)
        .to_string()
}
