pub mod models;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;

use super::CatalogBackend;
use crate::config::SubsonicConfig;
use crate::models::{CatalogSource, CatalogTrack};
use models::{SearchResult3Data, SubsonicResponse, SubsonicSong};

const CLIENT_NAME: &str = "sonami";
const API_VERSION: &str = "1.13.0";
const SEARCH_SONG_COUNT: u32 = 10;
const COVER_SIZE: u32 = 640;

/// Fallback catalog: a user-configured Subsonic-compatible server.
pub struct SubsonicCatalog {
    client: Client,
    server_url: String,
    username: String,
    password: String,
}

impl SubsonicCatalog {
    pub fn new(client: Client, config: SubsonicConfig) -> Self {
        Self {
            client,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
        }
    }

    fn generate_salt() -> String {
        let mut rng = rand::rng();
        let random_bytes: Vec<u8> = (0..16).map(|_| rng.random::<u8>()).collect();
        hex::encode(random_bytes)
    }

    fn build_auth_params(&self) -> String {
        let salt = Self::generate_salt();
        let token = format!("{:x}", md5::compute(format!("{}{}", self.password, salt)));

        format!(
            "c={}&f=json&v={}&u={}&s={}&t={}",
            CLIENT_NAME,
            API_VERSION,
            urlencoding::encode(&self.username),
            salt,
            token
        )
    }

    fn build_url(&self, endpoint: &str, extra_params: &str) -> String {
        format!(
            "{}/rest/{}?{}&{}",
            self.server_url,
            endpoint,
            self.build_auth_params(),
            extra_params
        )
    }

    fn cover_art_url(&self, cover_art_id: &str) -> String {
        self.build_url(
            "getCoverArt",
            &format!("id={}&size={}", urlencoding::encode(cover_art_id), COVER_SIZE),
        )
    }

    fn to_catalog_track(&self, song: SubsonicSong) -> CatalogTrack {
        CatalogTrack {
            cover_art: song.cover_art.as_deref().map(|c| self.cover_art_url(c)),
            id: song.id,
            title: song.title,
            artist: song.artist.unwrap_or_default(),
            artist_id: song.artist_id,
            album: song.album.unwrap_or_default(),
            album_id: song.album_id,
            duration: song.duration.unwrap_or(0),
        }
    }
}

#[async_trait]
impl CatalogBackend for SubsonicCatalog {
    fn source(&self) -> CatalogSource {
        CatalogSource::Subsonic
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        let url = self.build_url(
            "search3",
            &format!(
                "query={}&artistCount=0&albumCount=0&songCount={}",
                urlencoding::encode(query),
                SEARCH_SONG_COUNT
            ),
        );

        log::debug!("Subsonic search3 for: '{}'", query);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Subsonic search3 failed: HTTP {}", status));
        }

        let resp: SubsonicResponse<SearchResult3Data> = response.json().await?;
        let inner = resp.subsonic_response;

        if inner.status != "ok" {
            return match inner.error {
                Some(err) => Err(anyhow!("Subsonic error {}: {}", err.code, err.message)),
                None => Err(anyhow!("Unknown Subsonic error")),
            };
        }

        let songs = inner
            .data
            .and_then(|d| d.search_result3)
            .unwrap_or_default()
            .song;

        log::debug!("Subsonic search3 returned {} songs", songs.len());

        Ok(songs.into_iter().map(|s| self.to_catalog_track(s)).collect())
    }
}
