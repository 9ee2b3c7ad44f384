pub mod client;
pub mod endpoint_manager;
pub mod error;
pub mod models;

pub use client::TidalClient;
pub use endpoint_manager::{Endpoint, EndpointManager};
pub use error::TidalError;
pub use models::{get_cover_url, Album, Artist, SearchResponse, Track};

use anyhow::Result;
use async_trait::async_trait;

use super::CatalogBackend;
use crate::models::{CatalogSource, CatalogTrack};

const COVER_SIZE: u32 = 640;

/// High-trust catalog: Tidal, reached through community hifi API instances.
pub struct TidalCatalog {
    client: TidalClient,
}

impl TidalCatalog {
    pub fn new(client: TidalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogBackend for TidalCatalog {
    fn source(&self) -> CatalogSource {
        CatalogSource::Tidal
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        let response = self.client.search_tracks(query).await?;

        Ok(response.items.into_iter().map(to_catalog_track).collect())
    }
}

fn to_catalog_track(t: Track) -> CatalogTrack {
    CatalogTrack {
        id: t.id.to_string(),
        artist: t.artist.as_ref().map(|a| a.name.clone()).unwrap_or_default(),
        artist_id: t.artist.as_ref().map(|a| a.id.to_string()),
        album: t.album.as_ref().map(|a| a.title.clone()).unwrap_or_default(),
        album_id: t.album.as_ref().map(|a| a.id.to_string()),
        duration: t.duration.unwrap_or(0) as u64,
        cover_art: t
            .cover
            .or_else(|| t.album.as_ref().and_then(|a| a.cover.clone()))
            .map(|c| get_cover_url(&c, COVER_SIZE)),
        title: t.title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_catalog_track_prefers_album_cover_when_track_has_none() {
        let track = Track {
            id: 42,
            title: "Harder, Better".to_string(),
            artist: Some(Artist { id: 7, name: "Daft Punk".to_string() }),
            album: Some(Album {
                id: 9,
                title: "Discovery".to_string(),
                cover: Some("aa-bb-cc".to_string()),
            }),
            duration: Some(224),
            cover: None,
        };

        let catalog = to_catalog_track(track);
        assert_eq!(catalog.id, "42");
        assert_eq!(catalog.artist_id.as_deref(), Some("7"));
        assert_eq!(catalog.album, "Discovery");
        assert_eq!(
            catalog.cover_art.as_deref(),
            Some("https://resources.tidal.com/images/aa/bb/cc/640x640.jpg")
        );
    }
}
