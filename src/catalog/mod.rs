//! Catalog backends used to resolve imported tracks into playable ones.

pub mod subsonic;
pub mod tidal;

pub use subsonic::SubsonicCatalog;
pub use tidal::TidalCatalog;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogSource, CatalogTrack};

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Tag recorded on every track matched through this backend.
    fn source(&self) -> CatalogSource;

    /// Track search, best match first. An empty list means no results.
    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>>;
}

/// Stand-in for a backend that is not configured. Never finds anything.
pub struct NullCatalog {
    source: CatalogSource,
}

impl NullCatalog {
    pub fn new(source: CatalogSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CatalogBackend for NullCatalog {
    fn source(&self) -> CatalogSource {
        self.source
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        log::debug!("{} catalog not configured, skipping '{}'", self.source, query);
        Ok(Vec::new())
    }
}
