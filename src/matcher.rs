use std::sync::Arc;

use crate::catalog::CatalogBackend;
use crate::models::{ImportedTrack, MatchedTrack};

pub const HIGH_TRUST_CONFIDENCE: u8 = 90;
pub const FALLBACK_CONFIDENCE: u8 = 85;

/// Resolves imported tracks against the catalog backends, high-trust first.
pub struct TrackMatcher {
    high_trust: Arc<dyn CatalogBackend>,
    fallback: Arc<dyn CatalogBackend>,
}

impl TrackMatcher {
    pub fn new(high_trust: Arc<dyn CatalogBackend>, fallback: Arc<dyn CatalogBackend>) -> Self {
        Self {
            high_trust,
            fallback,
        }
    }

    pub async fn match_track(&self, track: &ImportedTrack) -> Option<MatchedTrack> {
        let query = track.search_query();

        for (backend, confidence) in [
            (&self.high_trust, HIGH_TRUST_CONFIDENCE),
            (&self.fallback, FALLBACK_CONFIDENCE),
        ] {
            let results = match backend.search_tracks(&query).await {
                Ok(results) => results,
                Err(e) => {
                    log::warn!("{} search failed for '{}': {}", backend.source(), query, e);
                    Vec::new()
                }
            };

            if let Some(best) = results.into_iter().next() {
                log::debug!(
                    "Matched '{}' via {} as '{}' by {}",
                    query,
                    backend.source(),
                    best.title,
                    best.artist
                );
                return Some(MatchedTrack::from_catalog(
                    best,
                    backend.source(),
                    track,
                    confidence,
                ));
            }
        }

        log::debug!("No match for '{}'", query);
        None
    }
}
