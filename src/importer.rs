use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogBackend, NullCatalog, SubsonicCatalog, TidalCatalog};
use crate::catalog::tidal::TidalClient;
use crate::config::{ImporterConfig, MATCH_THROTTLE_MS};
use crate::database::DatabaseManager;
use crate::errors::{ImportError, StoreError};
use crate::matcher::TrackMatcher;
use crate::models::{CatalogSource, ImportProgress, ImportResult, ImportStage, Platform};
use crate::platform::{
    detect_platform, parse_apple_music_url, parse_spotify_url, parse_youtube_music_url,
};
use crate::playlist::{ImportSource, PlaylistManager, PlaylistStore};
use crate::sources::{AppleMusicSource, PlaylistSource, SpotifySource, YoutubeMusicSource};

/// Pause between catalog lookups, swappable so tests don't wait.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub type ProgressCallback = dyn Fn(ImportProgress) + Send + Sync;

/// Drives an import: classify the URL, fetch the playlist, match every track,
/// then persist what matched.
pub struct PlaylistImporter {
    sources: Vec<Arc<dyn PlaylistSource>>,
    matcher: TrackMatcher,
    store: Arc<dyn PlaylistStore>,
    sleeper: Arc<dyn Sleeper>,
    throttle: Duration,
}

impl PlaylistImporter {
    pub fn new(
        sources: Vec<Arc<dyn PlaylistSource>>,
        matcher: TrackMatcher,
        store: Arc<dyn PlaylistStore>,
    ) -> Self {
        Self {
            sources,
            matcher,
            store,
            sleeper: Arc::new(TokioSleeper),
            throttle: Duration::from_millis(MATCH_THROTTLE_MS),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Wires the real sources, catalogs and SQLite store from configuration.
    pub async fn from_config(config: &ImporterConfig) -> anyhow::Result<Self> {
        let client = config.http_client()?;

        let sources: Vec<Arc<dyn PlaylistSource>> = vec![
            Arc::new(SpotifySource::new(client.clone(), config.spotify.clone())),
            Arc::new(AppleMusicSource::new(
                client.clone(),
                config.apple_music.clone(),
            )),
            Arc::new(YoutubeMusicSource::new(
                client.clone(),
                config.youtube_music.clone(),
            )),
        ];

        let tidal = TidalClient::new(client.clone(), config).await?;
        let high_trust: Arc<dyn CatalogBackend> = Arc::new(TidalCatalog::new(tidal));
        let fallback: Arc<dyn CatalogBackend> = match &config.subsonic {
            Some(subsonic) => Arc::new(SubsonicCatalog::new(client, subsonic.clone())),
            None => {
                log::info!("No Subsonic server configured, matching against Tidal only");
                Arc::new(NullCatalog::new(CatalogSource::Subsonic))
            }
        };

        let db = DatabaseManager::new(&config.database_path()).await?;
        let store = Arc::new(PlaylistManager::new(db.pool));

        Ok(Self::new(sources, TrackMatcher::new(high_trust, fallback), store)
            .with_throttle(config.throttle()))
    }

    fn source_for(&self, platform: Platform) -> Option<&Arc<dyn PlaylistSource>> {
        self.sources.iter().find(|s| s.platform() == platform)
    }

    /// Imports the playlist behind `url`.
    ///
    /// Fetch and match problems end up in the returned `ImportResult`; only a
    /// failing store is reported as `Err`.
    pub async fn import_playlist(
        &self,
        url: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<ImportResult, StoreError> {
        let emit = |progress: ImportProgress| {
            if let Some(callback) = on_progress {
                callback(progress);
            }
        };

        let platform = detect_platform(url);
        if platform == Platform::Unknown {
            log::warn!("Unsupported playlist URL: {}", url);
            return Ok(ImportResult::failed(ImportError::UnsupportedUrl, 0, Vec::new()));
        }

        emit(ImportProgress::new(
            ImportStage::Fetching,
            0,
            0,
            format!("Fetching playlist from {}...", platform.display_name()),
        ));

        let Some((playlist_id, storefront)) = parse_playlist_ref(platform, url) else {
            log::warn!("Could not parse {} playlist URL: {}", platform.display_name(), url);
            return Ok(ImportResult::failed(
                ImportError::InvalidPlatformUrl(platform),
                0,
                Vec::new(),
            ));
        };

        let fetched = match self.source_for(platform) {
            Some(source) => source.fetch(&playlist_id, storefront.as_deref()).await,
            None => {
                log::error!("No source registered for {}", platform);
                None
            }
        };

        let fetched = match fetched {
            Some(playlist) if !playlist.tracks.is_empty() => playlist,
            _ => return Ok(ImportResult::failed(ImportError::FetchFailed, 0, Vec::new())),
        };

        let total = fetched.tracks.len();
        log::info!(
            "Fetched '{}' from {} with {} tracks",
            fetched.name,
            platform.display_name(),
            total
        );

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();

        for (idx, track) in fetched.tracks.into_iter().enumerate() {
            emit(ImportProgress::new(
                ImportStage::Matching,
                idx + 1,
                total,
                format!("Matching: {}", track.title),
            ));

            match self.matcher.match_track(&track).await {
                Some(found) => matched.push(found),
                None => unmatched.push(track),
            }

            if idx + 1 < total {
                self.sleeper.sleep(self.throttle).await;
            }
        }

        let matched_count = matched.len();
        log::info!("Matched {}/{} tracks", matched_count, total);

        if matched.is_empty() {
            return Ok(ImportResult::failed(
                ImportError::NoTracksMatched,
                total,
                unmatched,
            ));
        }

        emit(ImportProgress::new(
            ImportStage::Saving,
            matched_count,
            total,
            "Saving playlist...",
        ));

        let mut playlist = self.store.create_playlist(&fetched.name).await?;
        playlist.cover_art = matched.first().and_then(|t| t.cover_art.clone());
        playlist.tracks = matched;
        playlist.import_source = Some(ImportSource {
            platform,
            source_id: playlist_id,
            source_name: fetched.name,
        });
        self.store.update_playlist(&playlist).await?;

        log::info!("Saved imported playlist '{}' ({})", playlist.name, playlist.id);

        emit(ImportProgress::new(
            ImportStage::Done,
            matched_count,
            total,
            format!("Imported {} of {} tracks", matched_count, total),
        ));

        Ok(ImportResult::completed(
            playlist,
            total,
            matched_count,
            unmatched,
        ))
    }
}

/// Platform-native playlist id, plus the storefront for Apple Music.
fn parse_playlist_ref(platform: Platform, url: &str) -> Option<(String, Option<String>)> {
    match platform {
        Platform::Spotify => parse_spotify_url(url).map(|id| (id, None)),
        Platform::AppleMusic => {
            parse_apple_music_url(url).map(|r| (r.id, Some(r.storefront)))
        }
        Platform::YoutubeMusic => parse_youtube_music_url(url).map(|id| (id, None)),
        Platform::Unknown => None,
    }
}
