use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;
use sonami_import::catalog::tidal::{EndpointManager, TidalClient};
use sonami_import::catalog::{CatalogBackend, SubsonicCatalog, TidalCatalog};
use sonami_import::config::{SpotifyConfig, SubsonicConfig, YoutubeMusicConfig};
use sonami_import::database::DatabaseManager;
use sonami_import::sources::{PlaylistSource, SpotifySource, YoutubeMusicSource};
use sonami_import::{
    CatalogSource, ImportProgress, ImportStage, Platform, PlaylistImporter, PlaylistManager,
    ProgressCallback, Sleeper, TrackMatcher,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

struct Services {
    platforms: MockServer,
    tidal: MockServer,
    subsonic: MockServer,
}

impl Services {
    async fn start() -> Self {
        Self {
            platforms: MockServer::start().await,
            tidal: MockServer::start().await,
            subsonic: MockServer::start().await,
        }
    }

    async fn importer(&self) -> (PlaylistImporter, Arc<PlaylistManager>) {
        let client = Client::new();

        let sources: Vec<Arc<dyn PlaylistSource>> = vec![
            Arc::new(SpotifySource::new(
                client.clone(),
                SpotifyConfig {
                    metadata_api_url: self.platforms.uri(),
                    scraper_api_url: self.platforms.uri(),
                    scraper_origin: self.platforms.uri(),
                    embed_url: self.platforms.uri(),
                },
            )),
            Arc::new(YoutubeMusicSource::new(
                client.clone(),
                YoutubeMusicConfig {
                    instances: vec![self.platforms.uri()],
                },
            )),
        ];

        let tidal = TidalClient::with_endpoints(
            client.clone(),
            EndpointManager::from_urls(&[self.tidal.uri()]),
        )
        .with_rate_limit_sleep(Duration::ZERO);
        let high_trust: Arc<dyn CatalogBackend> = Arc::new(TidalCatalog::new(tidal));
        let fallback: Arc<dyn CatalogBackend> = Arc::new(SubsonicCatalog::new(
            client,
            SubsonicConfig {
                server_url: self.subsonic.uri(),
                username: "listener".to_string(),
                password: "secret".to_string(),
            },
        ));

        let db = DatabaseManager::in_memory().await.unwrap();
        let store = Arc::new(PlaylistManager::new(db.pool));

        let importer = PlaylistImporter::new(
            sources,
            TrackMatcher::new(high_trust, fallback),
            store.clone(),
        )
        .with_sleeper(Arc::new(NoSleep));

        (importer, store)
    }
}

async fn mount_tidal(server: &MockServer, query: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("s", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_subsonic(server: &MockServer, query: &str, songs: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/search3"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subsonic-response": {
                "status": "ok",
                "version": "1.16.1",
                "searchResult3": { "song": songs }
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_spotify_playlist_import_end_to_end() {
    let services = Services::start().await;

    Mock::given(method("GET"))
        .and(path("/spotify/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "name": "Trip Hop",
                "tracks": [
                    { "name": "Teardrop", "artists": "Massive Attack", "duration_ms": 330000 },
                    { "name": "Glory Box", "artists": "Portishead", "duration_ms": 301000 },
                    { "name": "Obscure B-Side", "artists": "Nobody Knows", "duration_ms": 120000 }
                ]
            }
        })))
        .expect(1)
        .mount(&services.platforms)
        .await;

    mount_tidal(
        &services.tidal,
        "Teardrop Massive Attack",
        json!({ "items": [{
            "id": 1, "title": "Teardrop", "duration": 330,
            "artist": { "id": 10, "name": "Massive Attack" },
            "album": { "id": 100, "title": "Mezzanine", "cover": "aa-bb" }
        }]}),
    )
    .await;
    mount_tidal(&services.tidal, "Glory Box Portishead", json!({ "items": [] })).await;
    mount_tidal(&services.tidal, "Obscure B-Side Nobody Knows", json!({ "items": [] })).await;

    mount_subsonic(
        &services.subsonic,
        "Glory Box Portishead",
        json!([{ "id": "so-7", "title": "Glory Box", "artist": "Portishead", "album": "Dummy", "duration": 301 }]),
    )
    .await;
    mount_subsonic(&services.subsonic, "Obscure B-Side Nobody Knows", json!([])).await;

    let (importer, store) = services.importer().await;

    let events = Arc::new(Mutex::new(Vec::<ImportProgress>::new()));
    let sink = events.clone();
    let on_progress: &ProgressCallback = &move |p: ImportProgress| sink.lock().push(p);

    let result = importer
        .import_playlist(
            "https://open.spotify.com/playlist/37i9dQZF1DX0hvSv9Rf41p?si=abc",
            Some(on_progress),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.total_tracks, 3);
    assert_eq!(result.matched_tracks, 2);
    assert_eq!(result.unmatched_tracks.len(), 1);
    assert_eq!(result.unmatched_tracks[0].title, "Obscure B-Side");

    let playlist = result.playlist.expect("persisted playlist");
    assert_eq!(playlist.name, "Trip Hop");
    assert_eq!(
        playlist.cover_art.as_deref(),
        Some("https://resources.tidal.com/images/aa/bb/640x640.jpg")
    );

    let stored = store.get_playlist(&playlist.id).await.unwrap();
    assert_eq!(stored.tracks.len(), 2);
    assert_eq!(stored.tracks[0].source, CatalogSource::Tidal);
    assert_eq!(stored.tracks[0].match_confidence, 90);
    assert_eq!(stored.tracks[1].source, CatalogSource::Subsonic);
    assert_eq!(stored.tracks[1].match_confidence, 85);
    assert_eq!(stored.tracks[1].original_title, "Glory Box");
    let provenance = stored.import_source.expect("import provenance");
    assert_eq!(provenance.platform, Platform::Spotify);
    assert_eq!(provenance.source_id, "37i9dQZF1DX0hvSv9Rf41p");

    let events = events.lock();
    let matching: Vec<_> = events
        .iter()
        .filter(|e| e.stage == ImportStage::Matching)
        .map(|e| e.current)
        .collect();
    assert_eq!(matching, vec![1, 2, 3]);
    assert_eq!(events.last().map(|e| e.stage), Some(ImportStage::Done));
}

#[tokio::test]
async fn test_youtube_import_with_no_matches_saves_nothing() {
    let services = Services::start().await;

    Mock::given(method("GET"))
        .and(path("/playlists/PLxyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Covers",
            "relatedStreams": [
                { "title": "Unknown Cover", "uploaderName": "Bedroom Band", "duration": 200 }
            ]
        })))
        .expect(1)
        .mount(&services.platforms)
        .await;

    mount_tidal(&services.tidal, "Unknown Cover Bedroom Band", json!({ "items": [] })).await;
    mount_subsonic(&services.subsonic, "Unknown Cover Bedroom Band", json!([])).await;

    let (importer, store) = services.importer().await;
    let result = importer
        .import_playlist("https://music.youtube.com/playlist?list=PLxyz", None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Could not match any tracks to available sources.")
    );
    assert_eq!(result.total_tracks, 1);
    assert!(store.get_playlists().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_platform_reports_fetch_failure() {
    let services = Services::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&services.platforms)
        .await;

    let (importer, _store) = services.importer().await;
    let result = importer
        .import_playlist("https://open.spotify.com/playlist/37i9dQZF1DX0hvSv9Rf41p", None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Could not fetch playlist. Make sure the playlist is public.")
    );
}
