use reqwest::Client;
use serde_json::json;
use sonami_import::catalog::tidal::{EndpointManager, TidalClient};
use sonami_import::catalog::{CatalogBackend, SubsonicCatalog, TidalCatalog};
use sonami_import::config::SubsonicConfig;
use sonami_import::CatalogSource;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUERY: &str = "Teardrop Massive Attack";

fn tidal_catalog(instances: &[&MockServer]) -> TidalCatalog {
    let urls: Vec<String> = instances.iter().map(|s| s.uri()).collect();
    let client = TidalClient::with_endpoints(Client::new(), EndpointManager::from_urls(&urls))
        .with_rate_limit_sleep(Duration::ZERO);
    TidalCatalog::new(client)
}

fn tidal_hit() -> serde_json::Value {
    json!({
        "version": "2.0",
        "data": {
            "items": [{
                "id": 1234,
                "title": "Teardrop",
                "duration": 330,
                "artist": { "id": 77, "name": "Massive Attack" },
                "album": { "id": 88, "title": "Mezzanine", "cover": "aa-bb" }
            }]
        }
    })
}

#[tokio::test]
async fn test_tidal_moves_past_failing_instance_and_sticks_to_working_one() {
    let failing = MockServer::start().await;
    let working = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&failing)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("s", QUERY))
        .respond_with(ResponseTemplate::new(200).set_body_json(tidal_hit()))
        .expect(2)
        .mount(&working)
        .await;

    let catalog = tidal_catalog(&[&failing, &working]);
    assert_eq!(catalog.source(), CatalogSource::Tidal);

    let tracks = catalog.search_tracks(QUERY).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "1234");
    assert_eq!(tracks[0].artist, "Massive Attack");
    assert_eq!(tracks[0].album_id.as_deref(), Some("88"));
    assert_eq!(
        tracks[0].cover_art.as_deref(),
        Some("https://resources.tidal.com/images/aa/bb/640x640.jpg")
    );

    // The working instance is now tried first.
    let again = catalog.search_tracks(QUERY).await.unwrap();
    assert_eq!(again.len(), 1);
}

#[tokio::test]
async fn test_tidal_rate_limited_instance_is_skipped() {
    let limited = MockServer::start().await;
    let working = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&limited)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [{ "item": { "id": 5, "title": "Angel" }, "type": "track" }] }
        })))
        .expect(1)
        .mount(&working)
        .await;

    let tracks = tidal_catalog(&[&limited, &working])
        .search_tracks("Angel")
        .await
        .unwrap();

    assert_eq!(tracks[0].title, "Angel");
    assert_eq!(tracks[0].artist, "");
    assert!(tracks[0].cover_art.is_none());
}

#[tokio::test]
async fn test_tidal_empty_answers_everywhere_is_no_results() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "2.0",
            "data": { "tracks": { "items": [] } }
        })))
        .expect(1)
        .mount(&first)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&second)
        .await;

    let tracks = tidal_catalog(&[&first, &second])
        .search_tracks(QUERY)
        .await
        .unwrap();
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn test_tidal_all_instances_failing_is_an_error() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    for server in [&first, &second] {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(server)
            .await;
    }

    assert!(tidal_catalog(&[&first, &second])
        .search_tracks(QUERY)
        .await
        .is_err());
}

fn subsonic_catalog(server: &MockServer) -> SubsonicCatalog {
    SubsonicCatalog::new(
        Client::new(),
        SubsonicConfig {
            server_url: server.uri(),
            username: "listener".to_string(),
            password: "secret".to_string(),
        },
    )
}

#[tokio::test]
async fn test_subsonic_search3() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/search3"))
        .and(query_param("query", QUERY))
        .and(query_param("u", "listener"))
        .and(query_param("c", "sonami"))
        .and(query_param("f", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subsonic-response": {
                "status": "ok",
                "version": "1.16.1",
                "searchResult3": {
                    "song": [{
                        "id": "so-1",
                        "title": "Teardrop",
                        "artist": "Massive Attack",
                        "artistId": "ar-1",
                        "album": "Mezzanine",
                        "albumId": "al-1",
                        "duration": 331,
                        "coverArt": "al-1"
                    }]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = subsonic_catalog(&server);
    assert_eq!(catalog.source(), CatalogSource::Subsonic);

    let tracks = catalog.search_tracks(QUERY).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "so-1");
    assert_eq!(tracks[0].album, "Mezzanine");
    assert_eq!(tracks[0].duration, 331);
    assert!(tracks[0]
        .cover_art
        .as_deref()
        .is_some_and(|url| url.starts_with(&format!("{}/rest/getCoverArt?", server.uri()))));
}

#[tokio::test]
async fn test_subsonic_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/search3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subsonic-response": { "status": "ok", "version": "1.16.1", "searchResult3": {} }
        })))
        .mount(&server)
        .await;

    let tracks = subsonic_catalog(&server).search_tracks(QUERY).await.unwrap();
    assert!(tracks.is_empty());
}

#[tokio::test]
async fn test_subsonic_failed_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/search3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subsonic-response": {
                "status": "failed",
                "version": "1.16.1",
                "error": { "code": 40, "message": "Wrong username or password" }
            }
        })))
        .mount(&server)
        .await;

    let err = subsonic_catalog(&server)
        .search_tracks(QUERY)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Wrong username or password"));
}
