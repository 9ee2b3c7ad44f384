use reqwest::Client;
use serde_json::json;
use sonami_import::config::{AppleMusicConfig, YoutubeMusicConfig};
use sonami_import::sources::{AppleMusicSource, PlaylistSource, YoutubeMusicSource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_apple_music_catalog_playlist() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/catalog/gb/playlists/pl.u-abc123"))
        .and(query_param("include", "tracks"))
        .and(header("Origin", "https://music.apple.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "attributes": { "name": "Chill Mix" },
                "relationships": { "tracks": { "data": [
                    { "attributes": { "name": "Avril 14th", "artistName": "Aphex Twin", "albumName": "Drukqs", "durationInMillis": 125000 } },
                    { "attributes": { "name": "Untitled" } }
                ]}}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = AppleMusicSource::new(
        Client::new(),
        AppleMusicConfig {
            api_url: server.uri(),
        },
    );

    let playlist = source.fetch("pl.u-abc123", Some("gb")).await.unwrap();

    assert_eq!(playlist.name, "Chill Mix");
    assert_eq!(playlist.tracks.len(), 2);
    assert_eq!(playlist.tracks[0].artist, "Aphex Twin");
    assert_eq!(playlist.tracks[0].album.as_deref(), Some("Drukqs"));
    assert_eq!(playlist.tracks[0].duration, Some(125));
    assert_eq!(playlist.tracks[1].artist, "");
}

#[tokio::test]
async fn test_apple_music_failure_gives_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let source = AppleMusicSource::new(
        Client::new(),
        AppleMusicConfig {
            api_url: server.uri(),
        },
    );

    assert!(source.fetch("pl.missing", None).await.is_none());
}

#[tokio::test]
async fn test_youtube_music_tries_instances_in_order() {
    let broken = MockServer::start().await;
    let empty = MockServer::start().await;
    let working = MockServer::start().await;
    let unused = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&broken)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlists/PLabc_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Nothing",
            "relatedStreams": []
        })))
        .expect(1)
        .mount(&empty)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlists/PLabc_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Focus",
            "relatedStreams": [
                { "title": "Weightless", "uploaderName": "Marconi Union - Topic", "duration": 480 },
                { "title": "Live Session", "uploaderName": "Some Channel", "duration": -1 }
            ]
        })))
        .expect(1)
        .mount(&working)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&unused)
        .await;

    let source = YoutubeMusicSource::new(
        Client::new(),
        YoutubeMusicConfig {
            instances: vec![broken.uri(), empty.uri(), working.uri(), unused.uri()],
        },
    );

    let playlist = source.fetch("PLabc_123", None).await.unwrap();

    assert_eq!(playlist.name, "Focus");
    assert_eq!(playlist.tracks[0].artist, "Marconi Union");
    assert_eq!(playlist.tracks[0].duration, Some(480));
    assert_eq!(playlist.tracks[1].artist, "Some Channel");
    assert_eq!(playlist.tracks[1].duration, None);
}

#[tokio::test]
async fn test_youtube_music_instance_error_payload_is_skipped() {
    let erroring = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Playlist not found"
        })))
        .expect(1)
        .mount(&erroring)
        .await;

    let source = YoutubeMusicSource::new(
        Client::new(),
        YoutubeMusicConfig {
            instances: vec![erroring.uri()],
        },
    );

    assert!(source.fetch("PLgone", None).await.is_none());
}
