//! Share-URL classification and playlist identifier extraction.
//!
//! Everything here is pure: no I/O, no errors, same input gives same output.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::Platform;

const SPOTIFY_DOMAINS: &[&str] = &["open.spotify.com", "spotify.com", "spotify.link"];
const APPLE_MUSIC_DOMAINS: &[&str] = &["music.apple.com", "itunes.apple.com"];
const YOUTUBE_MUSIC_DOMAINS: &[&str] = &["music.youtube.com", "youtube.com", "youtu.be"];

static SPOTIFY_PLAYLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"playlist[/:]([A-Za-z0-9]+)").expect("valid regex"));

static APPLE_MUSIC_PLAYLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:music|itunes)\.apple\.com/([a-z]{2})/playlist/[^/?#]*/(pl\.[a-z0-9._-]+)",
    )
    .expect("valid regex")
});

static YOUTUBE_PLAYLIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").expect("valid regex"));

/// Storefront and playlist id pulled out of an Apple Music link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppleMusicPlaylistRef {
    pub storefront: String,
    pub id: String,
}

pub fn detect_platform(url: &str) -> Platform {
    let lower = url.to_lowercase();

    if SPOTIFY_DOMAINS.iter().any(|d| lower.contains(d)) {
        Platform::Spotify
    } else if APPLE_MUSIC_DOMAINS.iter().any(|d| lower.contains(d)) {
        Platform::AppleMusic
    } else if YOUTUBE_MUSIC_DOMAINS.iter().any(|d| lower.contains(d)) {
        Platform::YoutubeMusic
    } else {
        Platform::Unknown
    }
}

pub fn parse_spotify_url(url: &str) -> Option<String> {
    SPOTIFY_PLAYLIST
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn parse_apple_music_url(url: &str) -> Option<AppleMusicPlaylistRef> {
    let caps = APPLE_MUSIC_PLAYLIST.captures(url)?;
    Some(AppleMusicPlaylistRef {
        storefront: caps.get(1)?.as_str().to_lowercase(),
        id: caps.get(2)?.as_str().to_string(),
    })
}

pub fn parse_youtube_music_url(url: &str) -> Option<String> {
    YOUTUBE_PLAYLIST
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
