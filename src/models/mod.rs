use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ImportError;
use crate::playlist::Playlist;

/// Music platform a shared playlist URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Spotify,
    AppleMusic,
    YoutubeMusic,
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple_music",
            Platform::YoutubeMusic => "youtube_music",
            Platform::Unknown => "unknown",
        }
    }

    /// Name shown to the user in progress and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::AppleMusic => "Apple Music",
            Platform::YoutubeMusic => "YouTube Music",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "apple_music" => Ok(Platform::AppleMusic),
            "youtube_music" => Ok(Platform::YoutubeMusic),
            "unknown" => Ok(Platform::Unknown),
            _ => Err(format!(
                "Invalid platform: '{}'. Valid: spotify, apple_music, youtube_music",
                s
            )),
        }
    }
}

/// Catalog backend a matched track is playable from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Tidal,
    Subsonic,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Tidal => write!(f, "tidal"),
            CatalogSource::Subsonic => write!(f, "subsonic"),
        }
    }
}

impl FromStr for CatalogSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tidal" => Ok(CatalogSource::Tidal),
            "subsonic" => Ok(CatalogSource::Subsonic),
            _ => Err(format!("Invalid catalog source: '{}'", s)),
        }
    }
}

/// A track as described by the platform it was imported from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedTrack {
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Duration in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl ImportedTrack {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration: None,
        }
    }

    /// Query sent to the catalog backends.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}

/// Normalized playlist payload returned by every platform source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPlaylist {
    pub name: String,
    pub tracks: Vec<ImportedTrack>,
}

/// A search hit from one of the catalog backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub album: String,
    pub album_id: Option<String>,
    pub duration: u64,
    pub cover_art: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedTrack {
    pub id: String,
    pub source: CatalogSource,
    pub title: String,
    pub artist: String,
    pub artist_id: Option<String>,
    pub album: String,
    pub album_id: Option<String>,
    pub duration: u64,
    pub cover_art: Option<String>,
    /// Unix timestamp (seconds) of when the match was made
    pub added_at: i64,
    pub original_title: String,
    pub original_artist: String,
    pub match_confidence: u8,
}

impl MatchedTrack {
    pub fn from_catalog(
        track: CatalogTrack,
        source: CatalogSource,
        original: &ImportedTrack,
        match_confidence: u8,
    ) -> Self {
        Self {
            id: track.id,
            source,
            title: track.title,
            artist: track.artist,
            artist_id: track.artist_id,
            album: track.album,
            album_id: track.album_id,
            duration: track.duration,
            cover_art: track.cover_art,
            added_at: chrono::Utc::now().timestamp(),
            original_title: original.title.clone(),
            original_artist: original.artist.clone(),
            match_confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStage {
    Fetching,
    Matching,
    Saving,
    Done,
    // Never emitted by the importer; failures come back in ImportResult.
    Error,
}

/// Progress update handed to the caller's callback while an import runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub stage: ImportStage,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl ImportProgress {
    pub fn new(stage: ImportStage, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            stage,
            current,
            total,
            message: message.into(),
        }
    }
}

/// Final summary of an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<Playlist>,
    pub total_tracks: usize,
    pub matched_tracks: usize,
    pub unmatched_tracks: Vec<ImportedTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    pub fn failed(error: ImportError, total_tracks: usize, unmatched_tracks: Vec<ImportedTrack>) -> Self {
        Self {
            success: false,
            playlist: None,
            total_tracks,
            matched_tracks: 0,
            unmatched_tracks,
            error: Some(error.to_string()),
        }
    }

    pub fn completed(
        playlist: Playlist,
        total_tracks: usize,
        matched_tracks: usize,
        unmatched_tracks: Vec<ImportedTrack>,
    ) -> Self {
        Self {
            success: true,
            playlist: Some(playlist),
            total_tracks,
            matched_tracks,
            unmatched_tracks,
            error: None,
        }
    }
}
