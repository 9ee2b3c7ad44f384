use serde::Serialize;
use thiserror::Error;

use crate::models::Platform;

/// Ways an import can end without producing a playlist.
///
/// These never escape `import_playlist` as `Err`; their `Display` text is what
/// ends up in `ImportResult::error`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ImportError {
    #[error("Unsupported URL. Please use a Spotify, Apple Music, or YouTube Music playlist link.")]
    UnsupportedUrl,

    #[error("Invalid {} playlist URL", .0.display_name())]
    InvalidPlatformUrl(Platform),

    #[error("Could not fetch playlist. Make sure the playlist is public.")]
    FetchFailed,

    #[error("Could not match any tracks to available sources.")]
    NoTracksMatched,
}

/// Failures from the playlist store.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Playlist not found: {0}")]
    NotFound(String),

    #[error("File system error: {0}")]
    FileSystem(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("no matching row".to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::FileSystem(e.to_string())
    }
}
