pub mod catalog;
pub mod config;
pub mod database;
pub mod errors;
pub mod importer;
pub mod matcher;
pub mod models;
pub mod platform;
pub mod playlist;
pub mod sources;

pub use config::ImporterConfig;
pub use errors::{ImportError, StoreError};
pub use importer::{PlaylistImporter, ProgressCallback, Sleeper, TokioSleeper};
pub use matcher::TrackMatcher;
pub use models::{
    CatalogSource, CatalogTrack, FetchedPlaylist, ImportProgress, ImportResult, ImportStage,
    ImportedTrack, MatchedTrack, Platform,
};
pub use platform::{
    detect_platform, parse_apple_music_url, parse_spotify_url, parse_youtube_music_url,
    AppleMusicPlaylistRef,
};
pub use playlist::{ImportSource, Playlist, PlaylistManager, PlaylistStore};
