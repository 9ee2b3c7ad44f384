use serde::{Deserialize, Serialize};

use crate::models::{MatchedTrack, Platform};

/// Where an imported playlist came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSource {
    pub platform: Platform,
    pub source_id: String,
    pub source_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_art: Option<String>,
    pub tracks: Vec<MatchedTrack>,
    pub import_source: Option<ImportSource>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Row of the `playlists` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PlaylistRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_art: Option<String>,
    pub import_platform: Option<String>,
    pub import_source_id: Option<String>,
    pub import_source_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PlaylistRow {
    pub fn into_playlist(self, tracks: Vec<MatchedTrack>) -> Playlist {
        let import_source = match (self.import_platform, self.import_source_id) {
            (Some(platform), Some(source_id)) => Some(ImportSource {
                platform: platform.parse().unwrap_or(Platform::Unknown),
                source_id,
                source_name: self.import_source_name.unwrap_or_default(),
            }),
            _ => None,
        };

        Playlist {
            id: self.id,
            name: self.name,
            description: self.description,
            cover_art: self.cover_art,
            tracks,
            import_source,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
