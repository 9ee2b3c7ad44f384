use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::models::{Playlist, PlaylistRow};
use crate::errors::StoreError;
use crate::models::{CatalogSource, MatchedTrack};

/// Persistence the importer writes finished playlists to.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn create_playlist(&self, name: &str) -> Result<Playlist, StoreError>;

    /// Overwrites the stored record, tracks included.
    async fn update_playlist(&self, playlist: &Playlist) -> Result<(), StoreError>;
}

const PLAYLIST_COLUMNS: &str = "id, name, description, cover_art, import_platform, \
     import_source_id, import_source_name, created_at, updated_at";

pub struct PlaylistManager {
    pool: Pool<Sqlite>,
}

impl PlaylistManager {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Playlist, StoreError> {
        let row = sqlx::query_as::<_, PlaylistRow>(&format!(
            "SELECT {} FROM playlists WHERE id = ?",
            PLAYLIST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let tracks = self.get_tracks(id).await?;
        Ok(row.into_playlist(tracks))
    }

    /// All playlists, newest first.
    pub async fn get_playlists(&self) -> Result<Vec<Playlist>, StoreError> {
        let rows = sqlx::query_as::<_, PlaylistRow>(&format!(
            "SELECT {} FROM playlists ORDER BY created_at DESC, rowid DESC",
            PLAYLIST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut playlists = Vec::with_capacity(rows.len());
        for row in rows {
            let tracks = self.get_tracks(&row.id).await?;
            playlists.push(row.into_playlist(tracks));
        }
        Ok(playlists)
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get_tracks(&self, playlist_id: &str) -> Result<Vec<MatchedTrack>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT track_id, source, title, artist, artist_id, album, album_id,
                   duration, cover_art, added_at, original_title, original_artist,
                   match_confidence
            FROM playlist_tracks
            WHERE playlist_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(track_from_row).collect()
    }
}

fn track_from_row(row: &SqliteRow) -> Result<MatchedTrack, StoreError> {
    let source: String = row.try_get("source")?;
    let source = source
        .parse::<CatalogSource>()
        .map_err(StoreError::Database)?;
    let duration: i64 = row.try_get("duration")?;
    let confidence: i64 = row.try_get("match_confidence")?;

    Ok(MatchedTrack {
        id: row.try_get("track_id")?,
        source,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        artist_id: row.try_get("artist_id")?,
        album: row.try_get("album")?,
        album_id: row.try_get("album_id")?,
        duration: duration.max(0) as u64,
        cover_art: row.try_get("cover_art")?,
        added_at: row.try_get("added_at")?,
        original_title: row.try_get("original_title")?,
        original_artist: row.try_get("original_artist")?,
        match_confidence: confidence.clamp(0, u8::MAX as i64) as u8,
    })
}

#[async_trait]
impl PlaylistStore for PlaylistManager {
    async fn create_playlist(&self, name: &str) -> Result<Playlist, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO playlists (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        log::debug!("Created playlist {} ('{}')", id, name);

        Ok(Playlist {
            id,
            name: name.to_string(),
            description: None,
            cover_art: None,
            tracks: Vec::new(),
            import_source: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_playlist(&self, playlist: &Playlist) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        let (platform, source_id, source_name) = match &playlist.import_source {
            Some(src) => (
                Some(src.platform.as_str()),
                Some(src.source_id.as_str()),
                Some(src.source_name.as_str()),
            ),
            None => (None, None, None),
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE playlists
            SET name = ?, description = ?, cover_art = ?, import_platform = ?,
                import_source_id = ?, import_source_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.cover_art)
        .bind(platform)
        .bind(source_id)
        .bind(source_name)
        .bind(now)
        .bind(&playlist.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(playlist.id.clone()));
        }

        sqlx::query("DELETE FROM playlist_tracks WHERE playlist_id = ?")
            .bind(&playlist.id)
            .execute(&mut *tx)
            .await?;

        for (position, track) in playlist.tracks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO playlist_tracks (
                    playlist_id, position, track_id, source, title, artist, artist_id,
                    album, album_id, duration, cover_art, added_at, original_title,
                    original_artist, match_confidence
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&playlist.id)
            .bind(position as i64)
            .bind(&track.id)
            .bind(track.source.to_string())
            .bind(&track.title)
            .bind(&track.artist)
            .bind(&track.artist_id)
            .bind(&track.album)
            .bind(&track.album_id)
            .bind(track.duration as i64)
            .bind(&track.cover_art)
            .bind(track.added_at)
            .bind(&track.original_title)
            .bind(&track.original_artist)
            .bind(track.match_confidence as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        log::debug!(
            "Saved playlist {} with {} tracks",
            playlist.id,
            playlist.tracks.len()
        );
        Ok(())
    }
}
