use serde::Deserialize;

const RESOURCES_URL: &str = "https://resources.tidal.com/images";

/// Track entry of a hifi instance search answer. Only the fields the
/// matcher needs are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: Option<Artist>,
    pub album: Option<Album>,
    /// Seconds
    pub duration: Option<u32>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub cover: Option<String>,
}

#[derive(Debug)]
pub struct SearchResponse<T> {
    pub items: Vec<T>,
}

/// Cover ids come dash-separated (`ab12-cd34-...`); the image path uses slashes.
pub fn get_cover_url(cover_id: &str, size: u32) -> String {
    format!(
        "{}/{}/{}x{}.jpg",
        RESOURCES_URL,
        cover_id.replace('-', "/"),
        size,
        size
    )
}
