pub mod manager;
pub mod models;

pub use manager::{PlaylistManager, PlaylistStore};
pub use models::{ImportSource, Playlist};
