use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR_NAME: &str = "sonami";
pub const CONFIG_FILE_NAME: &str = "importer.json";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const MATCH_THROTTLE_MS: u64 = 200;

pub const TIDAL_INSTANCES_URL: &str =
    "https://raw.githubusercontent.com/EduardPrigoana/hifi-instances/refs/heads/main/instances.json";
pub const TIDAL_CACHE_TTL_SECONDS: u64 = 86400; // 24 hours
pub const TIDAL_RATE_LIMIT_SLEEP_MS: u64 = 2000;
pub const MAX_STICKY_FAILURES: u32 = 3;

pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE_NAME)
}

pub fn get_tidal_cache_file_path() -> PathBuf {
    get_config_dir().join("tidal_cache.json")
}

pub fn get_default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("library.db")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Metadata service answering `/spotify/get?url=...` with a ready track list
    pub metadata_api_url: String,
    /// Scraper service exposing `/metadata/playlist/{id}` and `/trackList/playlist/{id}`
    pub scraper_api_url: String,
    /// Origin the scraper service expects on incoming requests
    pub scraper_origin: String,
    /// Host serving the public `/embed/playlist/{id}` preview page
    pub embed_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            metadata_api_url: "https://api.fabdl.com".to_string(),
            scraper_api_url: "https://api.spotifydown.com".to_string(),
            scraper_origin: "https://spotifydown.com".to_string(),
            embed_url: "https://open.spotify.com".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleMusicConfig {
    pub api_url: String,
}

impl Default for AppleMusicConfig {
    fn default() -> Self {
        Self {
            api_url: "https://amp-api.music.apple.com".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeMusicConfig {
    /// Piped API instances, tried in order
    pub instances: Vec<String>,
}

impl Default for YoutubeMusicConfig {
    fn default() -> Self {
        Self {
            instances: vec![
                "https://pipedapi.kavin.rocks".to_string(),
                "https://pipedapi.adminforge.de".to_string(),
                "https://api.piped.yt".to_string(),
                "https://pipedapi.r4fo.com".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TidalConfig {
    /// Remote JSON index listing hifi API instances
    pub instances_url: String,
    /// Path of the on-disk instance cache; defaults to the config dir
    pub cache_path: Option<PathBuf>,
    /// Used when neither the index nor the cache can be read
    pub fallback_instances: Vec<String>,
}

impl Default for TidalConfig {
    fn default() -> Self {
        Self {
            instances_url: TIDAL_INSTANCES_URL.to_string(),
            cache_path: None,
            fallback_instances: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubsonicConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Pause between catalog lookups of consecutive tracks
    pub throttle_ms: u64,
    pub spotify: SpotifyConfig,
    pub apple_music: AppleMusicConfig,
    pub youtube_music: YoutubeMusicConfig,
    pub tidal: TidalConfig,
    /// Fallback catalog; without it only Tidal is searched
    pub subsonic: Option<SubsonicConfig>,
    pub database_path: Option<PathBuf>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECONDS,
            throttle_ms: MATCH_THROTTLE_MS,
            spotify: SpotifyConfig::default(),
            apple_music: AppleMusicConfig::default(),
            youtube_music: YoutubeMusicConfig::default(),
            tidal: TidalConfig::default(),
            subsonic: None,
            database_path: None,
        }
    }
}

impl ImporterConfig {
    /// Loads the config from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&get_config_file_path())
    }

    /// Missing or unreadable files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No importer config at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded importer config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Invalid importer config at {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read importer config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(get_default_database_path)
    }

    pub fn tidal_cache_path(&self) -> PathBuf {
        self.tidal
            .cache_path
            .clone()
            .unwrap_or_else(get_tidal_cache_file_path)
    }

    /// Shared HTTP client for every platform source and catalog backend.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout())
            .user_agent(self.user_agent.clone())
            .build()
    }
}
