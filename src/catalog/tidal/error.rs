use thiserror::Error;

#[derive(Debug, Error)]
pub enum TidalError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by {0}")]
    RateLimited(String),

    #[error("HTTP {status} from {instance}")]
    Status { instance: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty search results")]
    Empty,

    #[error("All {0} Tidal instances failed")]
    AllEndpointsFailed(usize),

    #[error("No Tidal instances available")]
    NoEndpoints,

    #[error("Instance cache error: {0}")]
    Cache(String),
}

impl From<reqwest::Error> for TidalError {
    fn from(err: reqwest::Error) -> Self {
        TidalError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TidalError {
    fn from(err: serde_json::Error) -> Self {
        TidalError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for TidalError {
    fn from(err: std::io::Error) -> Self {
        TidalError::Cache(err.to_string())
    }
}
