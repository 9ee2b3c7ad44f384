use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::TidalError;
use crate::config::{TidalConfig, MAX_STICKY_FAILURES, TIDAL_CACHE_TTL_SECONDS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    pub priority: u32,
}

impl Endpoint {
    pub fn from_url(url: &str, priority: u32) -> Self {
        let url = url.trim_end_matches('/').to_string();
        let name = url
            .replace("https://", "")
            .replace("http://", "")
            .split('.')
            .next()
            .unwrap_or("unknown")
            .to_string();

        Self { name, url, priority }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StickyEndpoint {
    endpoint: Endpoint,
    last_success: i64,
    failure_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct EndpointCache {
    timestamp: i64,
    endpoints: Vec<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sticky_endpoint: Option<StickyEndpoint>,
}

/// Keeps the list of hifi API instances and remembers the last one that worked.
///
/// The list comes from a remote index, cached on disk for a day. The sticky
/// instance is tried first until it fails `MAX_STICKY_FAILURES` times in a row.
pub struct EndpointManager {
    endpoints: Vec<Endpoint>,
    sticky: RwLock<Option<StickyEndpoint>>,
    cache_path: Option<PathBuf>,
}

impl EndpointManager {
    pub async fn load(
        client: &Client,
        config: &TidalConfig,
        cache_path: PathBuf,
    ) -> Result<Self, TidalError> {
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match Self::load_endpoints_with_cache(client, &config.instances_url, &cache_path).await {
            Ok((endpoints, sticky)) => Ok(Self {
                endpoints,
                sticky: RwLock::new(sticky),
                cache_path: Some(cache_path),
            }),
            Err(e) if !config.fallback_instances.is_empty() => {
                log::warn!(
                    "Tidal instance list unavailable ({}), using {} configured fallbacks",
                    e,
                    config.fallback_instances.len()
                );
                Ok(Self::from_urls(&config.fallback_instances))
            }
            Err(e) => {
                log::warn!("Tidal instance list unavailable ({}), Tidal searches will fail", e);
                Ok(Self::from_urls(&[]))
            }
        }
    }

    /// Fixed instance list, in priority order, without any disk cache.
    pub fn from_urls(urls: &[String]) -> Self {
        let endpoints = urls
            .iter()
            .enumerate()
            .map(|(idx, url)| Endpoint::from_url(url, idx as u32 + 1))
            .collect();

        Self {
            endpoints,
            sticky: RwLock::new(None),
            cache_path: None,
        }
    }

    async fn load_endpoints_with_cache(
        client: &Client,
        instances_url: &str,
        cache_path: &Path,
    ) -> Result<(Vec<Endpoint>, Option<StickyEndpoint>), TidalError> {
        if let Ok(cache_data) = Self::load_from_cache(cache_path) {
            let age = now().saturating_sub(cache_data.timestamp);

            if age < TIDAL_CACHE_TTL_SECONDS as i64 {
                log::info!(
                    "Loaded {} Tidal instances from cache (age: {}s)",
                    cache_data.endpoints.len(),
                    age
                );
                return Ok((cache_data.endpoints, cache_data.sticky_endpoint));
            }
            log::info!("Tidal instance cache expired (age: {}s), refreshing", age);
        }

        match Self::fetch_instance_list(client, instances_url).await {
            Ok(endpoints) => {
                log::info!("Fetched {} Tidal instances", endpoints.len());
                if let Err(e) = Self::save_to_cache(cache_path, &endpoints, None) {
                    log::warn!("Failed to write Tidal instance cache: {}", e);
                }
                Ok((endpoints, None))
            }
            Err(e) => {
                log::warn!("Failed to fetch Tidal instances: {}, trying stale cache", e);
                Self::load_from_cache(cache_path)
                    .map(|cache_data| (cache_data.endpoints, cache_data.sticky_endpoint))
                    .map_err(|_| TidalError::NoEndpoints)
            }
        }
    }

    async fn fetch_instance_list(client: &Client, url: &str) -> Result<Vec<Endpoint>, TidalError> {
        let response = client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(TidalError::Status {
                instance: url.to_string(),
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = serde_json::from_str(&response.text().await?)?;
        parse_instances_json(&json)
    }

    fn load_from_cache(path: &Path) -> Result<EndpointCache, TidalError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_to_cache(
        path: &Path,
        endpoints: &[Endpoint],
        sticky: Option<&StickyEndpoint>,
    ) -> Result<(), TidalError> {
        let cache = EndpointCache {
            timestamp: now(),
            endpoints: endpoints.to_vec(),
            sticky_endpoint: sticky.cloned(),
        };

        fs::write(path, serde_json::to_string_pretty(&cache)?)?;
        Ok(())
    }

    /// Instances in the order they should be tried: sticky first, then by priority.
    pub fn ordered_endpoints(&self) -> Vec<Endpoint> {
        let mut sorted = self.endpoints.clone();
        sorted.sort_by_key(|e| (e.priority, e.name.clone()));

        let sticky = self
            .sticky
            .read()
            .as_ref()
            .filter(|s| s.failure_count < MAX_STICKY_FAILURES)
            .map(|s| s.endpoint.clone());

        if let Some(sticky) = sticky {
            sorted.retain(|e| e.url != sticky.url);
            sorted.insert(0, sticky);
        }

        sorted
    }

    pub fn record_success(&self, endpoint: &Endpoint) {
        let new_sticky = StickyEndpoint {
            endpoint: endpoint.clone(),
            last_success: now(),
            failure_count: 0,
        };

        let changed = {
            let mut sticky = self.sticky.write();
            let changed = sticky.as_ref().map(|s| &s.endpoint.url) != Some(&endpoint.url);
            *sticky = Some(new_sticky.clone());
            changed
        };

        if changed {
            log::info!("Sticky Tidal instance set to: {}", endpoint.name);
            if let Some(path) = &self.cache_path {
                if let Err(e) = Self::save_to_cache(path, &self.endpoints, Some(&new_sticky)) {
                    log::warn!("Failed to persist sticky Tidal instance: {}", e);
                }
            }
        }
    }

    pub fn record_failure(&self, endpoint: &Endpoint) {
        let mut sticky_guard = self.sticky.write();
        let Some(sticky) = sticky_guard.as_mut() else {
            return;
        };

        if sticky.endpoint.url != endpoint.url {
            return;
        }

        sticky.failure_count += 1;
        log::warn!(
            "Sticky Tidal instance {} failed (count: {})",
            endpoint.name,
            sticky.failure_count
        );

        if sticky.failure_count >= MAX_STICKY_FAILURES {
            log::warn!("Dropping sticky instance after {} failures", sticky.failure_count);
            *sticky_guard = None;
        }
    }
}

/// Parses the `{ "api": { "<provider>": { "urls": [...] } } }` instance index.
pub fn parse_instances_json(data: &serde_json::Value) -> Result<Vec<Endpoint>, TidalError> {
    let api_section = data
        .get("api")
        .and_then(|a| a.as_object())
        .ok_or_else(|| TidalError::Parse("Missing 'api' section".to_string()))?;

    let mut endpoints = Vec::new();

    for (priority, provider_data) in (1u32..).zip(api_section.values()) {
        let urls = provider_data
            .get("urls")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|u| u.as_str());

        endpoints.extend(urls.map(|url| Endpoint::from_url(url, priority)));
    }

    if endpoints.is_empty() {
        return Err(TidalError::Parse("No instances found in index".to_string()));
    }

    Ok(endpoints)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
