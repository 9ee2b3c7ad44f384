use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::endpoint_manager::{Endpoint, EndpointManager};
use super::error::TidalError;
use super::models::{SearchResponse, Track};
use crate::config::{ImporterConfig, TIDAL_RATE_LIMIT_SLEEP_MS};

pub struct TidalClient {
    endpoint_manager: EndpointManager,
    client: Client,
    rate_limit_sleep: Duration,
}

impl TidalClient {
    pub async fn new(client: Client, config: &ImporterConfig) -> Result<Self, TidalError> {
        let endpoint_manager =
            EndpointManager::load(&client, &config.tidal, config.tidal_cache_path()).await?;
        Ok(Self::with_endpoints(client, endpoint_manager))
    }

    pub fn with_endpoints(client: Client, endpoint_manager: EndpointManager) -> Self {
        Self {
            endpoint_manager,
            client,
            rate_limit_sleep: Duration::from_millis(TIDAL_RATE_LIMIT_SLEEP_MS),
        }
    }

    pub fn with_rate_limit_sleep(mut self, sleep: Duration) -> Self {
        self.rate_limit_sleep = sleep;
        self
    }

    async fn make_request(
        &self,
        path: &str,
        params: &[(&str, &str)],
        items_key: Option<&str>,
        operation: &str,
    ) -> Result<Value, TidalError> {
        let endpoints = self.endpoint_manager.ordered_endpoints();
        if endpoints.is_empty() {
            return Err(TidalError::NoEndpoints);
        }

        let mut empty_answers = 0;

        for (idx, endpoint) in endpoints.iter().enumerate() {
            log::debug!(
                "[{}/{}] {} via {}",
                idx + 1,
                endpoints.len(),
                operation,
                endpoint.name
            );

            match self.try_endpoint(endpoint, path, params, items_key).await {
                Ok(data) => {
                    self.endpoint_manager.record_success(endpoint);
                    return Ok(data);
                }
                // Instances with a broken upstream answer searches with nothing;
                // ask the next one without holding it against this one.
                Err(TidalError::Empty) => {
                    log::debug!("{} returned no results for {}", endpoint.name, operation);
                    empty_answers += 1;
                }
                Err(e) => {
                    self.endpoint_manager.record_failure(endpoint);
                    log::warn!(
                        "[{}/{}] {} failed: {}",
                        idx + 1,
                        endpoints.len(),
                        endpoint.name,
                        e
                    );

                    if matches!(e, TidalError::RateLimited(_)) && !self.rate_limit_sleep.is_zero() {
                        log::warn!("Rate limited, sleeping {:?}", self.rate_limit_sleep);
                        tokio::time::sleep(self.rate_limit_sleep).await;
                    }
                }
            }
        }

        if empty_answers > 0 {
            return Err(TidalError::Empty);
        }

        log::error!("All {} Tidal instances failed for {}", endpoints.len(), operation);
        Err(TidalError::AllEndpointsFailed(endpoints.len()))
    }

    async fn try_endpoint(
        &self,
        endpoint: &Endpoint,
        path: &str,
        params: &[(&str, &str)],
        items_key: Option<&str>,
    ) -> Result<Value, TidalError> {
        let url = reqwest::Url::parse_with_params(&format!("{}{}", endpoint.url, path), params)
            .map_err(|e| TidalError::Network(format!("URL parse error: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TidalError::RateLimited(endpoint.name.clone()));
        }

        if !status.is_success() {
            return Err(TidalError::Status {
                instance: endpoint.name.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text)
            .map_err(|e| TidalError::Parse(format!("JSON error at {}: {}", endpoint.name, e)))?;

        // Newer instances wrap the payload as { "version", "data" }.
        let data = match data {
            Value::Object(mut obj) if obj.contains_key("data") && obj.contains_key("version") => {
                obj.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };

        if let Some(key) = items_key {
            if item_array(&data, key).is_none_or(|items| items.is_empty()) {
                return Err(TidalError::Empty);
            }
        }

        Ok(data)
    }

    pub async fn search_tracks(&self, query: &str) -> Result<SearchResponse<Track>, TidalError> {
        let data = match self
            .make_request("/search/", &[("s", query)], Some("tracks"), "search_tracks")
            .await
        {
            Ok(data) => data,
            Err(TidalError::Empty) => return Ok(SearchResponse { items: Vec::new() }),
            Err(e) => return Err(e),
        };

        Ok(SearchResponse {
            items: extract_items(&data, "tracks"),
        })
    }
}

/// Items live either at the root (`items`) or under `<key>.items`, optionally
/// wrapped as `{ "item": {...}, "type": "track" }`.
pub fn extract_items<T>(data: &Value, key: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    let Some(items) = item_array(data, key) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|raw_item| {
            let item = raw_item.get("item").unwrap_or(raw_item);
            serde_json::from_value::<T>(item.clone()).ok()
        })
        .collect()
}

fn item_array<'a>(data: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    data.get("items")
        .or_else(|| data.get(key).and_then(|nested| nested.get("items")))
        .and_then(|v| v.as_array())
}
