/// Relay discovery preview for first-run bootstrap
///
/// Asks a relay which other relays and which peers it knows. Both lists are
/// best-effort: a failing or malformed source simply contributes nothing.
use crate::{
    error::{ClientError, ClientResult},
    policy::{settle, Operation},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// What a relay reports about the network
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelayPreview {
    pub relays: Vec<String>,
    pub peers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RelayListResponse {
    relays: Option<Vec<RelayListItem>>,
    items: Option<Vec<RelayListItem>>,
}

#[derive(Debug, Deserialize)]
struct RelayListItem {
    relay_url: Option<String>,
    relay_base_url: Option<String>,
    base: Option<String>,
}

impl RelayListItem {
    /// First non-blank of `relay_base_url`, `relay_url`, `base`
    fn url(&self) -> Option<&str> {
        [&self.relay_base_url, &self.relay_url, &self.base]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct PeerListResponse {
    #[serde(default)]
    items: Vec<PeerItem>,
}

#[derive(Debug, Deserialize)]
struct PeerItem {
    #[serde(default)]
    username: Option<String>,
}

/// Relay discovery client
pub struct RelayDiscovery {
    http_client: Client,
}

impl RelayDiscovery {
    /// Create a new relay discovery client
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Fetch the relay and peer lists of `relay_base`
    pub async fn preview(&self, relay_base: &str) -> RelayPreview {
        let base = relay_base.trim().trim_end_matches('/');

        let (relays, peers) = tokio::join!(self.fetch_relays(base), self.fetch_peers(base));

        let preview = RelayPreview {
            relays: settle(Operation::RelayPreview, relays).ok().unwrap_or_default(),
            peers: settle(Operation::RelayPreview, peers).ok().unwrap_or_default(),
        };
        info!(
            "Relay {} knows {} relays and {} peers",
            base,
            preview.relays.len(),
            preview.peers.len()
        );
        preview
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> ClientResult<T> {
        debug!("Fetching relay list: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::transport(url, e))?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse {}: {}", url, e)))
    }

    async fn fetch_relays(&self, base: &str) -> ClientResult<Vec<String>> {
        let url = format!("{}/_fedi3/relay/relays", base);
        let body: RelayListResponse = self.get_json(&url).await?;
        let items = body.relays.or(body.items).unwrap_or_default();
        Ok(dedup_non_empty(items.iter().filter_map(RelayListItem::url)))
    }

    async fn fetch_peers(&self, base: &str) -> ClientResult<Vec<String>> {
        let url = format!("{}/_fedi3/relay/peers", base);
        let body: PeerListResponse = self.get_json(&url).await?;
        Ok(dedup_non_empty(
            body.items.iter().filter_map(|p| p.username.as_deref()),
        ))
    }
}

/// Trim, drop empties and duplicates, keep first-seen order
fn dedup_non_empty<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_non_empty() {
        let values = ["alice", "", " bob ", "alice", "  ", "bob"];
        assert_eq!(
            dedup_non_empty(values.into_iter()),
            vec!["alice".to_string(), "bob".to_string()]
        );
    }

    #[test]
    fn test_relay_list_accepts_items_alias() {
        let body: RelayListResponse = serde_json::from_value(serde_json::json!({
            "items": [{"relay_base_url": "https://r1.example"}, {"base": "https://r2.example"}]
        }))
        .unwrap();
        let items = body.relays.or(body.items).unwrap();
        let urls: Vec<&str> = items.iter().filter_map(RelayListItem::url).collect();
        assert_eq!(urls, vec!["https://r1.example", "https://r2.example"]);
    }

    #[test]
    fn test_blank_relay_field_falls_through() {
        let item: RelayListItem = serde_json::from_value(serde_json::json!({
            "relay_base_url": " ",
            "relay_url": "https://r1.example"
        }))
        .unwrap();
        assert_eq!(item.url(), Some("https://r1.example"));

        let blank: RelayListItem =
            serde_json::from_value(serde_json::json!({"relay_url": "", "base": "  "})).unwrap();
        assert_eq!(blank.url(), None);
    }

    #[tokio::test]
    async fn test_unreachable_relay_yields_empty_preview() {
        let discovery = RelayDiscovery::new(Duration::from_secs(2)).unwrap();
        let preview = discovery.preview("http://127.0.0.1:9").await;
        assert_eq!(preview, RelayPreview::default());
    }
}
