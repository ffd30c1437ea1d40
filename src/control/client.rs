/// HTTP client for the local core's control API
use crate::{
    control::{ControlApi, FollowStatus, MigrationStatus, SetAliasesResponse},
    error::{ClientError, ClientResult},
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const INTERNAL_TOKEN_HEADER: &str = "X-Fedi3-Internal";

/// Core client configuration
#[derive(Debug, Clone)]
pub struct CoreClientConfig {
    /// Base URL of the core, e.g. `http://127.0.0.1:8788`
    pub base_url: String,
    /// Shared secret for internal endpoints (empty when the core runs open)
    pub internal_token: String,
    pub timeout: Duration,
}

impl Default for CoreClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8788".to_string(),
            internal_token: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Control API client over HTTP
#[derive(Clone)]
pub struct CoreClient {
    base_url: String,
    internal_token: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ActorRequest<'a> {
    actor: &'a str,
}

#[derive(Debug, Serialize)]
struct AliasesRequest<'a> {
    aliases: &'a [String],
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
}

impl CoreClient {
    /// Create a new core client
    pub fn new(config: CoreClientConfig) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            internal_token: config.internal_token.trim().to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.http_client.request(method, url);
        if self.internal_token.is_empty() {
            req
        } else {
            req.header(INTERNAL_TOKEN_HEADER, &self.internal_token)
        }
    }

    async fn send(&self, req: RequestBuilder, url: &str) -> ClientResult<Response> {
        debug!("Core request: {}", url);

        let response = req.send().await.map_err(|e| ClientError::transport(url, e))?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, url: &str) -> ClientResult<T> {
        self.send(req, url)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Invalid response from {}: {}", url, e)))
    }
}

#[async_trait]
impl ControlApi for CoreClient {
    async fn fetch_following_status(&self, actor_id: &str) -> ClientResult<FollowStatus> {
        let url = format!(
            "{}?actor={}",
            self.url("/_fedi3/social/status"),
            urlencoding::encode(actor_id)
        );
        let body: StatusResponse = self.send_json(self.request(Method::GET, &url), &url).await?;
        Ok(FollowStatus::from_wire(&body.status))
    }

    async fn follow(&self, actor_id: &str) -> ClientResult<()> {
        let url = self.url("/_fedi3/social/follow");
        let req = self
            .request(Method::POST, &url)
            .json(&ActorRequest { actor: actor_id });
        self.send(req, &url).await?;
        Ok(())
    }

    async fn unfollow(&self, actor_id: &str) -> ClientResult<()> {
        let url = self.url("/_fedi3/social/unfollow");
        let req = self
            .request(Method::POST, &url)
            .json(&ActorRequest { actor: actor_id });
        self.send(req, &url).await?;
        Ok(())
    }

    async fn fetch_migration_status(&self) -> ClientResult<MigrationStatus> {
        let url = self.url("/_fedi3/migration/status");
        self.send_json(self.request(Method::GET, &url), &url).await
    }

    async fn set_legacy_aliases(&self, aliases: &[String]) -> ClientResult<SetAliasesResponse> {
        let url = self.url("/_fedi3/migration/legacy_aliases");
        let req = self
            .request(Method::POST, &url)
            .json(&AliasesRequest { aliases });
        self.send_json(req, &url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = CoreClient::new(CoreClientConfig {
            base_url: " http://127.0.0.1:8788/ ".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8788");
        assert_eq!(
            client.url("/_fedi3/social/status"),
            "http://127.0.0.1:8788/_fedi3/social/status"
        );
    }

    #[tokio::test]
    async fn test_unreachable_core_is_transport_error() {
        let client = CoreClient::new(CoreClientConfig {
            // Port 9 (discard) is never an HTTP server
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();

        let err = client.fetch_following_status("https://a.test/u").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
