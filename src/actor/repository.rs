/// HTTP actor repository - ActivityPub fetching with caching
use crate::{
    actor::{parse_activity_items, ActivityRecord, ActorCache, ActorProfile, ActorRepository},
    error::{ClientError, ClientResult},
};
use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const ACTIVITY_ACCEPT: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

/// Actor repository configuration
#[derive(Debug, Clone)]
pub struct HttpActorRepositoryConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for HttpActorRepositoryConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("fedi3-follow/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Actor repository backed by plain ActivityPub GETs
#[derive(Clone)]
pub struct HttpActorRepository {
    cache: ActorCache,
    http_client: reqwest::Client,
}

impl HttpActorRepository {
    /// Create a new actor repository
    pub fn new(config: HttpActorRepositoryConfig) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let ttl = chrono::Duration::from_std(config.cache_ttl)
            .map_err(|e| ClientError::Config(format!("Invalid cache TTL: {}", e)))?;

        Ok(Self {
            cache: ActorCache::new().with_ttl(ttl),
            http_client,
        })
    }

    pub fn cache(&self) -> &ActorCache {
        &self.cache
    }

    /// GET an ActivityStreams document; `Ok(None)` on 404/410
    async fn fetch_document(&self, url: &str) -> ClientResult<Option<Value>> {
        debug!("Fetching ActivityStreams document: {}", url);

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, ACTIVITY_ACCEPT)
            .send()
            .await
            .map_err(|e| ClientError::transport(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let doc: Value = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Invalid document from {}: {}", url, e)))?;

        Ok(Some(doc))
    }

    async fn require_document(&self, url: &str) -> ClientResult<Value> {
        self.fetch_document(url)
            .await?
            .ok_or_else(|| ClientError::NotFound(url.to_string()))
    }
}

#[async_trait]
impl ActorRepository for HttpActorRepository {
    /// Resolve actor with caching
    ///
    /// Resolution order:
    /// 1. Check cache first (fast path)
    /// 2. Fetch the actor document
    /// 3. Cache successful resolution
    async fn get_actor(&self, url: &str) -> ClientResult<Option<Arc<ActorProfile>>> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClientError::Validation("actor url is empty".to_string()));
        }

        if let Some(cached) = self.cache.get(url).await {
            return Ok(Some(cached));
        }

        let Some(doc) = self.fetch_document(url).await? else {
            return Ok(None);
        };
        let profile = Arc::new(ActorProfile::from_json(&doc)?);

        self.cache.insert(url, Arc::clone(&profile)).await;

        Ok(Some(profile))
    }

    async fn fetch_collection_count(&self, collection_url: &str) -> ClientResult<u64> {
        let doc = self.require_document(collection_url).await?;
        doc.get("totalItems")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                ClientError::Decode(format!("{} has no totalItems", collection_url))
            })
    }

    async fn fetch_outbox(&self, outbox_url: &str, limit: usize) -> ClientResult<Vec<ActivityRecord>> {
        let collection = self.require_document(outbox_url).await?;

        let inline = parse_activity_items(&collection, limit);
        if !inline.is_empty() {
            return Ok(inline);
        }

        // Items live on the first page, either embedded or by reference
        match collection.get("first") {
            Some(Value::String(page_url)) => {
                let page = self.require_document(page_url).await?;
                Ok(parse_activity_items(&page, limit))
            }
            Some(page @ Value::Object(_)) => {
                let items = parse_activity_items(page, limit);
                if !items.is_empty() {
                    return Ok(items);
                }
                match page.get("id").and_then(Value::as_str) {
                    Some(page_url) if page_url != outbox_url => {
                        let page = self.require_document(page_url).await?;
                        Ok(parse_activity_items(&page, limit))
                    }
                    _ => Ok(Vec::new()),
                }
            }
            _ => Ok(Vec::new()),
        }
    }
}
