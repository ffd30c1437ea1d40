/// Remote actor model and repository seam
///
/// Resolves ActivityPub actors into immutable profile snapshots and reads
/// their collections (follower/following counts, recent outbox activities).

pub mod cache;
pub mod repository;

pub use cache::ActorCache;
pub use repository::{HttpActorRepository, HttpActorRepositoryConfig};

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Source of actor profiles and collection data
#[async_trait]
pub trait ActorRepository: Send + Sync {
    /// Resolve an actor URL; `Ok(None)` when the actor does not exist
    async fn get_actor(&self, url: &str) -> ClientResult<Option<Arc<ActorProfile>>>;

    /// `totalItems` of a collection
    async fn fetch_collection_count(&self, collection_url: &str) -> ClientResult<u64>;

    /// Most recent activities of an outbox, at most `limit`
    async fn fetch_outbox(&self, outbox_url: &str, limit: usize) -> ClientResult<Vec<ActivityRecord>>;
}

/// Name/value pair from the actor's `attachment` list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
}

/// Resolved remote identity. Replaced wholesale on every resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorProfile {
    pub id: String,
    pub display_name: String,
    pub preferred_username: String,
    pub summary: String,
    pub icon_url: String,
    pub image_url: String,
    pub url: String,
    pub followers: String,
    pub following: String,
    pub outbox: String,
    pub fields: Vec<ProfileField>,
    pub is_fedi3: bool,
    pub status_key: Option<String>,
}

impl ActorProfile {
    /// Build a profile from an ActivityStreams actor document
    pub fn from_json(doc: &Value) -> ClientResult<Self> {
        let id = str_field(doc, "id");
        if id.is_empty() {
            return Err(ClientError::Decode("actor document has no id".to_string()));
        }

        let fields = doc
            .get("attachment")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter(|a| a.get("type").and_then(Value::as_str) == Some("PropertyValue"))
                    .map(|a| ProfileField {
                        name: str_field(a, "name"),
                        value: str_field(a, "value"),
                    })
                    .filter(|f| !f.name.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let peer_id = doc
            .get("fedi3PeerId")
            .or_else(|| doc.get("endpoints").and_then(|e| e.get("fedi3PeerId")))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");

        let url = doc
            .get("url")
            .and_then(link_href)
            .unwrap_or_else(|| id.clone());

        Ok(Self {
            display_name: str_field(doc, "name"),
            preferred_username: str_field(doc, "preferredUsername"),
            summary: str_field(doc, "summary"),
            icon_url: doc.get("icon").and_then(link_href).unwrap_or_default(),
            image_url: doc.get("image").and_then(link_href).unwrap_or_default(),
            url,
            followers: str_field(doc, "followers"),
            following: str_field(doc, "following"),
            outbox: str_field(doc, "outbox"),
            fields,
            is_fedi3: !peer_id.is_empty(),
            status_key: doc
                .get("statusKey")
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.is_empty()),
            id,
        })
    }

    /// Label for headers: display name, else `@username`, else the id
    pub fn title(&self) -> String {
        if !self.display_name.trim().is_empty() {
            self.display_name.clone()
        } else if !self.preferred_username.is_empty() {
            format!("@{}", self.preferred_username)
        } else {
            self.id.clone()
        }
    }
}

/// One outbox entry shown on a profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub id: String,
    pub kind: String,
    pub published: Option<String>,
    pub object_id: Option<String>,
    pub content: Option<String>,
    pub raw: Value,
}

impl ActivityRecord {
    pub fn from_json(item: &Value) -> Option<Self> {
        // Bare references are kept as id-only records
        if let Some(id) = item.as_str() {
            return Some(Self {
                id: id.to_string(),
                kind: String::new(),
                published: None,
                object_id: None,
                content: None,
                raw: item.clone(),
            });
        }

        item.as_object()?;
        let object = item.get("object");
        let object_id = object.and_then(|o| match o {
            Value::String(s) => Some(s.clone()),
            _ => o.get("id").and_then(Value::as_str).map(str::to_string),
        });
        let content = object
            .and_then(|o| o.get("content"))
            .or_else(|| item.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            id: str_field(item, "id"),
            kind: str_field(item, "type"),
            published: item
                .get("published")
                .and_then(Value::as_str)
                .map(str::to_string),
            object_id,
            content,
            raw: item.clone(),
        })
    }
}

/// Extract activities from an outbox page or collection, newest first as served
pub fn parse_activity_items(page: &Value, limit: usize) -> Vec<ActivityRecord> {
    page.get("orderedItems")
        .or_else(|| page.get("items"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(ActivityRecord::from_json)
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Resolve an `icon`/`image`/`url` value: string, Link/Image object, or array of either
fn link_href(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("href"))
            .and_then(link_href),
        Value::Array(items) => items.iter().find_map(link_href),
        _ => None,
    }
}
