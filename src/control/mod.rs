/// Core control API seam
///
/// The local Fedi3 core exposes follow relationships and account migration
/// over a small HTTP control plane. Everything the client needs from it goes
/// through [`ControlApi`] so views can be driven by fakes in tests.

pub mod client;

pub use client::{CoreClient, CoreClientConfig};

use crate::error::ClientResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Relationship between the local actor and a remote actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    #[default]
    None,
    Pending,
    Accepted,
}

impl FollowStatus {
    /// Decode the core's status string; anything unknown counts as `None`
    pub fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => FollowStatus::Pending,
            "accepted" => FollowStatus::Accepted,
            _ => FollowStatus::None,
        }
    }

    /// Pending and accepted both count as following
    pub fn is_following(self) -> bool {
        matches!(self, FollowStatus::Pending | FollowStatus::Accepted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FollowStatus::None => "none",
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
        }
    }
}

/// Relay migration hints returned with the migration status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayMigration {
    #[serde(default)]
    pub has_previous_actor_alias: bool,
    #[serde(default)]
    pub note: String,
}

/// Migration status of the local account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub actor: String,
    #[serde(default)]
    pub public_base_url: String,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub legacy_followers_count: u64,
    #[serde(default)]
    pub legacy_aliases: Vec<String>,
    #[serde(default)]
    pub relay_migration: RelayMigration,
    /// Per-implementation instructions, passed through untouched
    #[serde(default)]
    pub legacy_guides: serde_json::Value,
    #[serde(default)]
    pub key_id: Option<String>,
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub also_known_as: Vec<String>,
}

/// Response to a legacy alias update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAliasesResponse {
    #[serde(default)]
    pub ok: bool,
    /// Aliases as normalized and stored by the core
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub restart_required: bool,
}

/// Control-plane operations of the local core
#[async_trait]
pub trait ControlApi: Send + Sync {
    async fn fetch_following_status(&self, actor_id: &str) -> ClientResult<FollowStatus>;

    async fn follow(&self, actor_id: &str) -> ClientResult<()>;

    async fn unfollow(&self, actor_id: &str) -> ClientResult<()>;

    async fn fetch_migration_status(&self) -> ClientResult<MigrationStatus>;

    async fn set_legacy_aliases(&self, aliases: &[String]) -> ClientResult<SetAliasesResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_status_from_wire() {
        assert_eq!(FollowStatus::from_wire("pending"), FollowStatus::Pending);
        assert_eq!(FollowStatus::from_wire(" Accepted "), FollowStatus::Accepted);
        assert_eq!(FollowStatus::from_wire("none"), FollowStatus::None);
        assert_eq!(FollowStatus::from_wire("rejected"), FollowStatus::None);
    }

    #[test]
    fn test_is_following() {
        assert!(FollowStatus::Pending.is_following());
        assert!(FollowStatus::Accepted.is_following());
        assert!(!FollowStatus::None.is_following());
    }

    #[test]
    fn test_migration_status_deserialize() {
        let json = serde_json::json!({
            "actor": "https://relay.example/users/me",
            "key_id": "https://relay.example/users/me#main-key",
            "did": null,
            "domain": "relay.example",
            "public_base_url": "https://relay.example",
            "followers_count": 12,
            "legacy_followers_count": 3,
            "also_known_as": ["https://old.example/users/me"],
            "legacy_aliases": ["https://old.example/users/me"],
            "relay_migration": {"has_previous_actor_alias": true, "note": "Ok"},
            "legacy_guides": {"common": {"alias_on_new": "..."}}
        });

        let status: MigrationStatus = serde_json::from_value(json).unwrap();
        assert_eq!(status.followers_count, 12);
        assert_eq!(status.legacy_followers_count, 3);
        assert_eq!(status.legacy_aliases.len(), 1);
        assert!(status.relay_migration.has_previous_actor_alias);
        assert!(status.legacy_guides.get("common").is_some());
        assert_eq!(status.did, None);
    }
}
