/// Configuration management for the Fedi3 follow client
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub core: CoreConfig,
    pub actor: ActorConfig,
    pub follow: FollowSettings,
    pub relay: RelaySettings,
    pub logging: LoggingConfig,
}

/// Local core control API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub base_url: String,
    /// Sent as `X-Fedi3-Internal` when non-empty
    pub internal_token: String,
    pub timeout_secs: u64,
}

/// Remote actor fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

/// Timing of the follow-state reconciliation loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowSettings {
    /// Period of the poll session while a follow is pending
    pub poll_interval_secs: u64,
    /// Delay of the single extra re-check after a toggle
    pub recheck_delay_secs: u64,
    /// Number of outbox activities shown on a profile
    pub outbox_page_size: usize,
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 6,
            recheck_delay_secs: 2,
            outbox_page_size: 20,
        }
    }
}

impl FollowSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn recheck_delay(&self) -> Duration {
        Duration::from_secs(self.recheck_delay_secs)
    }
}

/// Relay used for bootstrap discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    pub base_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ClientResult<Self> {
        dotenv::dotenv().ok();

        let base_url = env::var("FEDI3_CORE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8788".to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        let internal_token = env::var("FEDI3_INTERNAL_TOKEN").unwrap_or_default();
        let timeout_secs = env::var("FEDI3_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ClientError::Config("Invalid FEDI3_HTTP_TIMEOUT_SECS".to_string()))?;

        let user_agent = env::var("FEDI3_USER_AGENT")
            .unwrap_or_else(|_| format!("fedi3-follow/{}", env!("CARGO_PKG_VERSION")));
        let cache_ttl_secs = env::var("FEDI3_ACTOR_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let defaults = FollowSettings::default();
        let poll_interval_secs = env::var("FEDI3_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.poll_interval_secs);
        let recheck_delay_secs = env::var("FEDI3_RECHECK_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.recheck_delay_secs);
        let outbox_page_size = env::var("FEDI3_OUTBOX_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.outbox_page_size);

        let relay_base_url = env::var("FEDI3_RELAY_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let json = env::var("FEDI3_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ClientConfig {
            core: CoreConfig {
                base_url,
                internal_token,
                timeout_secs,
            },
            actor: ActorConfig {
                user_agent,
                timeout_secs,
                cache_ttl_secs,
            },
            follow: FollowSettings {
                poll_interval_secs,
                recheck_delay_secs,
                outbox_page_size,
            },
            relay: RelaySettings {
                base_url: relay_base_url,
            },
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ClientResult<()> {
        if !is_http_url(&self.core.base_url) {
            return Err(ClientError::Config(format!(
                "Core URL must be http(s): {:?}",
                self.core.base_url
            )));
        }

        if let Some(relay) = &self.relay.base_url {
            if !is_http_url(relay) {
                return Err(ClientError::Config(format!(
                    "Relay URL must be http(s): {:?}",
                    relay
                )));
            }
        }

        if self.core.timeout_secs == 0 {
            return Err(ClientError::Config("HTTP timeout cannot be zero".to_string()));
        }

        if self.follow.poll_interval_secs == 0 {
            return Err(ClientError::Config("Poll interval cannot be zero".to_string()));
        }

        if self.follow.outbox_page_size == 0 {
            return Err(ClientError::Config("Outbox page size cannot be zero".to_string()));
        }

        Ok(())
    }
}

fn is_http_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("http://")
        .or_else(|| s.strip_prefix("https://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClientConfig {
        ClientConfig {
            core: CoreConfig {
                base_url: "http://127.0.0.1:8788".to_string(),
                internal_token: String::new(),
                timeout_secs: 10,
            },
            actor: ActorConfig {
                user_agent: "test".to_string(),
                timeout_secs: 10,
                cache_ttl_secs: 300,
            },
            follow: FollowSettings::default(),
            relay: RelaySettings { base_url: None },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }

    #[test]
    fn test_follow_settings_default() {
        let settings = FollowSettings::default();
        assert_eq!(settings.poll_interval(), Duration::from_secs(6));
        assert_eq!(settings.recheck_delay(), Duration::from_secs(2));
        assert_eq!(settings.outbox_page_size, 20);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = sample();
        config.core.base_url = "127.0.0.1:8788".to_string();
        assert!(config.validate().is_err());

        let mut config = sample();
        config.relay.base_url = Some("ftp://relay.example".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = sample();
        config.follow.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
