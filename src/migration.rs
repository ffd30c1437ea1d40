/// Account migration: status display and legacy alias editing
use crate::{
    control::{ControlApi, MigrationStatus},
    error::ClientResult,
    policy::{settle, Operation, Outcome},
};
use std::sync::Arc;
use tracing::info;

/// Split user input on commas or newlines, trimming and dropping empty entries
pub fn parse_aliases(input: &str) -> Vec<String> {
    input
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of saving legacy aliases
#[derive(Debug, Clone, PartialEq)]
pub struct SavedAliases {
    pub aliases: Vec<String>,
    pub restart_required: bool,
}

/// Migration screen backend
pub struct MigrationService {
    control: Arc<dyn ControlApi>,
}

impl MigrationService {
    pub fn new(control: Arc<dyn ControlApi>) -> Self {
        Self { control }
    }

    /// Load the migration status; failures carry a user-visible message
    pub async fn load(&self) -> Outcome<MigrationStatus> {
        settle(
            Operation::MigrationStatus,
            self.control.fetch_migration_status().await,
        )
    }

    /// Parse and store legacy aliases
    pub async fn save_aliases(&self, input: &str) -> Outcome<SavedAliases> {
        let aliases = parse_aliases(input);
        let result: ClientResult<SavedAliases> = self
            .control
            .set_legacy_aliases(&aliases)
            .await
            .map(|resp| SavedAliases {
                // The core returns the normalized list it stored
                aliases: if resp.aliases.is_empty() { aliases.clone() } else { resp.aliases },
                restart_required: resp.restart_required,
            });

        let outcome = settle(Operation::SaveAliases, result);
        if let Outcome::Done(saved) = &outcome {
            info!(
                "Saved {} legacy aliases (restart required: {})",
                saved.aliases.len(),
                saved.restart_required
            );
        }
        outcome
    }
}
