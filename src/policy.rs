/// Error policy shared by every network operation
///
/// Each operation is either best-effort (failures are logged and absorbed,
/// prior state is left untouched) or surfaced (the raw error description is
/// shown to the user). Call sites settle their results through one policy
/// table instead of deciding ad hoc.
use crate::error::ClientResult;
use tracing::{debug, warn};

/// How failures of an operation are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    BestEffort,
    Surfaced,
}

/// Every network operation issued by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResolveProfile,
    CollectionCount,
    FetchOutbox,
    FollowingStatus,
    Follow,
    Unfollow,
    RelayPreview,
    MigrationStatus,
    SaveAliases,
}

impl Operation {
    pub fn policy(self) -> ErrorPolicy {
        match self {
            Operation::CollectionCount
            | Operation::FollowingStatus
            | Operation::RelayPreview => ErrorPolicy::BestEffort,
            Operation::ResolveProfile
            | Operation::FetchOutbox
            | Operation::Follow
            | Operation::Unfollow
            | Operation::MigrationStatus
            | Operation::SaveAliases => ErrorPolicy::Surfaced,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::ResolveProfile => "resolve profile",
            Operation::CollectionCount => "collection count",
            Operation::FetchOutbox => "fetch outbox",
            Operation::FollowingStatus => "following status",
            Operation::Follow => "follow",
            Operation::Unfollow => "unfollow",
            Operation::RelayPreview => "relay preview",
            Operation::MigrationStatus => "migration status",
            Operation::SaveAliases => "save aliases",
        }
    }
}

/// Result of settling an operation through its policy
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// Best-effort failure, already logged
    Absorbed,
    /// User-visible failure message
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// Apply the operation's policy to a result
pub fn settle<T>(op: Operation, result: ClientResult<T>) -> Outcome<T> {
    match result {
        Ok(v) => Outcome::Done(v),
        Err(e) => match op.policy() {
            ErrorPolicy::BestEffort => {
                debug!("{} failed (ignored): {}", op.name(), e);
                Outcome::Absorbed
            }
            ErrorPolicy::Surfaced => {
                warn!("{} failed: {}", op.name(), e);
                Outcome::Failed(e.to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn test_best_effort_absorbs() {
        let out: Outcome<u64> = settle(
            Operation::CollectionCount,
            Err(ClientError::Transport("boom".to_string())),
        );
        assert_eq!(out, Outcome::Absorbed);
    }

    #[test]
    fn test_surfaced_keeps_message() {
        let out: Outcome<()> = settle(
            Operation::Follow,
            Err(ClientError::Transport("connection refused".to_string())),
        );
        assert_eq!(
            out,
            Outcome::Failed("Transport error: connection refused".to_string())
        );
    }

    #[test]
    fn test_policy_table() {
        assert_eq!(Operation::FollowingStatus.policy(), ErrorPolicy::BestEffort);
        assert_eq!(Operation::RelayPreview.policy(), ErrorPolicy::BestEffort);
        assert_eq!(Operation::ResolveProfile.policy(), ErrorPolicy::Surfaced);
        assert_eq!(Operation::SaveAliases.policy(), ErrorPolicy::Surfaced);
    }
}
