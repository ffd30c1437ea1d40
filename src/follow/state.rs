/// Follow relationship held in a view's transient state
use crate::control::FollowStatus;
use tracing::debug;

/// Relationship between the local actor and the viewed actor
///
/// Every local write bumps `epoch`. A status read carries the epoch it was
/// issued under and is dropped if a local write happened while it was in
/// flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowRelationship {
    status: FollowStatus,
    epoch: u64,
}

impl FollowRelationship {
    pub fn new(status: FollowStatus) -> Self {
        Self { status, epoch: 0 }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn status(&self) -> FollowStatus {
        self.status
    }

    pub fn is_following(&self) -> bool {
        self.status.is_following()
    }

    /// Apply a status read from the core, issued under `read_epoch`.
    ///
    /// Reads that predate a local write are discarded. A reported `None` is a
    /// stale read while local state is `Pending` or `Accepted` and is discarded
    /// too. Returns whether the status was applied.
    pub fn apply_reported(&mut self, read_epoch: u64, reported: FollowStatus) -> bool {
        if read_epoch != self.epoch {
            debug!(
                "Dropping '{}' status read from before a local change",
                reported.as_str()
            );
            return false;
        }
        if reported == FollowStatus::None && self.status.is_following() {
            debug!(
                "Ignoring stale 'none' status while local status is {}",
                self.status.as_str()
            );
            return false;
        }
        self.status = reported;
        true
    }

    /// Flip to the intended state before the follow/unfollow call resolves.
    ///
    /// Returns the prior status and the optimistic one.
    pub fn begin_toggle(&mut self) -> (FollowStatus, FollowStatus) {
        let prior = self.status;
        self.epoch += 1;
        self.status = if prior.is_following() {
            FollowStatus::None
        } else {
            FollowStatus::Pending
        };
        (prior, self.status)
    }

    /// Explicit overwrite, bypassing the sticky rule (toggle revert, actor change)
    pub fn force(&mut self, status: FollowStatus) {
        self.epoch += 1;
        self.status = status;
    }
}
