/// Follow-state reconciliation
///
/// Tracks the relationship with a viewed actor against the eventually
/// consistent answers of the core:
/// - Optimistic transitions on follow/unfollow
/// - Sticky pending/accepted state against stale reads
/// - Polling while a follow request is pending

pub mod poll;
pub mod state;
pub mod view;

pub use poll::PollSession;
pub use state::FollowRelationship;
pub use view::{OutboxState, ProfileView, ToggleResult, ViewSnapshot, ViewState};
