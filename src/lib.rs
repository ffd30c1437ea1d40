/// Fedi3 follow client
///
/// Resolves remote ActivityPub actors and keeps the local follow relationship
/// with them reconciled against the Fedi3 core's control API.

pub mod actor;
pub mod config;
pub mod control;
pub mod error;
pub mod follow;
pub mod migration;
pub mod policy;
pub mod relay;

pub use actor::{ActivityRecord, ActorProfile, ActorRepository, HttpActorRepository};
pub use config::{ClientConfig, FollowSettings};
pub use control::{ControlApi, CoreClient, FollowStatus};
pub use error::{ClientError, ClientResult};
pub use follow::{ProfileView, ToggleResult};
