/// Profile view - actor resolution and follow-state reconciliation
///
/// A view shows one remote actor at a time. Every asynchronous result is
/// tagged with the generation of the resolution that started it and is only
/// applied while that generation is current and the view is alive.
use crate::{
    actor::{ActivityRecord, ActorProfile, ActorRepository},
    config::FollowSettings,
    control::{ControlApi, FollowStatus},
    error::ClientError,
    follow::{FollowRelationship, PollSession},
    policy::{settle, Operation, Outcome},
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Outbox portion of the profile
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OutboxState {
    #[default]
    NotLoaded,
    /// The actor exposes no outbox
    Unavailable,
    Loading,
    Loaded(Vec<ActivityRecord>),
    Failed(String),
}

/// Displayed state of a profile view
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub profile: Option<Arc<ActorProfile>>,
    /// `None` until a count was fetched successfully
    pub followers_count: Option<u64>,
    pub following_count: Option<u64>,
    pub outbox: OutboxState,
    pub relationship: FollowRelationship,
    pub loading: bool,
    /// Last user-visible error
    pub error: Option<String>,
}

/// Point-in-time copy of a view for rendering
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub state: ViewState,
    pub poll_active: bool,
    pub recheck_scheduled: bool,
    pub toggling: bool,
}

impl ViewSnapshot {
    pub fn follow_status(&self) -> FollowStatus {
        self.state.relationship.status()
    }
}

/// Result of a follow toggle
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleResult {
    /// Nothing issued: no profile, no control API, torn down, or already toggling
    Skipped,
    /// Follow/unfollow accepted by the core; carries the displayed status
    Issued(FollowStatus),
    /// Follow/unfollow failed; status reverted and the message surfaced
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
enum Collection {
    Followers,
    Following,
}

/// Handle to a profile view. Dropping the last handle tears the view down.
pub struct ProfileView {
    inner: Arc<ViewInner>,
}

struct ViewInner {
    repo: Arc<dyn ActorRepository>,
    control: Option<Arc<dyn ControlApi>>,
    settings: FollowSettings,
    state: Mutex<ViewState>,
    generation: AtomicU64,
    alive: AtomicBool,
    toggling: AtomicBool,
    poll: Mutex<PollSession>,
    recheck: Mutex<Option<JoinHandle<()>>>,
}

/// Holds the toggle flag; cleared on drop so every exit path releases it
struct ToggleGuard<'a>(&'a AtomicBool);

impl<'a> ToggleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ToggleGuard(flag))
    }
}

impl Drop for ToggleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ProfileView {
    pub fn new(
        repo: Arc<dyn ActorRepository>,
        control: Option<Arc<dyn ControlApi>>,
        settings: FollowSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                repo,
                control,
                settings,
                state: Mutex::new(ViewState::default()),
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                toggling: AtomicBool::new(false),
                poll: Mutex::new(PollSession::new()),
                recheck: Mutex::new(None),
            }),
        }
    }

    /// Resolve `actor_url` and load its counts, outbox and follow status.
    ///
    /// Supersedes any resolution still in flight.
    pub async fn resolve_profile(&self, actor_url: &str) {
        self.inner.resolve_profile(actor_url).await
    }

    /// Best-effort re-read of the follow status from the core
    pub async fn refresh_following_status(&self) {
        self.inner.refresh_following_status().await
    }

    /// Follow or unfollow the displayed actor
    pub async fn toggle_follow(&self) -> ToggleResult {
        self.inner.toggle_follow().await
    }

    pub fn ensure_poll(&self) {
        self.inner.ensure_poll()
    }

    pub fn stop_poll(&self) {
        self.inner.stop_poll()
    }

    /// Stop all periodic and scheduled work; later results are discarded
    pub fn teardown(&self) {
        self.inner.teardown()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            state: self.inner.state.lock().clone(),
            poll_active: self.inner.poll.lock().is_active(),
            recheck_scheduled: self
                .inner
                .recheck
                .lock()
                .as_ref()
                .is_some_and(|h| !h.is_finished()),
            toggling: self.inner.toggling.load(Ordering::Acquire),
        }
    }
}

impl Drop for ProfileView {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl ViewInner {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_alive() && self.generation.load(Ordering::Acquire) == generation
    }

    fn current_actor_id(&self) -> Option<String> {
        self.state.lock().profile.as_ref().map(|p| p.id.clone())
    }

    /// Displayed actor id and the relationship epoch a status read starts under
    fn read_target(&self) -> Option<(String, u64)> {
        let state = self.state.lock();
        let actor_id = state.profile.as_ref()?.id.clone();
        Some((actor_id, state.relationship.epoch()))
    }

    async fn resolve_profile(self: &Arc<Self>, actor_url: &str) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.is_alive() {
            return;
        }

        let actor_url = actor_url.trim();
        let result = if actor_url.is_empty() {
            Err(ClientError::Validation("actor url is empty".to_string()))
        } else {
            {
                let mut state = self.state.lock();
                state.loading = true;
                state.error = None;
            }
            match self.repo.get_actor(actor_url).await {
                Ok(Some(profile)) => Ok(profile),
                Ok(None) => Err(ClientError::NotFound(actor_url.to_string())),
                Err(e) => Err(e),
            }
        };

        if !self.is_current(generation) {
            debug!("Discarding superseded resolution of {}", actor_url);
            return;
        }

        let profile = match settle(Operation::ResolveProfile, result) {
            Outcome::Done(profile) => profile,
            Outcome::Failed(message) => {
                let mut state = self.state.lock();
                state.loading = false;
                state.error = Some(message);
                return;
            }
            Outcome::Absorbed => return,
        };

        info!("Resolved actor {}", profile.id);
        let actor_changed = {
            let mut state = self.state.lock();
            let changed = state.profile.as_ref().map(|p| p.id.as_str()) != Some(profile.id.as_str());
            if changed {
                state.followers_count = None;
                state.following_count = None;
                state.relationship.force(FollowStatus::None);
            }
            state.outbox = if profile.outbox.is_empty() {
                OutboxState::Unavailable
            } else {
                OutboxState::Loading
            };
            state.profile = Some(Arc::clone(&profile));
            state.loading = false;
            changed
        };
        if actor_changed {
            self.stop_poll();
            self.cancel_recheck();
        }

        // No ordering between the three loads
        tokio::join!(
            self.load_count(generation, &profile.followers, Collection::Followers),
            self.load_count(generation, &profile.following, Collection::Following),
            self.load_outbox(generation, &profile),
        );

        if self.is_current(generation) {
            self.refresh_following_status().await;
        }
    }

    async fn load_count(&self, generation: u64, collection_url: &str, which: Collection) {
        if collection_url.is_empty() {
            return;
        }

        let result = self.repo.fetch_collection_count(collection_url).await;
        let Some(count) = settle(Operation::CollectionCount, result).ok() else {
            return;
        };
        if !self.is_current(generation) {
            return;
        }

        let mut state = self.state.lock();
        match which {
            Collection::Followers => state.followers_count = Some(count),
            Collection::Following => state.following_count = Some(count),
        }
    }

    async fn load_outbox(&self, generation: u64, profile: &ActorProfile) {
        if profile.outbox.is_empty() {
            return;
        }

        let result = self
            .repo
            .fetch_outbox(&profile.outbox, self.settings.outbox_page_size)
            .await;
        if !self.is_current(generation) {
            return;
        }

        let outbox = match settle(Operation::FetchOutbox, result) {
            Outcome::Done(items) => OutboxState::Loaded(items),
            Outcome::Failed(message) => OutboxState::Failed(message),
            Outcome::Absorbed => return,
        };
        self.state.lock().outbox = outbox;
    }

    async fn refresh_following_status(self: &Arc<Self>) {
        if !self.is_alive() {
            return;
        }
        let Some(control) = self.control.clone() else {
            return;
        };
        let Some((actor_id, read_epoch)) = self.read_target() else {
            return;
        };

        let result = control.fetch_following_status(&actor_id).await;
        let Some(reported) = settle(Operation::FollowingStatus, result).ok() else {
            return;
        };

        // The view may have moved on to another actor meanwhile
        if !self.is_alive() || self.current_actor_id().as_deref() != Some(actor_id.as_str()) {
            return;
        }

        let status = {
            let mut state = self.state.lock();
            state.relationship.apply_reported(read_epoch, reported);
            state.relationship.status()
        };
        debug!("Follow status for {}: {}", actor_id, status.as_str());
        self.sync_poll(status);
    }

    async fn toggle_follow(self: &Arc<Self>) -> ToggleResult {
        if !self.is_alive() {
            return ToggleResult::Skipped;
        }
        let Some(control) = self.control.clone() else {
            return ToggleResult::Skipped;
        };
        let Some(_guard) = ToggleGuard::acquire(&self.toggling) else {
            debug!("Follow toggle already in flight");
            return ToggleResult::Skipped;
        };

        let (actor_id, prior, optimistic) = {
            let mut state = self.state.lock();
            let Some(actor_id) = state.profile.as_ref().map(|p| p.id.clone()) else {
                return ToggleResult::Skipped;
            };
            let (prior, optimistic) = state.relationship.begin_toggle();
            state.error = None;
            (actor_id, prior, optimistic)
        };

        let (op, result) = if prior.is_following() {
            info!("Unfollowing {}", actor_id);
            (Operation::Unfollow, control.unfollow(&actor_id).await)
        } else {
            info!("Following {}", actor_id);
            (Operation::Follow, control.follow(&actor_id).await)
        };

        if !self.is_alive() || self.current_actor_id().as_deref() != Some(actor_id.as_str()) {
            return ToggleResult::Skipped;
        }

        match settle(op, result) {
            Outcome::Done(()) => {
                // Reads issued while the request was in flight predate it
                self.state.lock().relationship.force(optimistic);
                self.sync_poll(optimistic);
                self.refresh_following_status().await;
                self.schedule_recheck();
                ToggleResult::Issued(self.state.lock().relationship.status())
            }
            Outcome::Failed(message) => {
                {
                    let mut state = self.state.lock();
                    state.relationship.force(prior);
                    state.error = Some(message.clone());
                }
                self.sync_poll(prior);
                self.refresh_following_status().await;
                ToggleResult::Failed(message)
            }
            Outcome::Absorbed => ToggleResult::Skipped,
        }
    }

    /// One extra re-check after the toggle, for accepts delivered late
    fn schedule_recheck(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let delay = self.settings.recheck_delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                if inner.is_alive() {
                    debug!("Delayed follow status re-check");
                    inner.refresh_following_status().await;
                }
            }
        });

        if let Some(previous) = self.recheck.lock().replace(handle) {
            previous.abort();
        }
    }

    fn cancel_recheck(&self) {
        if let Some(handle) = self.recheck.lock().take() {
            handle.abort();
        }
    }

    fn sync_poll(self: &Arc<Self>, status: FollowStatus) {
        if status == FollowStatus::Pending {
            self.ensure_poll();
        } else {
            self.stop_poll();
        }
    }

    fn ensure_poll(self: &Arc<Self>) {
        if !self.is_alive() {
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        self.poll.lock().ensure(self.settings.poll_interval(), move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) if inner.is_alive() => {
                        inner.refresh_following_status().await;
                        true
                    }
                    _ => false,
                }
            }
        });
    }

    fn stop_poll(&self) {
        self.poll.lock().stop();
    }

    fn teardown(&self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            debug!("Tearing down profile view");
        }
        self.stop_poll();
        self.cancel_recheck();
    }
}

impl Drop for ViewInner {
    fn drop(&mut self) {
        self.teardown();
    }
}
