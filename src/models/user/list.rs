//! In-memory user list behind the user-management screen.
//!
//! The list is the screen's source of truth between page loads. A full fetch
//! replaces it in server order; a successful edit or delete patches it in
//! place without a round trip.
//!
//! Fetches and mutations can overlap. Every applied mutation is stamped from
//! a logical clock and journaled while any fetch is in flight. When a fetch
//! lands it is dropped if a newer fetch already landed; otherwise it replaces
//! the list and the journaled mutations stamped after it was issued are
//! replayed on top, so a slow fetch never erases a confirmed edit.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::api::{ApiClient, ApiError};
use crate::auth::session::{SessionStore, TOKEN_TTL_SECS};

use super::types::{User, UserPatch};

/// Which modal action an in-flight flag guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListError {
    /// The same kind of action is already in flight for this list.
    Busy(ActionKind),
    Api(ApiError),
}

impl ListError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ListError::Api(ApiError::Unauthorized))
    }
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListError::Busy(ActionKind::Update) => write!(f, "An update is already in progress"),
            ListError::Busy(ActionKind::Delete) => write!(f, "A deletion is already in progress"),
            ListError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ListError {}

impl From<ApiError> for ListError {
    fn from(e: ApiError) -> Self {
        ListError::Api(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mutation {
    Updated { id: i64, patch: UserPatch },
    Removed { id: i64 },
    Appended(User),
}

/// Plain list state. All methods are synchronous and run under the lock.
#[derive(Debug, Default)]
pub struct UserListState {
    users: Vec<User>,
    loaded: bool,
    is_updating: bool,
    is_deleting: bool,
    clock: u64,
    applied_fetch: u64,
    fetches_in_flight: usize,
    journal: Vec<(u64, Mutation)>,
}

impl UserListState {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Start a fetch; the returned ticket orders it against other events.
    pub fn begin_fetch(&mut self) -> u64 {
        self.fetches_in_flight += 1;
        self.tick()
    }

    /// Land a fetch issued at `ticket`. Returns false when a newer fetch
    /// already landed and this result was dropped.
    pub fn complete_fetch(&mut self, ticket: u64, users: Vec<User>) -> bool {
        if ticket < self.applied_fetch {
            log::debug!("Dropping stale user list (ticket {ticket} < {})", self.applied_fetch);
            return false;
        }

        self.users = users;
        self.loaded = true;
        self.applied_fetch = ticket;

        let replay: Vec<Mutation> = self
            .journal
            .iter()
            .filter(|(stamp, _)| *stamp > ticket)
            .map(|(_, m)| m.clone())
            .collect();
        for mutation in &replay {
            self.apply(mutation);
        }
        self.journal.retain(|(stamp, _)| *stamp > ticket);
        true
    }

    /// A fetch finished (landed, failed or was dropped).
    pub fn end_fetch(&mut self) {
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        if self.fetches_in_flight == 0 {
            self.journal.clear();
        }
    }

    /// Patch the matching entry in place. Returns whether it was present.
    pub fn apply_update(&mut self, id: i64, patch: UserPatch) -> bool {
        self.record(Mutation::Updated { id, patch })
    }

    /// Excise the matching entry. Returns whether it was present.
    pub fn apply_remove(&mut self, id: i64) -> bool {
        self.record(Mutation::Removed { id })
    }

    /// Append a newly created user unless its id is already listed.
    pub fn apply_append(&mut self, user: User) -> bool {
        self.record(Mutation::Appended(user))
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn record(&mut self, mutation: Mutation) -> bool {
        let changed = self.apply(&mutation);
        let stamp = self.tick();
        if self.fetches_in_flight > 0 {
            self.journal.push((stamp, mutation));
        }
        changed
    }

    fn apply(&mut self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::Updated { id, patch } => match self.users.iter_mut().find(|u| u.id == *id) {
                Some(user) => {
                    patch.apply_to(user);
                    true
                }
                None => false,
            },
            Mutation::Removed { id } => match self.users.iter().position(|u| u.id == *id) {
                Some(pos) => {
                    self.users.remove(pos);
                    true
                }
                None => false,
            },
            Mutation::Appended(user) => {
                if self.users.iter().any(|u| u.id == user.id) {
                    false
                } else {
                    self.users.push(user.clone());
                    true
                }
            }
        }
    }

    fn flag_mut(&mut self, kind: ActionKind) -> &mut bool {
        match kind {
            ActionKind::Update => &mut self.is_updating,
            ActionKind::Delete => &mut self.is_deleting,
        }
    }
}

/// Copy of the list state handed to templates.
#[derive(Debug, Clone, Default)]
pub struct ListSnapshot {
    pub users: Vec<User>,
    pub loaded: bool,
    pub is_updating: bool,
    pub is_deleting: bool,
}

impl ListSnapshot {
    pub fn find(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

fn lock(state: &Mutex<UserListState>) -> MutexGuard<'_, UserListState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Holds an action-kind flag for the duration of one operation. Released on
/// drop, so a cancelled request never leaves the modal locked.
struct InFlight<'a> {
    state: &'a Mutex<UserListState>,
    kind: ActionKind,
}

impl<'a> InFlight<'a> {
    fn acquire(state: &'a Mutex<UserListState>, kind: ActionKind) -> Result<Self, ListError> {
        let mut guard = lock(state);
        let flag = guard.flag_mut(kind);
        if *flag {
            return Err(ListError::Busy(kind));
        }
        *flag = true;
        Ok(Self { state, kind })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(self.state).flag_mut(self.kind) = false;
    }
}

struct PendingFetch<'a> {
    state: &'a Mutex<UserListState>,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        lock(self.state).end_fetch();
    }
}

/// Shared handle on one session's user list.
#[derive(Debug, Clone, Default)]
pub struct UserListController {
    state: Arc<Mutex<UserListState>>,
}

impl UserListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        let state = lock(&self.state);
        ListSnapshot {
            users: state.users.clone(),
            loaded: state.loaded,
            is_updating: state.is_updating,
            is_deleting: state.is_deleting,
        }
    }

    /// Reload the whole list. On failure the previous list is kept.
    pub async fn fetch_all(&self, api: &ApiClient, store: &SessionStore) -> Result<(), ListError> {
        let ticket = lock(&self.state).begin_fetch();
        let _pending = PendingFetch { state: &self.state };

        let users = api.list_users(store).await?;
        let count = users.len();
        if lock(&self.state).complete_fetch(ticket, users) {
            log::debug!("Loaded {count} users");
        }
        Ok(())
    }

    /// Save `patch` for user `id`, then patch the cached entry in place.
    pub async fn update(
        &self,
        api: &ApiClient,
        store: &SessionStore,
        id: i64,
        patch: UserPatch,
    ) -> Result<(), ListError> {
        let _in_flight = InFlight::acquire(&self.state, ActionKind::Update)?;
        api.update_user(store, id, &patch).await?;
        if !lock(&self.state).apply_update(id, patch) {
            log::debug!("Updated user {id} is not in the cached list");
        }
        Ok(())
    }

    /// Delete user `id`, then excise it from the cached list.
    pub async fn remove(&self, api: &ApiClient, store: &SessionStore, id: i64) -> Result<(), ListError> {
        let _in_flight = InFlight::acquire(&self.state, ActionKind::Delete)?;
        api.delete_user(store, id).await?;
        if !lock(&self.state).apply_remove(id) {
            log::debug!("Deleted user {id} is not in the cached list");
        }
        Ok(())
    }

    /// Add a user created elsewhere in the UI, if the list has been loaded.
    pub fn append(&self, user: User) {
        let mut state = lock(&self.state);
        if state.is_loaded() {
            state.apply_append(user);
        }
    }

    #[cfg(test)]
    fn with_state<R>(&self, f: impl FnOnce(&mut UserListState) -> R) -> R {
        let mut state = lock(&self.state);
        f(&mut *state)
    }
}

struct Tracked {
    controller: UserListController,
    last_seen: Instant,
}

/// User lists of all live sessions, keyed by session token.
#[derive(Default)]
pub struct UserListRegistry {
    lists: Mutex<HashMap<String, Tracked>>,
}

impl UserListRegistry {
    const IDLE_LIMIT: Duration = Duration::from_secs(TOKEN_TTL_SECS as u64);

    pub fn new() -> Self {
        Self::default()
    }

    /// The list for `token`, created on first use. Lists idle for longer
    /// than a token lives are evicted on the way.
    pub fn for_token(&self, token: &str) -> UserListController {
        let mut lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        lists.retain(|_, t| now.duration_since(t.last_seen) < Self::IDLE_LIMIT);

        let tracked = lists.entry(token.to_string()).or_insert_with(|| Tracked {
            controller: UserListController::new(),
            last_seen: now,
        });
        tracked.last_seen = now;
        tracked.controller.clone()
    }

    pub fn for_store(&self, store: &SessionStore) -> Option<UserListController> {
        store.get_token().map(|token| self.for_token(token))
    }

    pub fn discard(&self, token: &str) -> bool {
        let mut lists = self.lists.lock().unwrap_or_else(|e| e.into_inner());
        lists.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.lists.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
