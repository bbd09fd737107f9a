//! CSRF state tracking for login flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Outstanding states kept before the oldest is evicted.
pub const DEFAULT_MAX_PENDING: usize = 10_000;

/// A state issued for a flow that has not come back yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingState {
    /// State the host asked to round-trip, returned untouched on the callback.
    pub passthrough: Option<String>,
    expires_at: DateTime<Utc>,
}

/// Tracks `state` values issued during the request phase so the callback can
/// prove it belongs to a flow this process started.
///
/// Issued states are always random. Each is single use and expires after the
/// TTL; expired entries are dropped whenever a new state is issued.
#[derive(Clone)]
pub struct StateManager {
    states: Arc<Mutex<HashMap<String, PendingState>>>,
    ttl: Duration,
    max_pending: usize,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a new state manager with custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }

    /// Bound the number of outstanding states.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    /// Issue a fresh random state for a new flow.
    ///
    /// `passthrough` is stored alongside it and handed back by [`Self::consume`].
    pub fn issue(&self, passthrough: Option<&str>) -> String {
        let now = Utc::now();
        let state = Self::generate_token();
        let mut states = self.lock();

        states.retain(|_, pending| pending.expires_at > now);
        while states.len() >= self.max_pending {
            let Some(oldest) = states
                .iter()
                .min_by_key(|(_, pending)| pending.expires_at)
                .map(|(state, _)| state.clone())
            else {
                break;
            };
            states.remove(&oldest);
        }

        states.insert(
            state.clone(),
            PendingState {
                passthrough: passthrough.map(str::to_string),
                expires_at: now + self.ttl,
            },
        );
        state
    }

    /// Validate and consume a state. Returns `None` if unknown or expired.
    pub fn consume(&self, state: &str) -> Option<PendingState> {
        self.lock()
            .remove(state)
            .filter(|pending| Utc::now() <= pending.expires_at)
    }

    /// Drop expired states.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.lock().retain(|_, pending| pending.expires_at > now);
    }

    /// Number of outstanding states.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned map still holds valid entries.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_token() -> String {
        let random_bytes: [u8; 24] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
