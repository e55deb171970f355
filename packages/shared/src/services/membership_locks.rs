//! Per-game and per-user critical sections for membership changes.
//!
//! The directory offers no conditional update, so joins and leaves are
//! serialized here instead. A membership change holds the game lock for the
//! whole count/read/write sequence, then the user lock inside it. Locks are
//! always taken in that order.
//!
//! These locks only coordinate requests inside one process.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

struct KeyedLocks<K: Eq + Hash> {
    entries: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        // The map reference must be released before awaiting the mutex.
        let mutex = Arc::clone(&self.entries.entry(key.clone()).or_default());
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct KeyedGuard<'a, K: Eq + Hash> {
    locks: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            let mutex = Arc::clone(OwnedMutexGuard::mutex(&guard));
            drop(guard);
            // Two references left means only the map and `mutex` know about
            // it: nobody holds or waits on this key any more.
            self.locks.entries.remove_if(&self.key, |_, entry| {
                Arc::ptr_eq(entry, &mutex) && Arc::strong_count(entry) == 2
            });
        }
    }
}

/// Held for the duration of one join or leave.
pub struct MembershipGuard<'a> {
    // Field order is release order: user first, then game.
    _user: KeyedGuard<'a, String>,
    _game: KeyedGuard<'a, u64>,
}

pub struct MembershipLocks {
    games: KeyedLocks<u64>,
    users: KeyedLocks<String>,
}

impl MembershipLocks {
    pub fn new() -> Self {
        Self {
            games: KeyedLocks::new(),
            users: KeyedLocks::new(),
        }
    }

    pub async fn acquire(&self, game_id: u64, user_id: &str) -> MembershipGuard<'_> {
        let game = self.games.lock(game_id).await;
        let user = self.users.lock(user_id.to_string()).await;
        MembershipGuard {
            _user: user,
            _game: game,
        }
    }

    /// Number of keys currently locked or contended.
    pub fn active_keys(&self) -> usize {
        self.games.len() + self.users.len()
    }
}

impl Default for MembershipLocks {
    fn default() -> Self {
        Self::new()
    }
}
