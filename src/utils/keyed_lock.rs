use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

// ============================================================================
// Keyed Lock Registry
// ============================================================================
//
// One async mutex per key, created lazily. Used to serialize work that must
// not interleave for the same entity (transitions on one order, checkouts of
// one shopper) while letting different keys proceed in parallel.
//
// An entry lives only while someone holds or waits for its lock: the last
// guard to drop removes it, so the registry stays as small as the number of
// keys currently in use.
//
// ============================================================================

pub struct KeyedLocks<K> {
    locks: SyncMutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: SyncMutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn acquire(&self, key: &K) -> KeyedGuard<'_, K> {
        // The registry mutex is never held across an await
        let lock = self
            .registry()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        KeyedGuard {
            registry: self,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Keys currently held or awaited
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<K, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, key: &K) {
        let mut locks = self.registry();
        // The map's own Arc is the only one left: no holder, no waiter
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to one key of a [`KeyedLocks`]
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyedGuard<'a, K>
where
    K: Eq + Hash + Clone,
{
    registry: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> Drop for KeyedGuard<'_, K>
where
    K: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.release(&self.key);
    }
}
