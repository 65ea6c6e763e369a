//! Keyed exclusive locks.
//!
//! The leave ledger serializes all balance work for one employee, and the run
//! engine serializes `process` and `lock` for one run. [`KeyedLocks`] hands out
//! one mutex per key so unrelated keys never wait on each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A set of mutexes addressed by key.
///
/// An entry lives only while some caller holds or waits on it, so the map
/// stays as small as the number of keys currently contended.
///
/// # Example
///
/// ```
/// use payroll_engine::sync::KeyedLocks;
///
/// let locks: KeyedLocks<String> = KeyedLocks::new();
/// let value = locks.with_lock("emp_001".to_string(), || 40 + 2);
/// assert_eq!(value, 42);
/// ```
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Creates an empty lock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    ///
    /// The guarded value is `()`, so a panic in a previous holder leaves
    /// nothing inconsistent behind and poisoning is ignored.
    pub fn with_lock<T>(&self, key: K, f: impl FnOnce() -> T) -> T {
        let lock = Arc::clone(self.map().entry(key.clone()).or_default());
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.map();
        // Held by the map and by this call only: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }
        result
    }

    /// Number of keys that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// Returns true when no key has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn map(&self) -> MutexGuard<'_, HashMap<K, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with_lock(1, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_lock_returns_closure_value() {
        let locks = KeyedLocks::<&str>::new();
        assert_eq!(locks.with_lock("a", || "done"), "done");
        assert_eq!(locks.with_lock("b", || 7), 7);
    }

    #[test]
    fn test_entries_are_dropped_once_released() {
        let locks = KeyedLocks::<String>::new();
        for i in 0..100 {
            locks.with_lock(format!("emp_{:03}", i), || ());
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_entry_is_kept_while_held() {
        let locks = KeyedLocks::<u32>::new();
        let during = locks.with_lock(5, || locks.len());
        assert_eq!(during, 1);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn test_contended_key_is_dropped_after_last_holder() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || locks.with_lock(i % 2, thread::yield_now))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(locks.is_empty());
    }
}
