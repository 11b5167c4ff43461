use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutexes keyed by id, created lazily.
///
/// Used where the store cannot express a constraint itself, so that
/// fetch, check and write for the same key run one at a time. An entry is
/// dropped again once no caller holds or waits for it.
pub struct KeyedLocks<K>
where
    K: Eq + Hash,
{
    locks: DashMap<K, Arc<Mutex<()>>>,
}

/// Held keys of one `acquire` call, released on drop.
pub struct KeyedGuard<'a, K>
where
    K: Eq + Hash,
{
    owner: &'a KeyedLocks<K>,
    held: Vec<(K, OwnedMutexGuard<()>)>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Locks every key, always in ascending key order so that two callers
    /// with overlapping key sets cannot deadlock.
    pub async fn acquire(&self, keys: &[K]) -> KeyedGuard<'_, K> {
        let mut sorted = keys.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        for key in sorted {
            let lock = self.locks.entry(key.clone()).or_default().value().clone();
            held.push((key, lock.lock_owned().await));
        }
        KeyedGuard { owner: self, held }
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyedGuard<'_, K>
where
    K: Eq + Hash,
{
    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<K> Drop for KeyedGuard<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        for (key, guard) in self.held.drain(..) {
            drop(guard);
            // the map's own reference is the last one: nobody holds or waits
            self.owner
                .locks
                .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let guards = locks.acquire(&[1]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let held = locks.acquire(&[1]).await.len();
                held
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guards);
        assert_eq!(contender.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn disjoint_keys_do_not_block() {
        let locks = KeyedLocks::<u32>::new();
        let _first = locks.acquire(&[1, 2]).await;
        let second = locks.acquire(&[3]).await;
        assert_eq!(second.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_keys_lock_once() {
        let locks = KeyedLocks::<u32>::new();
        let guards = locks.acquire(&[5, 5, 4]).await;
        assert_eq!(guards.len(), 2);
    }

    #[tokio::test]
    async fn released_keys_are_forgotten() {
        let locks = KeyedLocks::<u32>::new();
        for key in 0..100 {
            let _guard = locks.acquire(&[key, key + 1]).await;
        }
        assert!(locks.locks.is_empty());
    }

    #[tokio::test]
    async fn key_with_a_waiter_survives_release() {
        let locks = Arc::new(KeyedLocks::<u32>::new());
        let guards = locks.acquire(&[7]).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let guard = locks.acquire(&[7]).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
                drop(guard);
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guards);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(locks.locks.contains_key(&7));

        waiter.await.unwrap();
        assert!(locks.locks.is_empty());
    }
}
