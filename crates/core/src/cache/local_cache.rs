//! In-process cache with a hard entry limit.
//!
//! Eviction is first-in-first-out: reading an entry does not extend its life
//! and rewriting a key keeps its original slot in the eviction order.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use log::{debug, warn};

use crate::cache::TtlEntry;
use crate::clock::Clock;

struct LocalInner<T> {
    entries: HashMap<String, TtlEntry<T>>,
    order: VecDeque<String>,
}

impl<T> LocalInner<T> {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

pub struct LocalCache<T> {
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    inner: Mutex<LocalInner<T>>,
}

impl<T: Clone> LocalCache<T> {
    /// A capacity of zero disables the cache: every `put` is dropped.
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity,
            ttl,
            clock,
            inner: Mutex::new(LocalInner {
                entries: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::with_capacity(capacity.min(1024)),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalInner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Local cache lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the value if fresh. With `stale_ok` an expired entry is
    /// returned too and left in place; without it the expired entry is dropped.
    pub fn get(&self, key: &str, stale_ok: bool) -> Option<T> {
        let now = self.clock.now();
        let mut inner = self.lock();

        match inner.entries.get(key) {
            None => return None,
            Some(entry) if stale_ok || entry.is_valid(now) => return Some(entry.data.clone()),
            Some(_) => {}
        }

        inner.remove(key);
        None
    }

    /// Stores a fresh entry, evicting the oldest-inserted keys while full.
    pub fn put(&self, key: &str, value: T) {
        if self.capacity == 0 {
            return;
        }

        let entry = TtlEntry::new(value, self.clock.now(), self.ttl);
        let mut inner = self.lock();

        if let Some(slot) = inner.entries.get_mut(key) {
            *slot = entry;
            return;
        }

        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                    debug!("Local cache full, evicted '{}'", oldest);
                }
                None => break,
            }
        }

        inner.order.push_back(key.to_string());
        inner.entries.insert(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
