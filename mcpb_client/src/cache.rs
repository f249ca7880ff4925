// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Weak},
};

use parking_lot::RwLock;

/// Hands out one shared value per key for as long as somebody holds it.
///
/// Values are held weakly, so a handle that nobody references anymore is rebuilt from scratch
/// the next time it's asked for.
pub(crate) struct SingletonCache<K, V> {
    entries: RwLock<HashMap<K, Weak<V>>>,
}

impl<K: Eq + Hash + Clone, V> SingletonCache<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read().get(key).and_then(Weak::upgrade)
    }

    pub(crate) fn get_or_create(&self, key: &K, create: impl FnOnce() -> V) -> Arc<V> {
        if let Some(value) = self.get(key) {
            return value;
        }
        let mut entries = self.entries.write();
        // Someone else may have won the race between dropping the read lock and getting here.
        if let Some(value) = entries.get(key).and_then(Weak::upgrade) {
            return value;
        }
        entries.retain(|_, v| v.strong_count() > 0);
        let value = Arc::new(create());
        entries.insert(key.clone(), Arc::downgrade(&value));
        value
    }

    /// Number of entries that are still alive.
    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|v| v.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_same_key_same_value() {
        let cache = SingletonCache::new();
        let a = cache.get_or_create(&"a".to_string(), || 1);
        let b = cache.get_or_create(&"a".to_string(), || 2);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, 1);
        let c = cache.get_or_create(&"c".to_string(), || 3);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.live_count(), 2);
    }

    #[test]
    fn test_dropped_values_are_recreated() {
        let cache = SingletonCache::new();
        let a = cache.get_or_create(&7, || "first".to_string());
        drop(a);
        assert!(cache.get(&7).is_none());
        assert_eq!(cache.live_count(), 0);
        let b = cache.get_or_create(&7, || "second".to_string());
        assert_eq!(*b, "second");
    }

    #[test]
    fn test_concurrent_creation_yields_one_value() {
        let cache = Arc::new(SingletonCache::new());
        let created = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let created = created.clone();
                std::thread::spawn(move || {
                    cache.get_or_create(&"shared".to_string(), || {
                        created.fetch_add(1, Ordering::SeqCst);
                        42
                    })
                })
            })
            .collect();
        let values: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }
}
