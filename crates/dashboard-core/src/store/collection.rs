// ── Generic reactive entity collection ──
//
// Concurrent keyed storage with push-based change notification via a
// `watch` snapshot channel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

/// A concurrent, reactive collection for a single entity type.
///
/// Every mutation rebuilds the snapshot that subscribers receive. Snapshot
/// order is by key, so listings are stable across calls.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_key: DashMap<String, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, entity: T) -> bool {
        let is_new = self.by_key.insert(key, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Apply `f` to the entity under `key`, returning the updated value.
    pub(crate) fn update(&self, key: &str, f: impl FnOnce(&mut T)) -> Option<Arc<T>> {
        let updated = {
            let mut entry = self.by_key.get_mut(key)?;
            let mut value = T::clone(entry.value());
            f(&mut value);
            let value = Arc::new(value);
            *entry.value_mut() = Arc::clone(&value);
            value
        };
        self.rebuild_snapshot();
        Some(updated)
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<T>> {
        let removed = self.by_key.remove(key).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(String, Arc<T>)> = self
            .by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_keys_and_orders_snapshot() {
        let c = EntityCollection::new();
        assert!(c.upsert("b".into(), 2));
        assert!(c.upsert("a".into(), 1));
        assert!(!c.upsert("b".into(), 3));

        let snap = c.snapshot();
        let values: Vec<i32> = snap.iter().map(|v| **v).collect();
        assert_eq!(values, vec![1, 3]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn update_and_remove_notify_subscribers() {
        let c = EntityCollection::new();
        c.upsert("k".into(), 1);
        let mut rx = c.subscribe();
        rx.mark_unchanged();

        assert_eq!(*c.update("k", |v| *v += 10).unwrap(), 11);
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        assert!(c.update("missing", |v| *v += 1).is_none());
        assert!(!rx.has_changed().unwrap());

        assert_eq!(*c.remove("k").unwrap(), 11);
        assert!(c.remove("k").is_none());
        assert!(c.snapshot().is_empty());
        assert!(c.get("k").is_none());
    }
}
