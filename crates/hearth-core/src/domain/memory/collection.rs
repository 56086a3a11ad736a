// ── Reactive record collection ──
//
// Concurrent storage keyed by `EntityId` with push-based change
// notification via a `watch` channel. Every published mutation rebuilds
// the ordered snapshot subscribers receive.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{EntityId, EntityRecord, Snapshot};

pub(crate) struct RecordCollection {
    by_id: DashMap<EntityId, Arc<EntityRecord>>,

    /// Full ordered snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Snapshot>,
}

impl RecordCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or replace a record and publish. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, record: EntityRecord) -> bool {
        let is_new = self.insert_quiet(record);
        self.publish();
        is_new
    }

    /// Insert or replace without publishing; callers batch with [`publish`].
    pub(crate) fn insert_quiet(&self, record: EntityRecord) -> bool {
        self.by_id
            .insert(record.id.clone(), Arc::new(record))
            .is_none()
    }

    /// Remove a record and publish. Returns the removed record if it existed.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<EntityRecord>> {
        let removed = self.remove_quiet(id);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    pub(crate) fn remove_quiet(&self, id: &EntityId) -> Option<Arc<EntityRecord>> {
        self.by_id.remove(id).map(|(_, v)| v)
    }

    /// Replace a record in place via `f`. Returns `false` if the id is unknown.
    pub(crate) fn modify(&self, id: &EntityId, f: impl FnOnce(&mut EntityRecord)) -> bool {
        let Some(mut entry) = self.by_id.get_mut(id) else {
            return false;
        };
        let mut record = (**entry).clone();
        f(&mut record);
        *entry = Arc::new(record);
        drop(entry);
        self.publish();
        true
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<EntityRecord>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Rebuild the ordered snapshot and broadcast it.
    ///
    /// Order is stable across mutations: kind, then name, then id.
    pub(crate) fn publish(&self) {
        let mut values: Vec<Arc<EntityRecord>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EntityKind;

    fn record(id: &str, kind: EntityKind, name: &str) -> EntityRecord {
        EntityRecord::new(id, kind, name)
    }

    #[test]
    fn upsert_returns_true_for_new_id() {
        let col = RecordCollection::new();
        assert!(col.upsert(record("a", EntityKind::Device, "Lamp")));
        assert!(!col.upsert(record("a", EntityKind::Device, "Lamp 2")));
        assert_eq!(col.get(&"a".into()).unwrap().name, "Lamp 2");
    }

    #[test]
    fn remove_publishes_only_when_present() {
        let col = RecordCollection::new();
        col.upsert(record("a", EntityKind::Device, "Lamp"));
        let mut rx = col.subscribe();
        rx.borrow_and_update();

        assert!(col.remove(&"missing".into()).is_none());
        assert!(!rx.has_changed().unwrap());

        assert!(col.remove(&"a".into()).is_some());
        assert!(rx.has_changed().unwrap());
        assert!(col.snapshot().is_empty());
    }

    #[test]
    fn snapshot_is_ordered_by_kind_then_name() {
        let col = RecordCollection::new();
        col.upsert(record("s", EntityKind::Scene, "Evening"));
        col.upsert(record("d2", EntityKind::Device, "Porch"));
        col.upsert(record("g", EntityKind::Group, "Kitchen"));
        col.upsert(record("d1", EntityKind::Device, "Desk"));

        let names: Vec<_> = col.snapshot().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, ["Desk", "Porch", "Kitchen", "Evening"]);
    }

    #[test]
    fn modify_replaces_record() {
        let col = RecordCollection::new();
        col.upsert(record("a", EntityKind::Device, "Lamp"));
        assert!(col.modify(&"a".into(), |r| r.is_favorite = true));
        assert!(col.get(&"a".into()).unwrap().is_favorite);
        assert!(!col.modify(&"b".into(), |r| r.is_favorite = true));
    }

    #[test]
    fn quiet_inserts_publish_once() {
        let col = RecordCollection::new();
        let mut rx = col.subscribe();
        rx.borrow_and_update();
        col.insert_quiet(record("a", EntityKind::Device, "A"));
        col.insert_quiet(record("b", EntityKind::Device, "B"));
        assert!(col.snapshot().is_empty());
        assert_eq!(col.len(), 2);
        assert!(!rx.has_changed().unwrap());

        col.publish();
        assert_eq!(rx.borrow_and_update().len(), 2);
        assert!(!rx.has_changed().unwrap());
    }
}
