// ── Full refresh application ──
//
// Applies a bulk record snapshot to the in-memory domain. Favorites are
// local state the gateway never reports, so they survive a refresh.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use super::collection::RecordCollection;
use super::Inner;
use crate::model::{EntityId, EntityRecord};

/// Upsert all incoming records, then prune any existing ids not in the
/// incoming set. Publishes once, so subscribers never see a half-applied
/// or empty intermediate snapshot.
fn upsert_and_prune(collection: &RecordCollection, records: Vec<EntityRecord>) -> (usize, usize) {
    let incoming: HashSet<EntityId> = records.iter().map(|r| r.id.clone()).collect();
    let mut added = 0;
    for record in records {
        if collection.insert_quiet(record) {
            added += 1;
        }
    }

    let mut pruned = 0;
    for existing in collection.ids() {
        if !incoming.contains(&existing) {
            collection.remove_quiet(&existing);
            pruned += 1;
        }
    }

    collection.publish();
    (added, pruned)
}

impl Inner {
    pub(super) fn apply_snapshot(&self, records: Vec<EntityRecord>) {
        let records = records
            .into_iter()
            .map(|mut record| {
                if let Some(existing) = self.records.get(&record.id) {
                    record.is_favorite = existing.is_favorite;
                }
                record
            })
            .collect();

        let (added, pruned) = upsert_and_prune(&self.records, records);

        // Drop order entries whose record disappeared.
        self.favorite_order.send_if_modified(|order| {
            let before = order.len();
            order.retain(|id| self.records.get(id).is_some_and(|r| r.is_favorite));
            order.len() != before
        });
        self.publish_favorites();

        self.last_refresh.send_replace(Some(Utc::now()));
        debug!(
            added,
            pruned,
            total = self.records.len(),
            "applied record snapshot"
        );
    }
}
