// ── In-memory domain ──
//
// A self-contained `DomainService` backed by concurrent collections and
// `watch` channels. Every feed it hands out is a `WatchStream` over one of
// the channels, so a new subscriber immediately sees the latest value and
// then every subsequent change.

mod collection;
mod refresh;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use self::collection::RecordCollection;
use super::{DomainService, Feed};
use crate::error::{CoreError, DomainError};
use crate::model::{
    ConnectionState, EntityId, EntityKind, EntityRecord, GatewayInfo, Snapshot,
};

/// Produces the full record set a refresh should converge to.
pub type RefreshSource = Arc<dyn Fn() -> Vec<EntityRecord> + Send + Sync>;

/// Serialized form of a home: the gateway plus every record it knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub gateway: GatewayInfo,
    #[serde(default)]
    pub records: Vec<EntityRecord>,
}

/// In-process backing domain.
///
/// Cheaply cloneable; clones share the same underlying state.
#[derive(Clone)]
pub struct MemoryDomain {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    records: RecordCollection,
    favorite_order: watch::Sender<Vec<EntityId>>,
    favorites: watch::Sender<Snapshot>,
    gateway: watch::Sender<GatewayInfo>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
    refresh_source: Mutex<Option<RefreshSource>>,
    latency_ms: AtomicU64,
}

impl MemoryDomain {
    pub fn new(gateway: GatewayInfo) -> Self {
        Self::from_records(gateway, Vec::new())
    }

    /// Seed the domain. Favorites start in collection order.
    pub fn from_records(gateway: GatewayInfo, records: Vec<EntityRecord>) -> Self {
        let inner = Inner {
            records: RecordCollection::new(),
            favorite_order: watch::channel(Vec::new()).0,
            favorites: watch::channel(Arc::new(Vec::new())).0,
            gateway: watch::channel(gateway).0,
            last_refresh: watch::channel(None).0,
            refresh_source: Mutex::new(None),
            latency_ms: AtomicU64::new(0),
        };

        for record in records {
            inner.records.insert_quiet(record);
        }
        inner.records.publish();

        let order: Vec<EntityId> = inner
            .records
            .snapshot()
            .iter()
            .filter(|r| r.is_favorite)
            .map(|r| r.id.clone())
            .collect();
        inner.favorite_order.send_replace(order);
        inner.publish_favorites();

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        Self::from_records(fixture.gateway, fixture.records)
    }

    /// Parse a JSON fixture document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Delay applied before every command takes effect.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Install the source `refresh_all` converges to.
    pub fn set_refresh_source(&self, source: RefreshSource) {
        if let Ok(mut slot) = self.inner.refresh_source.lock() {
            *slot = Some(source);
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn records(&self) -> Snapshot {
        self.inner.records.snapshot()
    }

    pub fn record(&self, id: &EntityId) -> Option<EntityRecord> {
        self.inner.records.get(id).map(|r| (*r).clone())
    }

    pub fn favorites(&self) -> Snapshot {
        self.inner.favorites.borrow().clone()
    }

    pub fn gateway(&self) -> GatewayInfo {
        self.inner.gateway.borrow().clone()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_refresh.borrow()
    }

    // ── Simulation ───────────────────────────────────────────────────

    /// Insert or replace a record as if the gateway reported it.
    pub fn upsert(&self, record: EntityRecord) {
        let id = record.id.clone();
        let is_favorite = record.is_favorite;
        self.inner.records.upsert(record);
        self.inner.sync_order(&id, is_favorite);
        self.inner.publish_favorites();
    }

    pub fn remove(&self, id: &EntityId) -> Option<EntityRecord> {
        let removed = self.inner.records.remove(id)?;
        self.inner.sync_order(id, false);
        self.inner.publish_favorites();
        Some((*removed).clone())
    }

    /// Merge `attributes` into the record. Returns `false` for an unknown id.
    pub fn update_attributes(&self, id: &EntityId, attributes: Map<String, Value>) -> bool {
        let updated = self.inner.records.modify(id, |record| {
            record.attributes.extend(attributes);
        });
        if updated {
            self.inner.publish_favorites();
        }
        updated
    }

    fn latency(&self) -> Duration {
        Duration::from_millis(self.inner.latency_ms.load(Ordering::Relaxed))
    }
}

impl Inner {
    /// Keep the favorite order in step with a record's favorite flag.
    /// New favorites go to the end.
    fn sync_order(&self, id: &EntityId, is_favorite: bool) {
        self.favorite_order.send_if_modified(|order| {
            let present = order.contains(id);
            match (is_favorite, present) {
                (true, false) => {
                    order.push(id.clone());
                    true
                }
                (false, true) => {
                    order.retain(|existing| existing != id);
                    true
                }
                _ => false,
            }
        });
    }

    fn publish_favorites(&self) {
        let next: Vec<Arc<EntityRecord>> = self
            .favorite_order
            .borrow()
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| r.is_favorite)
            .collect();

        self.favorites.send_if_modified(|current| {
            if current.as_slice() == next.as_slice() {
                return false;
            }
            *current = Arc::new(next);
            true
        });
    }

    fn toggle_favorite(&self, id: &EntityId) {
        let mut now_favorite = false;
        let known = self.records.modify(id, |record| {
            record.is_favorite = !record.is_favorite;
            now_favorite = record.is_favorite;
        });
        if !known {
            warn!(%id, "toggle_favorite: unknown entity");
            return;
        }
        self.sync_order(id, now_favorite);
        self.publish_favorites();
        debug!(%id, favorite = now_favorite, "favorite toggled");
    }

    /// Move `source` to the position currently held by `target`.
    fn reorder_favorite(&self, source: &EntityId, target: &EntityId) {
        let moved = self.favorite_order.send_if_modified(|order| {
            let from = order.iter().position(|id| id == source);
            let to = order.iter().position(|id| id == target);
            let (Some(from), Some(to)) = (from, to) else {
                return false;
            };
            if from == to {
                return false;
            }
            let id = order.remove(from);
            order.insert(to, id);
            true
        });
        if moved {
            self.publish_favorites();
            debug!(%source, %target, "favorite reordered");
        } else {
            warn!(%source, %target, "reorder_favorite: not both favorites");
        }
    }

    fn refresh(&self) {
        let source = self
            .refresh_source
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        match source {
            Some(source) => self.apply_snapshot(source()),
            None => {
                self.last_refresh.send_replace(Some(Utc::now()));
                debug!("refresh requested with no refresh source");
            }
        }
    }

    /// A gateway still handshaking refuses to disconnect; an offline one
    /// has nothing to disconnect from.
    fn disconnect(&self) -> Result<(), DomainError> {
        let mut result = Err(DomainError::NotConnected);
        self.gateway.send_if_modified(|info| match info.state {
            ConnectionState::Disconnected | ConnectionState::Failed => false,
            ConnectionState::Connecting => {
                result = Err(DomainError::Rejected {
                    message: "connection handshake in progress".into(),
                });
                false
            }
            ConnectionState::Connected | ConnectionState::Reconnecting { .. } => {
                info.state = ConnectionState::Disconnected;
                result = Ok(());
                true
            }
        });
        if result.is_ok() {
            info!(gateway = %self.gateway.borrow().name, "gateway disconnected");
        }
        result
    }
}

// ── DomainService ────────────────────────────────────────────────────

impl DomainService for MemoryDomain {
    fn observe_collection(&self, kind: EntityKind) -> Feed<Snapshot> {
        WatchStream::new(self.inner.records.subscribe())
            .map(move |all| -> Snapshot {
                Arc::new(all.iter().filter(|r| r.kind == kind).cloned().collect())
            })
            .boxed()
    }

    fn observe_favorites(&self) -> Feed<Snapshot> {
        WatchStream::new(self.inner.favorites.subscribe()).boxed()
    }

    fn observe_entity(&self, id: &EntityId) -> Feed<Option<EntityRecord>> {
        let id = id.clone();
        WatchStream::new(self.inner.records.subscribe())
            .map(move |all| all.iter().find(|r| r.id == id).map(|r| (**r).clone()))
            .boxed()
    }

    fn observe_gateway(&self) -> Feed<GatewayInfo> {
        WatchStream::new(self.inner.gateway.subscribe()).boxed()
    }

    fn toggle_favorite(&self, id: EntityId) -> BoxFuture<'static, ()> {
        let inner = Arc::clone(&self.inner);
        let latency = self.latency();
        async move {
            tokio::time::sleep(latency).await;
            inner.toggle_favorite(&id);
        }
        .boxed()
    }

    fn refresh_all(&self) -> BoxFuture<'static, ()> {
        let inner = Arc::clone(&self.inner);
        let latency = self.latency();
        async move {
            tokio::time::sleep(latency).await;
            inner.refresh();
        }
        .boxed()
    }

    fn reorder_favorite(&self, source: EntityId, target: EntityId) -> BoxFuture<'static, ()> {
        let inner = Arc::clone(&self.inner);
        let latency = self.latency();
        async move {
            tokio::time::sleep(latency).await;
            inner.reorder_favorite(&source, &target);
        }
        .boxed()
    }

    fn request_disconnect(&self) -> BoxFuture<'static, Result<(), DomainError>> {
        let inner = Arc::clone(&self.inner);
        let latency = self.latency();
        async move {
            tokio::time::sleep(latency).await;
            inner.disconnect()
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn gateway(state: ConnectionState) -> GatewayInfo {
        GatewayInfo {
            name: "Home".into(),
            host: "10.0.0.2".into(),
            state,
        }
    }

    fn home() -> MemoryDomain {
        MemoryDomain::from_records(
            gateway(ConnectionState::Connected),
            vec![
                EntityRecord::new("lamp", EntityKind::Device, "Lamp").favorite(true),
                EntityRecord::new("fan", EntityKind::Device, "Fan").favorite(true),
                EntityRecord::new("kitchen", EntityKind::Group, "Kitchen"),
                EntityRecord::new("evening", EntityKind::Scene, "Evening").favorite(true),
            ],
        )
    }

    fn favorite_ids(domain: &MemoryDomain) -> Vec<String> {
        domain.favorites().iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn favorites_start_in_collection_order() {
        assert_eq!(favorite_ids(&home()), ["fan", "lamp", "evening"]);
    }

    #[tokio::test]
    async fn collection_feed_filters_by_kind() {
        let domain = home();
        let mut feed = domain.observe_collection(EntityKind::Device);
        let first = feed.next().await.unwrap();
        let names: Vec<_> = first.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, ["Fan", "Lamp"]);
    }

    #[tokio::test]
    async fn entity_feed_reports_absence() {
        let domain = home();
        let mut feed = domain.observe_entity(&"lamp".into());
        assert!(feed.next().await.unwrap().is_some());

        domain.remove(&"lamp".into());
        assert_eq!(feed.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn toggle_adds_and_removes_favorites() {
        let domain = home();
        domain.toggle_favorite("kitchen".into()).await;
        assert_eq!(favorite_ids(&domain), ["fan", "lamp", "evening", "kitchen"]);

        domain.toggle_favorite("lamp".into()).await;
        assert_eq!(favorite_ids(&domain), ["fan", "evening", "kitchen"]);
        assert!(!domain.record(&"lamp".into()).unwrap().is_favorite);
    }

    #[tokio::test]
    async fn reorder_moves_source_to_target_position() {
        let domain = home();
        domain.reorder_favorite("evening".into(), "fan".into()).await;
        assert_eq!(favorite_ids(&domain), ["evening", "fan", "lamp"]);

        domain.reorder_favorite("evening".into(), "lamp".into()).await;
        assert_eq!(favorite_ids(&domain), ["fan", "lamp", "evening"]);
    }

    #[tokio::test]
    async fn reorder_ignores_non_favorites() {
        let domain = home();
        domain.reorder_favorite("kitchen".into(), "fan".into()).await;
        assert_eq!(favorite_ids(&domain), ["fan", "lamp", "evening"]);
    }

    #[tokio::test]
    async fn refresh_preserves_favorites_and_prunes() {
        let domain = home();
        domain.set_refresh_source(Arc::new(|| {
            vec![
                EntityRecord::new("lamp", EntityKind::Device, "Lamp"),
                EntityRecord::new("porch", EntityKind::Device, "Porch"),
            ]
        }));

        domain.refresh_all().await;

        assert!(domain.last_refresh().is_some());
        assert_eq!(domain.records().len(), 2);
        assert!(domain.record(&"lamp".into()).unwrap().is_favorite);
        assert_eq!(favorite_ids(&domain), ["lamp"]);
    }

    #[tokio::test]
    async fn disconnect_fails_when_already_disconnected() {
        let domain = home();
        assert_eq!(domain.request_disconnect().await, Ok(()));
        assert_eq!(domain.gateway().state, ConnectionState::Disconnected);
        assert_eq!(
            domain.request_disconnect().await,
            Err(DomainError::NotConnected)
        );
    }

    #[tokio::test]
    async fn disconnect_is_rejected_mid_handshake() {
        let domain = MemoryDomain::new(gateway(ConnectionState::Connecting));
        let err = domain.request_disconnect().await.unwrap_err();
        assert!(matches!(err, DomainError::Rejected { .. }));
        assert_eq!(domain.gateway().state, ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn attribute_updates_reach_favorites() {
        let domain = home();
        let mut attrs = Map::new();
        attrs.insert("on".into(), Value::Bool(true));
        assert!(domain.update_attributes(&"lamp".into(), attrs));

        let lamp = domain
            .favorites()
            .iter()
            .find(|r| r.id == EntityId::from("lamp"))
            .cloned()
            .unwrap();
        assert_eq!(lamp.flag("on"), Some(true));
    }

    #[test]
    fn json_fixture_errors_are_reported() {
        let err = MemoryDomain::from_json("{ not json").err().unwrap();
        assert!(matches!(err, CoreError::Fixture { .. }));
    }

    #[test]
    fn json_fixture_loads() {
        let domain = MemoryDomain::from_json(
            r#"{
                "gateway": { "name": "Home", "host": "h", "state": { "state": "connected" } },
                "records": [ { "id": "lamp", "kind": "device", "name": "Lamp", "is_favorite": true } ]
            }"#,
        )
        .unwrap();
        assert_eq!(domain.records().len(), 1);
        assert_eq!(favorite_ids(&domain), ["lamp"]);
    }
}
