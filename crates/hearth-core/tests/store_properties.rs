// Behavioural guarantees of the store runtime, exercised through the
// feature stores against the in-memory domain.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt, stream};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use hearth_core::domain::{CommandFn, DomainService, FeedFn, KeyedFeedFn};
use hearth_core::features::collection::CollectionWorker;
use hearth_core::features::descriptor::DescriptorWorker;
use hearth_core::features::{
    CollectionEvent, CollectionState, CollectionStore, DescriptorEvent, DescriptorState,
    FavoritesEvent, FavoritesStore, SettingsEvent, SettingsStore, ThermostatStore,
};
use hearth_core::model::{ConnectionState, ThermostatReading};
use hearth_core::runtime::{Reducer, Store, Worker, dedup};
use hearth_core::{EntityId, EntityKind, EntityRecord, GatewayInfo, MemoryDomain, Snapshot};

// ── Helpers ─────────────────────────────────────────────────────────

fn gateway() -> GatewayInfo {
    GatewayInfo {
        name: "Home".into(),
        host: "10.0.0.2".into(),
        state: ConnectionState::Connected,
    }
}

fn device(id: &str, name: &str) -> EntityRecord {
    EntityRecord::new(id, EntityKind::Device, name)
}

fn attrs(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

async fn settle<R, W>(store: &mut Store<R, W>, done: impl FnMut(&R::State) -> bool)
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    tokio::time::timeout(Duration::from_secs(5), store.wait_for(done))
        .await
        .unwrap();
}

fn noop_command<A: Send + 'static>() -> CommandFn<A> {
    Arc::new(|_| async {}.boxed())
}

// ── Deduplication ───────────────────────────────────────────────────

#[tokio::test]
async fn dedup_compares_against_last_yielded() {
    let out: Vec<u32> = dedup(stream::iter([1, 1, 2, 2, 2, 3, 1])).collect().await;
    assert_eq!(out, vec![1, 2, 3, 1]);
}

// ── Idempotent observation ──────────────────────────────────────────

#[tokio::test]
async fn repeated_appear_calls_factory_once() {
    let domain = MemoryDomain::from_records(gateway(), vec![device("lamp", "Lamp")]);
    let service: Arc<dyn DomainService> = Arc::new(domain);
    let calls = Arc::new(AtomicUsize::new(0));

    let observe: FeedFn<Snapshot> = {
        let service = Arc::clone(&service);
        let calls = Arc::clone(&calls);
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            service.observe_collection(EntityKind::Device)
        })
    };
    let worker = CollectionWorker::new(observe, noop_command(), noop_command());
    let mut store: CollectionStore = Store::new(CollectionState::new(EntityKind::Device), worker);

    store.send(CollectionEvent::Appeared);
    store.send(CollectionEvent::Appeared);
    settle(&mut store, |s| s.loaded).await;
    store.send(CollectionEvent::Appeared);
    tokio::task::yield_now().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(store.is_observing("observe"));
}

#[tokio::test]
async fn finished_feed_restarts_on_next_appear() {
    let calls = Arc::new(AtomicUsize::new(0));
    let observe: FeedFn<Snapshot> = {
        let calls = Arc::clone(&calls);
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let snapshot: Snapshot = Arc::new(vec![Arc::new(device("lamp", "Lamp"))]);
            stream::iter([snapshot]).boxed()
        })
    };
    let worker = CollectionWorker::new(observe, noop_command(), noop_command());
    let mut store: CollectionStore = Store::new(CollectionState::new(EntityKind::Device), worker);

    store.send(CollectionEvent::Appeared);
    settle(&mut store, |s| s.loaded).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while store.is_observing("observe") {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    store.send(CollectionEvent::Appeared);
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ── Cancellation on disposal ────────────────────────────────────────

#[tokio::test]
async fn disposed_store_receives_nothing_further() {
    let domain = MemoryDomain::from_records(gateway(), vec![device("lamp", "Lamp")]);
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let delivered = Arc::new(AtomicUsize::new(0));

    let observe: FeedFn<Snapshot> = {
        let service = Arc::clone(&service);
        let delivered = Arc::clone(&delivered);
        Arc::new(move || {
            let delivered = Arc::clone(&delivered);
            service
                .observe_collection(EntityKind::Device)
                .inspect(move |_| {
                    delivered.fetch_add(1, Ordering::SeqCst);
                })
                .boxed()
        })
    };
    let worker = CollectionWorker::new(observe, noop_command(), noop_command());
    let mut store: CollectionStore = Store::new(CollectionState::new(EntityKind::Device), worker);

    store.send(CollectionEvent::Appeared);
    settle(&mut store, |s| s.loaded).await;
    let before = delivered.load(Ordering::SeqCst);

    // The observation task is now parked awaiting the next snapshot.
    drop(store);
    tokio::task::yield_now().await;

    domain.upsert(device("fan", "Fan"));
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(delivered.load(Ordering::SeqCst), before);
}

// ── Wholesale state replacement ─────────────────────────────────────

#[tokio::test]
async fn updated_collection_replaces_state() {
    let domain = MemoryDomain::from_records(
        gateway(),
        vec![device("a", "Alpha"), device("b", "Bravo")],
    );
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let mut store = CollectionStore::for_kind(EntityKind::Device, &service);

    store.send(CollectionEvent::Appeared);
    settle(&mut store, |s| s.entities.len() == 2).await;

    domain.remove(&"b".into());
    settle(&mut store, |s| s.entities.len() == 1).await;

    let ids: Vec<_> = store.state().entities.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![EntityId::from("a")]);
}

// ── No optimistic mutation ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn toggle_waits_for_feed() {
    let domain = MemoryDomain::from_records(gateway(), vec![device("lamp", "Lamp")]);
    domain.set_latency(Duration::from_millis(250));
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let mut store = FavoritesStore::from_service(&service);

    store.send(FavoritesEvent::Appeared);
    settle(&mut store, |s| s.loaded).await;
    assert!(store.state().favorites.is_empty());

    store.send(FavoritesEvent::ToggleFavorite("lamp".into()));
    assert!(store.state().favorites.is_empty());
    tokio::task::yield_now().await;
    store.drain();
    assert!(store.state().favorites.is_empty(), "no local change before the domain reports");

    settle(&mut store, |s| s.favorites.len() == 1).await;
    assert!(domain.record(&"lamp".into()).unwrap().is_favorite);
}

#[tokio::test(start_paused = true)]
async fn commands_outlive_their_store() {
    let domain = MemoryDomain::from_records(gateway(), vec![device("lamp", "Lamp")]);
    domain.set_latency(Duration::from_millis(100));
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let mut store = FavoritesStore::from_service(&service);

    store.send(FavoritesEvent::ToggleFavorite("lamp".into()));
    drop(store);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(domain.record(&"lamp".into()).unwrap().is_favorite);
}

#[tokio::test(start_paused = true)]
async fn disconnect_outlives_its_store() {
    let domain = MemoryDomain::new(gateway());
    domain.set_latency(Duration::from_millis(100));
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let mut store = SettingsStore::from_service(&service);

    store.send(SettingsEvent::DisconnectRequested);
    assert!(store.state().disconnecting);
    drop(store);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(domain.gateway().state, ConnectionState::Disconnected);
}

// ── Per-entity filtering ────────────────────────────────────────────

fn reading(id: &str, temperature: f64) -> Option<EntityRecord> {
    Some(device(id, id).with_attribute("temperature", temperature))
}

#[tokio::test]
async fn descriptor_store_ignores_other_entities() {
    let (tx, rx) = mpsc::unbounded_channel();
    let rx = std::sync::Mutex::new(Some(rx));
    let broadcast: KeyedFeedFn<Option<EntityRecord>> = Arc::new(move |_: &EntityId| {
        let rx = rx.lock().unwrap().take().unwrap();
        UnboundedReceiverStream::new(rx).boxed()
    });

    let worker = DescriptorWorker::<ThermostatReading>::new("x".into(), broadcast);
    let mut store: ThermostatStore = Store::new(DescriptorState::new("x".into(), None), worker);
    store.send(DescriptorEvent::Appeared);

    for record in [
        reading("x", 20.0),
        reading("y", 30.0),
        reading("y", 31.0),
        reading("x", 21.0),
        reading("y", 32.0),
    ] {
        tx.send(record).unwrap();
    }

    let mut seen = Vec::new();
    while seen.last() != Some(&21.0) {
        tokio::time::timeout(Duration::from_secs(5), store.next())
            .await
            .unwrap();
        seen.push(store.state().descriptor.as_ref().unwrap().temperature);
    }
    assert_eq!(seen, vec![20.0, 21.0]);

    tokio::task::yield_now().await;
    assert_eq!(store.drain(), 0);
    assert_eq!(store.state().descriptor.as_ref().unwrap().temperature, 21.0);
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test]
async fn thermostat_follows_its_record() {
    let initial = EntityRecord::new("therm-1", EntityKind::Device, "Hallway thermostat")
        .with_attribute("temperature", 21.5)
        .with_attribute("unit", "°C");
    let domain = MemoryDomain::from_records(gateway(), vec![initial.clone()]);
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());

    let id = EntityId::from("therm-1");
    let mut store = ThermostatStore::for_entity(id.clone(), Some(&initial), &service);
    let first = store.state().descriptor.clone().unwrap();
    assert_eq!(first.temperature, 21.5);
    assert_eq!(first.unit, "°C");

    store.send(DescriptorEvent::Appeared);
    domain.update_attributes(&id, attrs(&[("temperature", Value::from(22.0))]));
    settle(&mut store, |s| {
        s.descriptor.as_ref().is_some_and(|d| (d.temperature - 22.0).abs() < f64::EPSILON)
    })
    .await;

    domain.remove(&id);
    settle(&mut store, |s| s.descriptor.is_none()).await;
}

// ── Hosted store ────────────────────────────────────────────────────

#[tokio::test]
async fn hosted_favorites_follow_domain() {
    let domain = MemoryDomain::from_records(
        gateway(),
        vec![device("a", "Alpha").favorite(true), device("b", "Bravo").favorite(true)],
    );
    let service: Arc<dyn DomainService> = Arc::new(domain.clone());
    let mut handle = FavoritesStore::from_service(&service).spawn();

    handle.send(FavoritesEvent::Appeared).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle.wait_for(|s| s.favorites.len() == 2))
        .await
        .unwrap()
        .unwrap();

    handle
        .send(FavoritesEvent::Reorder {
            source: "b".into(),
            target: "a".into(),
        })
        .unwrap();
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        handle.wait_for(|s| s.position(&"b".into()) == Some(0)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(state.favorites.len(), 2);

    handle.shutdown().await;
}
