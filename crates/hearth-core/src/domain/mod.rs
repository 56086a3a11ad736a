// ── Backing domain collaborator ──
//
// The runtime only ever sees the domain layer as observation-feed
// factories and command functions. `DomainService` bundles them for
// composition; workers capture just the functions they need.

pub mod memory;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;

use crate::error::DomainError;
use crate::model::{EntityId, EntityKind, EntityRecord, GatewayInfo, Snapshot};

pub use memory::{Fixture, MemoryDomain, RefreshSource};

/// A live, single-consumer feed of the latest known values.
pub type Feed<T> = BoxStream<'static, T>;

/// Zero-argument observation-feed factory.
pub type FeedFn<T> = Arc<dyn Fn() -> Feed<T> + Send + Sync>;

/// Observation-feed factory keyed by entity id.
pub type KeyedFeedFn<T> = Arc<dyn Fn(&EntityId) -> Feed<T> + Send + Sync>;

/// Fire-and-forget command taking one argument.
pub type CommandFn<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

/// Command whose failure is reported back to the caller.
pub type FallibleCommandFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), DomainError>> + Send + Sync>;

/// Everything the stores need from the backing domain layer.
pub trait DomainService: Send + Sync + 'static {
    /// All records of one family, in the service's stable order.
    fn observe_collection(&self, kind: EntityKind) -> Feed<Snapshot>;

    /// Favorited records across families, in user-defined order.
    fn observe_favorites(&self) -> Feed<Snapshot>;

    /// The latest record for `id`; `None` while it does not exist.
    /// Implementations may broadcast records for other ids too.
    fn observe_entity(&self, id: &EntityId) -> Feed<Option<EntityRecord>>;

    fn observe_gateway(&self) -> Feed<GatewayInfo>;

    fn toggle_favorite(&self, id: EntityId) -> BoxFuture<'static, ()>;

    fn refresh_all(&self) -> BoxFuture<'static, ()>;

    fn reorder_favorite(&self, source: EntityId, target: EntityId) -> BoxFuture<'static, ()>;

    fn request_disconnect(&self) -> BoxFuture<'static, Result<(), DomainError>>;
}

// ── Binding helpers ──────────────────────────────────────────────────

pub(crate) fn collection_feed_fn(service: &Arc<dyn DomainService>, kind: EntityKind) -> FeedFn<Snapshot> {
    let service = Arc::clone(service);
    Arc::new(move || service.observe_collection(kind))
}

pub(crate) fn favorites_feed_fn(service: &Arc<dyn DomainService>) -> FeedFn<Snapshot> {
    let service = Arc::clone(service);
    Arc::new(move || service.observe_favorites())
}

pub(crate) fn entity_feed_fn(service: &Arc<dyn DomainService>) -> KeyedFeedFn<Option<EntityRecord>> {
    let service = Arc::clone(service);
    Arc::new(move |id: &EntityId| service.observe_entity(id))
}

pub(crate) fn gateway_feed_fn(service: &Arc<dyn DomainService>) -> FeedFn<GatewayInfo> {
    let service = Arc::clone(service);
    Arc::new(move || service.observe_gateway())
}

pub(crate) fn toggle_favorite_fn(service: &Arc<dyn DomainService>) -> CommandFn<EntityId> {
    let service = Arc::clone(service);
    Arc::new(move |id| service.toggle_favorite(id))
}

pub(crate) fn refresh_all_fn(service: &Arc<dyn DomainService>) -> CommandFn<()> {
    let service = Arc::clone(service);
    Arc::new(move |()| service.refresh_all())
}

pub(crate) fn reorder_favorite_fn(service: &Arc<dyn DomainService>) -> CommandFn<(EntityId, EntityId)> {
    let service = Arc::clone(service);
    Arc::new(move |(source, target)| service.reorder_favorite(source, target))
}

pub(crate) fn disconnect_fn(service: &Arc<dyn DomainService>) -> FallibleCommandFn {
    let service = Arc::clone(service);
    Arc::new(move || service.request_disconnect())
}
