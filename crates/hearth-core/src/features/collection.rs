// ── Entity collection list ──
//
// One store per entity family (devices, groups, scenes). The visible list
// is only ever replaced by what the collection feed publishes.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

use super::OBSERVE;
use crate::domain::{self, CommandFn, DomainService, FeedFn};
use crate::model::{EntityId, EntityKind, Snapshot};
use crate::runtime::{EventSink, Reducer, Schedule, Store, Worker, dedup, forward};

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState {
    pub kind: EntityKind,
    pub entities: Snapshot,
    /// Whether the feed has delivered at least one snapshot.
    pub loaded: bool,
}

impl CollectionState {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: Arc::new(Vec::new()),
            loaded: false,
        }
    }
}

#[derive(Debug)]
pub enum CollectionEvent {
    Appeared,
    RefreshRequested,
    ToggleFavorite(EntityId),
    Updated(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEffect {
    Observe,
    RefreshAll,
    ToggleFavorite(EntityId),
}

pub struct CollectionReducer;

impl Reducer for CollectionReducer {
    const NAME: &'static str = "collection";
    type State = CollectionState;
    type Event = CollectionEvent;
    type Effect = CollectionEffect;

    fn reduce(
        state: &CollectionState,
        event: CollectionEvent,
    ) -> (CollectionState, Vec<CollectionEffect>) {
        match event {
            CollectionEvent::Appeared => (state.clone(), vec![CollectionEffect::Observe]),
            CollectionEvent::RefreshRequested => {
                (state.clone(), vec![CollectionEffect::RefreshAll])
            }
            CollectionEvent::ToggleFavorite(id) => {
                (state.clone(), vec![CollectionEffect::ToggleFavorite(id)])
            }
            CollectionEvent::Updated(entities) => (
                CollectionState {
                    kind: state.kind,
                    entities,
                    loaded: true,
                },
                Vec::new(),
            ),
        }
    }
}

pub struct CollectionWorker {
    observe: FeedFn<Snapshot>,
    toggle_favorite: CommandFn<EntityId>,
    refresh_all: CommandFn<()>,
}

impl CollectionWorker {
    pub fn new(
        observe: FeedFn<Snapshot>,
        toggle_favorite: CommandFn<EntityId>,
        refresh_all: CommandFn<()>,
    ) -> Self {
        Self {
            observe,
            toggle_favorite,
            refresh_all,
        }
    }

    pub fn from_service(service: &Arc<dyn DomainService>, kind: EntityKind) -> Self {
        Self::new(
            domain::collection_feed_fn(service, kind),
            domain::toggle_favorite_fn(service),
            domain::refresh_all_fn(service),
        )
    }
}

impl Worker for CollectionWorker {
    type Event = CollectionEvent;
    type Effect = CollectionEffect;

    fn schedule(&self, effect: &CollectionEffect) -> Schedule {
        match effect {
            CollectionEffect::Observe => Schedule::Subscription(OBSERVE),
            CollectionEffect::RefreshAll | CollectionEffect::ToggleFavorite(_) => {
                Schedule::Detached
            }
        }
    }

    fn run(
        self: Arc<Self>,
        effect: CollectionEffect,
        sink: EventSink<CollectionEvent>,
    ) -> BoxFuture<'static, ()> {
        async move {
            match effect {
                CollectionEffect::Observe => {
                    let feed = dedup((self.observe)());
                    forward(feed, &sink, |entities| {
                        Some(CollectionEvent::Updated(entities))
                    })
                    .await;
                }
                CollectionEffect::RefreshAll => {
                    debug!("refresh all requested");
                    (self.refresh_all)(()).await;
                }
                CollectionEffect::ToggleFavorite(id) => {
                    debug!(%id, "toggle favorite");
                    (self.toggle_favorite)(id).await;
                }
            }
        }
        .boxed()
    }
}

pub type CollectionStore = Store<CollectionReducer, CollectionWorker>;

impl CollectionStore {
    /// List store for one entity family, bound to `service`.
    pub fn for_kind(kind: EntityKind, service: &Arc<dyn DomainService>) -> Self {
        Store::new(
            CollectionState::new(kind),
            CollectionWorker::from_service(service, kind),
        )
    }
}
