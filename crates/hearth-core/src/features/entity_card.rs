// ── Entity card ──
//
// Per-entity card showing one record. The worker owns the subject id and
// discards records for any other entity before they reach the store.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::{FutureExt, StreamExt};
use tracing::trace;

use super::OBSERVE;
use crate::domain::{self, CommandFn, DomainService, KeyedFeedFn};
use crate::model::{EntityId, EntityRecord};
use crate::runtime::{EventSink, Reducer, Schedule, Store, Worker, dedup, forward};

#[derive(Debug, Clone, PartialEq)]
pub struct EntityCardState {
    pub id: EntityId,
    pub record: Option<Arc<EntityRecord>>,
}

impl EntityCardState {
    pub fn new(id: EntityId, initial: Option<EntityRecord>) -> Self {
        let record = initial.filter(|r| r.id == id).map(Arc::new);
        Self { id, record }
    }

    pub fn is_favorite(&self) -> bool {
        self.record.as_ref().is_some_and(|r| r.is_favorite)
    }
}

#[derive(Debug)]
pub enum EntityCardEvent {
    Appeared,
    ToggleFavorite,
    RecordUpdated(Option<Arc<EntityRecord>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityCardEffect {
    Observe,
    ToggleFavorite(EntityId),
}

pub struct EntityCardReducer;

impl Reducer for EntityCardReducer {
    const NAME: &'static str = "entity_card";
    type State = EntityCardState;
    type Event = EntityCardEvent;
    type Effect = EntityCardEffect;

    fn reduce(
        state: &EntityCardState,
        event: EntityCardEvent,
    ) -> (EntityCardState, Vec<EntityCardEffect>) {
        match event {
            EntityCardEvent::Appeared => (state.clone(), vec![EntityCardEffect::Observe]),
            EntityCardEvent::ToggleFavorite => (
                state.clone(),
                vec![EntityCardEffect::ToggleFavorite(state.id.clone())],
            ),
            EntityCardEvent::RecordUpdated(record) => (
                EntityCardState {
                    id: state.id.clone(),
                    record,
                },
                Vec::new(),
            ),
        }
    }
}

pub struct EntityCardWorker {
    id: EntityId,
    observe: KeyedFeedFn<Option<EntityRecord>>,
    toggle_favorite: CommandFn<EntityId>,
}

impl EntityCardWorker {
    pub fn new(
        id: EntityId,
        observe: KeyedFeedFn<Option<EntityRecord>>,
        toggle_favorite: CommandFn<EntityId>,
    ) -> Self {
        Self {
            id,
            observe,
            toggle_favorite,
        }
    }

    pub fn from_service(id: EntityId, service: &Arc<dyn DomainService>) -> Self {
        Self::new(
            id,
            domain::entity_feed_fn(service),
            domain::toggle_favorite_fn(service),
        )
    }
}

/// Keep only observations about `id`. `None` means the subject is absent.
pub(crate) fn subject_only(
    id: EntityId,
    observation: Option<EntityRecord>,
) -> future::Ready<Option<Option<EntityRecord>>> {
    future::ready(match observation {
        Some(record) if record.id != id => {
            trace!(subject = %id, other = %record.id, "discarding foreign record");
            None
        }
        other => Some(other),
    })
}

impl Worker for EntityCardWorker {
    type Event = EntityCardEvent;
    type Effect = EntityCardEffect;

    fn schedule(&self, effect: &EntityCardEffect) -> Schedule {
        match effect {
            EntityCardEffect::Observe => Schedule::Subscription(OBSERVE),
            EntityCardEffect::ToggleFavorite(_) => Schedule::Detached,
        }
    }

    fn run(
        self: Arc<Self>,
        effect: EntityCardEffect,
        sink: EventSink<EntityCardEvent>,
    ) -> BoxFuture<'static, ()> {
        async move {
            match effect {
                EntityCardEffect::Observe => {
                    let id = self.id.clone();
                    let feed = (self.observe)(&self.id)
                        .filter_map(move |observation| subject_only(id.clone(), observation));
                    forward(dedup(feed), &sink, |record| {
                        Some(EntityCardEvent::RecordUpdated(record.map(Arc::new)))
                    })
                    .await;
                }
                EntityCardEffect::ToggleFavorite(id) => (self.toggle_favorite)(id).await,
            }
        }
        .boxed()
    }
}

pub type EntityCardStore = Store<EntityCardReducer, EntityCardWorker>;

impl EntityCardStore {
    pub fn for_entity(
        id: EntityId,
        initial: Option<EntityRecord>,
        service: &Arc<dyn DomainService>,
    ) -> Self {
        Store::new(
            EntityCardState::new(id.clone(), initial),
            EntityCardWorker::from_service(id, service),
        )
    }
}
