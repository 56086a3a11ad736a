// ── Dashboard favorites ──
//
// Favorited records across every family, in the order the user arranged
// them. Reordering and toggling are requests to the domain; the list only
// changes when the favorites feed says so.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::OBSERVE;
use crate::domain::{self, CommandFn, DomainService, FeedFn};
use crate::model::{EntityId, Snapshot};
use crate::runtime::{EventSink, Reducer, Schedule, Store, Worker, dedup, forward};

#[derive(Debug, Clone, PartialEq)]
pub struct FavoritesState {
    pub favorites: Snapshot,
    pub loaded: bool,
}

impl Default for FavoritesState {
    fn default() -> Self {
        Self {
            favorites: Arc::new(Vec::new()),
            loaded: false,
        }
    }
}

impl FavoritesState {
    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.favorites.iter().position(|r| &r.id == id)
    }
}

#[derive(Debug)]
pub enum FavoritesEvent {
    Appeared,
    RefreshRequested,
    ToggleFavorite(EntityId),
    Reorder { source: EntityId, target: EntityId },
    Updated(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesEffect {
    Observe,
    RefreshAll,
    ToggleFavorite(EntityId),
    Reorder { source: EntityId, target: EntityId },
}

pub struct FavoritesReducer;

impl Reducer for FavoritesReducer {
    const NAME: &'static str = "favorites";
    type State = FavoritesState;
    type Event = FavoritesEvent;
    type Effect = FavoritesEffect;

    fn reduce(
        state: &FavoritesState,
        event: FavoritesEvent,
    ) -> (FavoritesState, Vec<FavoritesEffect>) {
        let effects = match event {
            FavoritesEvent::Appeared => vec![FavoritesEffect::Observe],
            FavoritesEvent::RefreshRequested => vec![FavoritesEffect::RefreshAll],
            FavoritesEvent::ToggleFavorite(id) => vec![FavoritesEffect::ToggleFavorite(id)],
            // Dropping an item onto itself is not a move.
            FavoritesEvent::Reorder { source, target } if source == target => Vec::new(),
            FavoritesEvent::Reorder { source, target } => {
                vec![FavoritesEffect::Reorder { source, target }]
            }
            FavoritesEvent::Updated(favorites) => {
                let next = FavoritesState {
                    favorites,
                    loaded: true,
                };
                return (next, Vec::new());
            }
        };
        (state.clone(), effects)
    }
}

pub struct FavoritesWorker {
    observe: FeedFn<Snapshot>,
    toggle_favorite: CommandFn<EntityId>,
    refresh_all: CommandFn<()>,
    reorder_favorite: CommandFn<(EntityId, EntityId)>,
}

impl FavoritesWorker {
    pub fn new(
        observe: FeedFn<Snapshot>,
        toggle_favorite: CommandFn<EntityId>,
        refresh_all: CommandFn<()>,
        reorder_favorite: CommandFn<(EntityId, EntityId)>,
    ) -> Self {
        Self {
            observe,
            toggle_favorite,
            refresh_all,
            reorder_favorite,
        }
    }

    pub fn from_service(service: &Arc<dyn DomainService>) -> Self {
        Self::new(
            domain::favorites_feed_fn(service),
            domain::toggle_favorite_fn(service),
            domain::refresh_all_fn(service),
            domain::reorder_favorite_fn(service),
        )
    }
}

impl Worker for FavoritesWorker {
    type Event = FavoritesEvent;
    type Effect = FavoritesEffect;

    fn schedule(&self, effect: &FavoritesEffect) -> Schedule {
        match effect {
            FavoritesEffect::Observe => Schedule::Subscription(OBSERVE),
            _ => Schedule::Detached,
        }
    }

    fn run(
        self: Arc<Self>,
        effect: FavoritesEffect,
        sink: EventSink<FavoritesEvent>,
    ) -> BoxFuture<'static, ()> {
        async move {
            match effect {
                FavoritesEffect::Observe => {
                    let feed = dedup((self.observe)());
                    forward(feed, &sink, |favorites| Some(FavoritesEvent::Updated(favorites)))
                        .await;
                }
                FavoritesEffect::RefreshAll => (self.refresh_all)(()).await,
                FavoritesEffect::ToggleFavorite(id) => {
                    debug!(%id, "toggle favorite");
                    (self.toggle_favorite)(id).await;
                }
                FavoritesEffect::Reorder { source, target } => {
                    debug!(%source, %target, "reorder favorite");
                    (self.reorder_favorite)((source, target)).await;
                }
            }
        }
        .boxed()
    }
}

pub type FavoritesStore = Store<FavoritesReducer, FavoritesWorker>;

impl FavoritesStore {
    pub fn from_service(service: &Arc<dyn DomainService>) -> Self {
        Store::new(FavoritesState::default(), FavoritesWorker::from_service(service))
    }
}
