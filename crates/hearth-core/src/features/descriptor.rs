// ── Descriptor stores ──
//
// One generic store per (entity, descriptor type). The descriptor is
// rederived from every observed record of the subject, and only a changed
// descriptor reaches the store.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};

use super::OBSERVE;
use super::entity_card::subject_only;
use crate::domain::{self, DomainService, KeyedFeedFn};
use crate::model::{
    ClimateReading, Descriptor, EnergyReading, EntityId, EntityRecord, LightLevel, SmokeStatus,
    ThermostatReading,
};
use crate::runtime::{EventSink, Reducer, Schedule, Store, Worker, dedup, forward};

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorState<D> {
    pub id: EntityId,
    pub descriptor: Option<D>,
}

impl<D: Descriptor> DescriptorState<D> {
    /// Derive the starting value from the record already on screen, if any.
    pub fn new(id: EntityId, initial: Option<&EntityRecord>) -> Self {
        let descriptor = initial
            .filter(|record| record.id == id)
            .and_then(D::from_record);
        Self { id, descriptor }
    }
}

#[derive(Debug)]
pub enum DescriptorEvent<D> {
    Appeared,
    DescriptorChanged(Option<D>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorEffect {
    Observe,
}

pub struct DescriptorReducer<D>(PhantomData<fn() -> D>);

impl<D: Descriptor> Reducer for DescriptorReducer<D> {
    const NAME: &'static str = D::KIND;
    type State = DescriptorState<D>;
    type Event = DescriptorEvent<D>;
    type Effect = DescriptorEffect;

    fn reduce(
        state: &DescriptorState<D>,
        event: DescriptorEvent<D>,
    ) -> (DescriptorState<D>, Vec<DescriptorEffect>) {
        match event {
            DescriptorEvent::Appeared => (state.clone(), vec![DescriptorEffect::Observe]),
            DescriptorEvent::DescriptorChanged(descriptor) => (
                DescriptorState {
                    id: state.id.clone(),
                    descriptor,
                },
                Vec::new(),
            ),
        }
    }
}

pub struct DescriptorWorker<D> {
    id: EntityId,
    observe: KeyedFeedFn<Option<EntityRecord>>,
    _descriptor: PhantomData<fn() -> D>,
}

impl<D> fmt::Debug for DescriptorWorker<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorWorker")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<D: Descriptor> DescriptorWorker<D> {
    pub fn new(id: EntityId, observe: KeyedFeedFn<Option<EntityRecord>>) -> Self {
        Self {
            id,
            observe,
            _descriptor: PhantomData,
        }
    }

    pub fn from_service(id: EntityId, service: &Arc<dyn DomainService>) -> Self {
        Self::new(id, domain::entity_feed_fn(service))
    }
}

impl<D: Descriptor> Worker for DescriptorWorker<D> {
    type Event = DescriptorEvent<D>;
    type Effect = DescriptorEffect;

    fn schedule(&self, _: &DescriptorEffect) -> Schedule {
        Schedule::Subscription(OBSERVE)
    }

    fn run(
        self: Arc<Self>,
        effect: DescriptorEffect,
        sink: EventSink<DescriptorEvent<D>>,
    ) -> BoxFuture<'static, ()> {
        async move {
            let DescriptorEffect::Observe = effect;
            let id = self.id.clone();
            let derived = (self.observe)(&self.id)
                .filter_map(move |observation| subject_only(id.clone(), observation))
                .map(|record| record.as_ref().and_then(D::from_record));
            forward(dedup(derived), &sink, |descriptor| {
                Some(DescriptorEvent::DescriptorChanged(descriptor))
            })
            .await;
        }
        .boxed()
    }
}

pub type DescriptorStore<D> = Store<DescriptorReducer<D>, DescriptorWorker<D>>;

pub type ThermostatStore = DescriptorStore<ThermostatReading>;
pub type ClimateStore = DescriptorStore<ClimateReading>;
pub type LightLevelStore = DescriptorStore<LightLevel>;
pub type SmokeStore = DescriptorStore<SmokeStatus>;
pub type EnergyStore = DescriptorStore<EnergyReading>;

impl<D: Descriptor> DescriptorStore<D> {
    pub fn for_entity(
        id: EntityId,
        initial: Option<&EntityRecord>,
        service: &Arc<dyn DomainService>,
    ) -> Self {
        Store::new(
            DescriptorState::new(id.clone(), initial),
            DescriptorWorker::from_service(id, service),
        )
    }
}
