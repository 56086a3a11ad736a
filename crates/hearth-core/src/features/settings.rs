// ── Settings: gateway status and disconnect flow ──

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{info, warn};

use super::OBSERVE;
use crate::domain::{self, DomainService, FallibleCommandFn, FeedFn};
use crate::error::DomainError;
use crate::model::GatewayInfo;
use crate::runtime::{EventSink, Reducer, Schedule, Store, Worker, dedup, forward};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsState {
    pub gateway: Option<GatewayInfo>,
    pub disconnecting: bool,
    /// User-visible message from the last failed disconnect.
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum SettingsEvent {
    Appeared,
    DisconnectRequested,
    DisconnectFinished(Result<(), DomainError>),
    GatewayUpdated(GatewayInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEffect {
    Observe,
    Disconnect,
}

pub struct SettingsReducer;

impl Reducer for SettingsReducer {
    const NAME: &'static str = "settings";
    type State = SettingsState;
    type Event = SettingsEvent;
    type Effect = SettingsEffect;

    fn reduce(state: &SettingsState, event: SettingsEvent) -> (SettingsState, Vec<SettingsEffect>) {
        match event {
            SettingsEvent::Appeared => (state.clone(), vec![SettingsEffect::Observe]),
            SettingsEvent::DisconnectRequested if state.disconnecting => {
                (state.clone(), Vec::new())
            }
            SettingsEvent::DisconnectRequested => (
                SettingsState {
                    disconnecting: true,
                    error: None,
                    ..state.clone()
                },
                vec![SettingsEffect::Disconnect],
            ),
            SettingsEvent::DisconnectFinished(result) => (
                SettingsState {
                    disconnecting: false,
                    error: result.err().map(|e| e.to_string()),
                    ..state.clone()
                },
                Vec::new(),
            ),
            SettingsEvent::GatewayUpdated(gateway) => (
                SettingsState {
                    gateway: Some(gateway),
                    ..state.clone()
                },
                Vec::new(),
            ),
        }
    }
}

pub struct SettingsWorker {
    observe: FeedFn<GatewayInfo>,
    disconnect: FallibleCommandFn,
}

impl SettingsWorker {
    pub fn new(observe: FeedFn<GatewayInfo>, disconnect: FallibleCommandFn) -> Self {
        Self {
            observe,
            disconnect,
        }
    }

    pub fn from_service(service: &Arc<dyn DomainService>) -> Self {
        Self::new(domain::gateway_feed_fn(service), domain::disconnect_fn(service))
    }
}

impl Worker for SettingsWorker {
    type Event = SettingsEvent;
    type Effect = SettingsEffect;

    fn schedule(&self, effect: &SettingsEffect) -> Schedule {
        match effect {
            SettingsEffect::Observe => Schedule::Subscription(OBSERVE),
            SettingsEffect::Disconnect => Schedule::Detached,
        }
    }

    fn run(
        self: Arc<Self>,
        effect: SettingsEffect,
        sink: EventSink<SettingsEvent>,
    ) -> BoxFuture<'static, ()> {
        async move {
            match effect {
                SettingsEffect::Observe => {
                    let feed = dedup((self.observe)());
                    forward(feed, &sink, |gateway| Some(SettingsEvent::GatewayUpdated(gateway)))
                        .await;
                }
                SettingsEffect::Disconnect => {
                    let result = (self.disconnect)().await;
                    match &result {
                        Ok(()) => info!("disconnect completed"),
                        Err(e) => warn!(error = %e, "disconnect failed"),
                    }
                    sink.send(SettingsEvent::DisconnectFinished(result));
                }
            }
        }
        .boxed()
    }
}

pub type SettingsStore = Store<SettingsReducer, SettingsWorker>;

impl SettingsStore {
    pub fn from_service(service: &Arc<dyn DomainService>) -> Self {
        Store::new(SettingsState::default(), SettingsWorker::from_service(service))
    }
}
