//! `hearth watch`: a hosted store printed on every published change.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::info;

use hearth_core::features::{
    CollectionEvent, CollectionState, CollectionStore, DescriptorEvent, DescriptorState,
    DescriptorStore, FavoritesEvent, FavoritesState, FavoritesStore,
};
use hearth_core::model::{
    ClimateReading, Descriptor, EnergyReading, LightLevel, SmokeStatus, ThermostatReading,
};
use hearth_core::{EntityKind, EntityRecord, Reducer, StoreHandle};

use super::entities;
use super::sensor::SensorView;
use crate::cli::{OutputFormat, SensorKind, WatchArgs, WatchTarget};
use crate::error::CliError;
use crate::output;
use crate::session::Session;
use crate::simulate::Simulator;

pub async fn handle(session: &Session, args: WatchArgs) -> Result<(), CliError> {
    let follow = Follow {
        session,
        remaining: args.count,
        simulator: args.simulate.then(|| Simulator::new(session.domain.clone())),
    };

    match args.target {
        WatchTarget::Devices => collection(follow, EntityKind::Device).await,
        WatchTarget::Groups => collection(follow, EntityKind::Group).await,
        WatchTarget::Scenes => collection(follow, EntityKind::Scene).await,
        WatchTarget::Favorites => favorites(follow).await,
        WatchTarget::Sensor => {
            let (Some(id), Some(kind)) = (args.id.as_deref(), args.kind) else {
                return Err(CliError::Validation {
                    field: "watch sensor".into(),
                    reason: "--id and --kind are required".into(),
                });
            };
            let record = session.require_record(id)?;
            match kind {
                SensorKind::Thermostat => sensor::<ThermostatReading>(follow, record, kind).await,
                SensorKind::Climate => sensor::<ClimateReading>(follow, record, kind).await,
                SensorKind::Light => sensor::<LightLevel>(follow, record, kind).await,
                SensorKind::Smoke => sensor::<SmokeStatus>(follow, record, kind).await,
                SensorKind::Energy => sensor::<EnergyReading>(follow, record, kind).await,
            }
        }
    }
}

// ── Per-target wiring ───────────────────────────────────────────────

async fn collection(follow: Follow<'_>, kind: EntityKind) -> Result<(), CliError> {
    let session = follow.session;
    let handle = CollectionStore::for_kind(kind, &session.service).spawn();
    handle.send(CollectionEvent::Appeared)?;

    let label = format!("{kind}s");
    follow
        .run(handle, |s: &CollectionState| {
            if !s.loaded {
                return Ok(None);
            }
            let title = format!("{label} ({})", s.entities.len());
            Ok(Some(frame(session, &title, entities::render(session, &s.entities)?)))
        })
        .await
}

async fn favorites(follow: Follow<'_>) -> Result<(), CliError> {
    let session = follow.session;
    let handle = FavoritesStore::from_service(&session.service).spawn();
    handle.send(FavoritesEvent::Appeared)?;

    follow
        .run(handle, |s: &FavoritesState| {
            if !s.loaded {
                return Ok(None);
            }
            let title = format!("favorites ({})", s.favorites.len());
            Ok(Some(frame(session, &title, entities::render(session, &s.favorites)?)))
        })
        .await
}

async fn sensor<D>(
    follow: Follow<'_>,
    record: EntityRecord,
    kind: SensorKind,
) -> Result<(), CliError>
where
    D: Descriptor + Serialize,
{
    let session = follow.session;
    let store =
        DescriptorStore::<D>::for_entity(record.id.clone(), Some(&record), &session.service);
    let handle = store.spawn();
    handle.send(DescriptorEvent::Appeared)?;

    follow
        .run(handle, |s: &DescriptorState<D>| {
            let reading = s
                .descriptor
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?
                .unwrap_or(Value::Null);
            let body = SensorView::new(&record, kind, reading).render(session)?;
            Ok(Some(frame(session, &record.id.to_string(), body)))
        })
        .await
}

/// Table output gets a timestamped header per change; structured formats
/// stay one document per change.
fn frame(session: &Session, title: &str, body: String) -> String {
    if session.output != OutputFormat::Table {
        return body;
    }
    let stamp = chrono::Local::now().format("%H:%M:%S");
    let header = output::heading(&format!("── {stamp} {title} ──"), session.color);
    format!("{header}\n{body}")
}

// ── Follow loop ─────────────────────────────────────────────────────

struct Follow<'a> {
    session: &'a Session,
    remaining: Option<u32>,
    simulator: Option<Simulator>,
}

impl Follow<'_> {
    async fn run<R: Reducer>(
        mut self,
        mut handle: StoreHandle<R>,
        render: impl Fn(&R::State) -> Result<Option<String>, CliError>,
    ) -> Result<(), CliError> {
        let result = self.pump(&mut handle, render).await;
        handle.shutdown().await;
        result
    }

    async fn pump<R: Reducer>(
        &mut self,
        handle: &mut StoreHandle<R>,
        render: impl Fn(&R::State) -> Result<Option<String>, CliError>,
    ) -> Result<(), CliError> {
        if self.emit(render(handle.state().as_ref())?) {
            return Ok(());
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut ticker = match self.simulator {
            Some(_) => Some(simulation_ticker(self.session.simulate_interval).await),
            None => None,
        };

        loop {
            tokio::select! {
                biased;
                _ = &mut ctrl_c => {
                    info!("interrupted");
                    return Ok(());
                }
                changed = handle.changed() => {
                    let state = changed?;
                    if self.emit(render(state.as_ref())?) {
                        return Ok(());
                    }
                }
                () = next_tick(ticker.as_mut()) => {
                    if let Some(simulator) = self.simulator.as_mut() {
                        simulator.step();
                    }
                }
            }
        }
    }

    /// Print one rendered state. Returns true once `--count` is spent.
    fn emit(&mut self, rendered: Option<String>) -> bool {
        let Some(text) = rendered else {
            return false;
        };
        self.session.print(&text);
        match self.remaining.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left == 0
            }
            None => false,
        }
    }
}

/// Interval driving `--simulate`, with its immediate first tick consumed.
async fn simulation_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    ticker
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
