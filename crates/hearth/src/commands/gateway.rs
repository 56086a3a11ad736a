//! `hearth status` / `hearth disconnect`: the settings surface.

use chrono::{DateTime, Utc};
use serde::Serialize;

use hearth_core::features::{SettingsEvent, SettingsStore};
use hearth_core::model::ConnectionState;
use hearth_core::{EntityKind, GatewayInfo};

use crate::error::CliError;
use crate::output;
use crate::session::Session;

#[derive(Debug, Serialize)]
struct StatusView {
    #[serde(flatten)]
    gateway: GatewayInfo,
    connected: bool,
    devices: usize,
    groups: usize,
    scenes: usize,
    favorites: usize,
    last_refresh: Option<DateTime<Utc>>,
}

impl StatusView {
    fn new(session: &Session, gateway: GatewayInfo) -> Self {
        let records = session.domain.records();
        let count = |kind: EntityKind| records.iter().filter(|r| r.kind == kind).count();
        Self {
            connected: gateway.state.is_connected(),
            devices: count(EntityKind::Device),
            groups: count(EntityKind::Group),
            scenes: count(EntityKind::Scene),
            favorites: session.domain.favorites().len(),
            last_refresh: session.domain.last_refresh(),
            gateway,
        }
    }

    fn render(&self, session: &Session) -> Result<String, CliError> {
        output::render_single(
            session.output,
            self,
            |v| {
                [
                    format!("Gateway:   {}", v.gateway.name),
                    format!("Host:      {}", v.gateway.host),
                    format!("State:     {}", output::paint_state(&v.gateway.state, session.color)),
                    format!("Devices:   {}", v.devices),
                    format!("Groups:    {}", v.groups),
                    format!("Scenes:    {}", v.scenes),
                    format!("Favorites: {}", v.favorites),
                    format!(
                        "Refreshed: {}",
                        v.last_refresh.map_or_else(|| "-".into(), |t| t.to_rfc3339())
                    ),
                ]
                .join("\n")
            },
            |v| v.gateway.state.to_string(),
        )
    }
}

async fn observed(session: &Session) -> Result<SettingsStore, CliError> {
    let mut store = SettingsStore::from_service(&session.service);
    store.send(SettingsEvent::Appeared);
    session
        .settle(&mut store, "gateway status", |s| s.gateway.is_some())
        .await?;
    Ok(store)
}

fn current_gateway(store: &SettingsStore) -> Result<GatewayInfo, CliError> {
    store
        .state()
        .gateway
        .clone()
        .ok_or_else(|| CliError::Gateway {
            message: "gateway status has not been reported".into(),
        })
}

pub async fn status(session: &Session) -> Result<(), CliError> {
    let store = observed(session).await?;
    let view = StatusView::new(session, current_gateway(&store)?);
    session.print(&view.render(session)?);
    Ok(())
}

pub async fn disconnect(session: &Session) -> Result<(), CliError> {
    let mut store = observed(session).await?;

    store.send(SettingsEvent::DisconnectRequested);
    session
        .settle(&mut store, "disconnect", |s| !s.disconnecting)
        .await?;
    if let Some(message) = store.state().error.clone() {
        return Err(CliError::DisconnectFailed { message });
    }

    session
        .settle(&mut store, "disconnected state", |s| {
            s.gateway
                .as_ref()
                .is_some_and(|g| g.state == ConnectionState::Disconnected)
        })
        .await?;
    let gateway = current_gateway(&store)?;
    session.note(&format!("Disconnected from {} ({})", gateway.name, gateway.host));
    session.print(&StatusView::new(session, gateway).render(session)?);
    Ok(())
}
