//! `hearth sensor`: one typed reading derived through a descriptor store.

use serde::Serialize;
use serde_json::Value;

use hearth_core::features::{DescriptorEvent, DescriptorStore};
use hearth_core::model::{
    ClimateReading, Descriptor, EnergyReading, LightLevel, SmokeStatus, ThermostatReading,
};
use hearth_core::{EntityId, EntityRecord};

use crate::cli::{SensorArgs, SensorKind};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

/// What a sensor command prints: the entity plus its derived reading.
#[derive(Debug, Serialize)]
pub struct SensorView<'a> {
    pub id: &'a EntityId,
    pub name: &'a str,
    pub kind: &'static str,
    pub reading: Value,
}

impl<'a> SensorView<'a> {
    pub fn new(record: &'a EntityRecord, kind: SensorKind, reading: Value) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            kind: kind.label(),
            reading,
        }
    }

    pub fn render(&self, session: &Session) -> Result<String, CliError> {
        output::render_single(
            session.output,
            self,
            |v| {
                let title = format!("{} ({})", v.name, v.kind);
                let heading = output::heading(&title, session.color);
                format!("{heading}\n{}", output::key_values(&v.reading))
            },
            |v| output::key_value_line(&v.reading),
        )
    }
}

pub async fn handle(session: &Session, args: SensorArgs) -> Result<(), CliError> {
    let record = session.require_record(&args.id)?;
    let reading = match args.kind {
        SensorKind::Thermostat => read::<ThermostatReading>(session, &record).await?,
        SensorKind::Climate => read::<ClimateReading>(session, &record).await?,
        SensorKind::Light => read::<LightLevel>(session, &record).await?,
        SensorKind::Smoke => read::<SmokeStatus>(session, &record).await?,
        SensorKind::Energy => read::<EnergyReading>(session, &record).await?,
    };
    let reading = reading.ok_or_else(|| CliError::NoReading {
        id: record.id.to_string(),
        kind: args.kind.label().into(),
    })?;

    session.print(&SensorView::new(&record, args.kind, reading).render(session)?);
    Ok(())
}

/// Start the descriptor store and apply its first observation.
async fn read<D>(session: &Session, record: &EntityRecord) -> Result<Option<Value>, CliError>
where
    D: Descriptor + Serialize,
{
    let mut store =
        DescriptorStore::<D>::for_entity(record.id.clone(), Some(record), &session.service);
    store.send(DescriptorEvent::Appeared);
    session.next(&mut store, D::KIND).await?;
    Ok(store
        .state()
        .descriptor
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?)
}
