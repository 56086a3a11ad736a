// Synthetic attribute changes for `watch --simulate`. Each step nudges the
// next record (round robin) that carries a numeric reading or an on/off
// flag, so watched stores see a steady trickle of real domain updates.

use std::iter::{Copied, Cycle};
use std::slice;

use serde_json::{Map, Value};
use tracing::debug;

use hearth_core::{EntityId, EntityRecord, MemoryDomain};

const NUMERIC_KEYS: [&str; 5] = ["temperature", "humidity", "lightlevel", "power", "consumption"];
const DELTAS: [f64; 4] = [0.5, 0.5, -0.5, -0.5];

pub struct Simulator {
    domain: MemoryDomain,
    cursor: usize,
    deltas: Cycle<Copied<slice::Iter<'static, f64>>>,
}

impl Simulator {
    pub fn new(domain: MemoryDomain) -> Self {
        Self {
            domain,
            cursor: 0,
            deltas: DELTAS.iter().copied().cycle(),
        }
    }

    /// Change one record. Returns its id, or `None` when no record has
    /// anything to change.
    pub fn step(&mut self) -> Option<EntityId> {
        let records = self.domain.records();
        let len = records.len();
        for offset in 0..len {
            let index = (self.cursor + offset) % len;
            let Some(record) = records.get(index) else {
                continue;
            };
            if let Some(change) = self.change_for(record) {
                self.cursor = (index + 1) % len;
                debug!(id = %record.id, keys = ?change.keys().collect::<Vec<_>>(), "simulated change");
                self.domain.update_attributes(&record.id, change);
                return Some(record.id.clone());
            }
        }
        None
    }

    fn change_for(&mut self, record: &EntityRecord) -> Option<Map<String, Value>> {
        let mut change = Map::new();
        for key in NUMERIC_KEYS {
            if let Some(current) = record.number(key) {
                let delta = self.deltas.next().unwrap_or_default();
                change.insert(key.to_owned(), Value::from(round_tenth(current + delta)));
            }
        }
        if let Some(on) = record.flag("on") {
            change.insert("on".to_owned(), Value::Bool(!on));
        }
        (!change.is_empty()).then_some(change)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_core::model::ConnectionState;
    use hearth_core::{EntityKind, GatewayInfo};
    use pretty_assertions::assert_eq;

    use super::*;

    fn domain(records: Vec<EntityRecord>) -> MemoryDomain {
        let gateway = GatewayInfo {
            name: "Home".into(),
            host: "10.0.0.2".into(),
            state: ConnectionState::Connected,
        };
        MemoryDomain::from_records(gateway, records)
    }

    #[test]
    fn steps_skip_records_without_readings() {
        let domain = domain(vec![
            EntityRecord::new("a-scene", EntityKind::Scene, "Evening"),
            EntityRecord::new("lamp", EntityKind::Device, "Lamp").with_attribute("on", false),
            EntityRecord::new("therm", EntityKind::Device, "Thermostat")
                .with_attribute("temperature", 21.0),
        ]);
        let mut sim = Simulator::new(domain.clone());

        assert_eq!(sim.step(), Some(EntityId::from("lamp")));
        assert_eq!(domain.record(&"lamp".into()).unwrap().flag("on"), Some(true));

        assert_eq!(sim.step(), Some(EntityId::from("therm")));
        assert_eq!(domain.record(&"therm".into()).unwrap().number("temperature"), Some(21.5));

        // Wraps around past the scene.
        assert_eq!(sim.step(), Some(EntityId::from("lamp")));
    }

    #[test]
    fn nothing_to_change_yields_none() {
        let mut sim = Simulator::new(domain(vec![EntityRecord::new(
            "evening",
            EntityKind::Scene,
            "Evening",
        )]));
        assert_eq!(sim.step(), None);
        assert_eq!(Simulator::new(domain(Vec::new())).step(), None);
    }
}
