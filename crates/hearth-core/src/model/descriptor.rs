// ── Descriptors ──
//
// Typed projections of a record's free-form attribute map. A descriptor
// holds no state of its own: it is recomputed from the whole record every
// time a new record is observed.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::record::{CalibratedRange, EntityRecord};

const DEFAULT_TEMPERATURE_UNIT: &str = "°C";
const DEFAULT_LIGHT_UNIT: &str = "lx";
const DEFAULT_LIGHT_RANGE: CalibratedRange = CalibratedRange {
    min: 0.0,
    max: 100_000.0,
};

/// A pure, derived view over an [`EntityRecord`].
pub trait Descriptor: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Short name used in logs and CLI output.
    const KIND: &'static str;

    /// Derive the descriptor, or `None` when the record lacks the
    /// attributes this descriptor needs.
    fn from_record(record: &EntityRecord) -> Option<Self>;
}

/// Temperature and humidity pair from a climate sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl Descriptor for ClimateReading {
    const KIND: &'static str = "climate";

    fn from_record(record: &EntityRecord) -> Option<Self> {
        let temperature = record.number("temperature");
        let humidity = record.number("humidity");
        if temperature.is_none() && humidity.is_none() {
            return None;
        }
        Some(Self {
            temperature,
            humidity,
        })
    }
}

/// Thermostat reading: measured temperature, optional setpoint, unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatReading {
    pub temperature: f64,
    pub setpoint: Option<f64>,
    pub unit: String,
}

impl Descriptor for ThermostatReading {
    const KIND: &'static str = "thermostat";

    fn from_record(record: &EntityRecord) -> Option<Self> {
        let temperature = record.number("temperature")?;
        let unit = record
            .text("unit")
            .or(record.metadata.unit.as_deref())
            .unwrap_or(DEFAULT_TEMPERATURE_UNIT)
            .to_owned();
        Some(Self {
            temperature,
            setpoint: record.number("heatsetpoint"),
            unit,
        })
    }
}

/// Light-level reading with the sensor's calibrated range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightLevel {
    pub value: f64,
    pub range: CalibratedRange,
    pub unit: String,
    pub daylight: Option<bool>,
}

impl LightLevel {
    /// Reading position within the calibrated range, `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        self.range.fraction(self.value)
    }
}

impl Descriptor for LightLevel {
    const KIND: &'static str = "light";

    fn from_record(record: &EntityRecord) -> Option<Self> {
        let value = record.number("lightlevel")?;
        Some(Self {
            value,
            range: record.metadata.range.unwrap_or(DEFAULT_LIGHT_RANGE),
            unit: record
                .metadata
                .unit
                .clone()
                .unwrap_or_else(|| DEFAULT_LIGHT_UNIT.to_owned()),
            daylight: record.flag("daylight"),
        })
    }
}

/// Smoke detector status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct SmokeStatus {
    pub fire: bool,
    pub low_battery: bool,
    pub tampered: bool,
}

impl Descriptor for SmokeStatus {
    const KIND: &'static str = "smoke";

    fn from_record(record: &EntityRecord) -> Option<Self> {
        Some(Self {
            fire: record.flag("fire")?,
            low_battery: record.flag("lowbattery").unwrap_or(false),
            tampered: record.flag("tampered").unwrap_or(false),
        })
    }
}

/// Energy metering values from a smart plug or meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyReading {
    pub power_watts: Option<f64>,
    pub consumption_kwh: Option<f64>,
    pub voltage: Option<f64>,
}

impl Descriptor for EnergyReading {
    const KIND: &'static str = "energy";

    fn from_record(record: &EntityRecord) -> Option<Self> {
        let reading = Self {
            power_watts: record.number("power"),
            consumption_kwh: record.number("consumption"),
            voltage: record.number("voltage"),
        };
        if reading.power_watts.is_none()
            && reading.consumption_kwh.is_none()
            && reading.voltage.is_none()
        {
            return None;
        }
        Some(reading)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, RecordMetadata};

    fn sensor() -> EntityRecord {
        EntityRecord::new("sensor-1", EntityKind::Device, "Hallway sensor")
    }

    #[test]
    fn thermostat_prefers_attribute_unit() {
        let record = sensor()
            .with_attribute("temperature", 21.5)
            .with_attribute("unit", "°F")
            .with_metadata(RecordMetadata {
                unit: Some("K".into()),
                range: None,
            });
        let reading = ThermostatReading::from_record(&record).unwrap();
        assert_eq!(reading.unit, "°F");
    }

    #[test]
    fn thermostat_falls_back_to_celsius() {
        let record = sensor()
            .with_attribute("temperature", 22.0)
            .with_attribute("heatsetpoint", 20.0);
        let reading = ThermostatReading::from_record(&record).unwrap();
        assert_eq!(reading.unit, "°C");
        assert_eq!(reading.setpoint, Some(20.0));
    }

    #[test]
    fn thermostat_requires_temperature() {
        assert!(ThermostatReading::from_record(&sensor().with_attribute("heatsetpoint", 20.0)).is_none());
    }

    #[test]
    fn climate_accepts_humidity_only() {
        let reading = ClimateReading::from_record(&sensor().with_attribute("humidity", 48.0)).unwrap();
        assert_eq!(reading.temperature, None);
        assert_eq!(reading.humidity, Some(48.0));
        assert!(ClimateReading::from_record(&sensor()).is_none());
    }

    #[test]
    fn light_level_uses_calibrated_range() {
        let record = sensor()
            .with_attribute("lightlevel", 250.0)
            .with_attribute("daylight", true)
            .with_metadata(RecordMetadata {
                unit: Some("lux".into()),
                range: Some(CalibratedRange::new(0.0, 1000.0)),
            });
        let level = LightLevel::from_record(&record).unwrap();
        assert_eq!(level.unit, "lux");
        assert_eq!(level.daylight, Some(true));
        assert!((level.fraction() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn light_level_defaults() {
        let level = LightLevel::from_record(&sensor().with_attribute("lightlevel", 10.0)).unwrap();
        assert_eq!(level.unit, "lx");
        assert_eq!(level.range, DEFAULT_LIGHT_RANGE);
    }

    #[test]
    fn smoke_requires_fire_flag() {
        assert!(SmokeStatus::from_record(&sensor().with_attribute("lowbattery", true)).is_none());
        let status = SmokeStatus::from_record(
            &sensor()
                .with_attribute("fire", true)
                .with_attribute("lowbattery", true),
        )
        .unwrap();
        assert!(status.fire && status.low_battery && !status.tampered);
    }

    #[test]
    fn energy_absent_without_any_metering() {
        assert!(EnergyReading::from_record(&sensor()).is_none());
        let reading = EnergyReading::from_record(&sensor().with_attribute("power", 42.5)).unwrap();
        assert_eq!(reading.power_watts, Some(42.5));
        assert_eq!(reading.voltage, None);
    }
}
