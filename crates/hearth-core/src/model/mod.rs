// ── Domain model ──
//
// Records are owned by the backing domain service; descriptors are pure
// projections of them.

pub mod descriptor;
pub mod entity_id;
pub mod record;

pub use descriptor::{
    ClimateReading, Descriptor, EnergyReading, LightLevel, SmokeStatus, ThermostatReading,
};
pub use entity_id::EntityId;
pub use record::{
    CalibratedRange, ConnectionState, EntityKind, EntityRecord, GatewayInfo, RecordMetadata,
    Snapshot, snapshot_of,
};
