// ── Feature stores ──
//
// Each feature is a reducer plus a worker bound to the domain functions it
// needs. The store type aliases and their constructors are the surface the
// UI composes.

pub mod collection;
pub mod descriptor;
pub mod entity_card;
pub mod favorites;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

/// Subscription key every feature uses for its long-lived observation.
pub(crate) const OBSERVE: &str = "observe";

pub use collection::{CollectionEvent, CollectionState, CollectionStore};
pub use descriptor::{
    ClimateStore, DescriptorEvent, DescriptorState, DescriptorStore, EnergyStore, LightLevelStore,
    SmokeStore, ThermostatStore,
};
pub use entity_card::{EntityCardEvent, EntityCardState, EntityCardStore};
pub use favorites::{FavoritesEvent, FavoritesState, FavoritesStore};
pub use settings::{SettingsEvent, SettingsState, SettingsStore};
