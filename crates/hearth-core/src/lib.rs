//! Reactive store runtime for hearth smart-home clients.
//!
//! Each UI surface owns a [`Store`](runtime::Store): a single-writer holder
//! of its state, mutated only by a pure [`Reducer`](runtime::Reducer).
//! Observation feeds and commands against the backing domain run in a
//! [`Worker`](runtime::Worker) and re-enter the store only as events.
//!
//! ```ignore
//! let service: Arc<dyn DomainService> = Arc::new(MemoryDomain::from_fixture(fixture));
//! let mut favorites = FavoritesStore::from_service(&service);
//! favorites.send(FavoritesEvent::Appeared);
//! favorites.wait_for(|s| s.loaded).await;
//! ```

pub mod domain;
pub mod error;
pub mod features;
pub mod model;
pub mod runtime;

pub use domain::{DomainService, Fixture, MemoryDomain};
pub use error::{CoreError, DomainError};
pub use model::{EntityId, EntityKind, EntityRecord, GatewayInfo, Snapshot};
pub use runtime::{Reducer, Store, StoreHandle, Worker};
