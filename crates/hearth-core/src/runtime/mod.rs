// ── Reactive store runtime ──
//
// Generic plumbing shared by every feature: feed deduplication, task
// ownership, the worker callback channel, and the single-writer store.

pub mod dedup;
mod feature;
mod host;
mod sink;
mod store;
mod task;

pub use dedup::{dedup, dedup_by, dedup_by_async, try_dedup_by_async};
pub use feature::{Reducer, Schedule, Worker};
pub use host::StoreHandle;
pub use sink::{EventSink, forward};
pub use store::Store;
pub use task::TaskHandle;
