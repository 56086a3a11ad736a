// ── Reducer and worker seams ──
//
// A feature supplies a pure reducer and a worker bound to its external
// functions. The store owns everything in between.

use std::fmt::Debug;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::sink::EventSink;

/// The only place a feature's state transitions are defined.
///
/// `reduce` is total and pure: no I/O, no async, no failure. It returns the
/// replacement state together with the effects the worker should run.
pub trait Reducer: 'static {
    /// Name used in log fields and error messages.
    const NAME: &'static str;

    type State: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Event: Debug + Send + 'static;
    type Effect: Debug + Send + 'static;

    fn reduce(state: &Self::State, event: Self::Event) -> (Self::State, Vec<Self::Effect>);
}

/// How the store should run an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Long-lived observation held in the store's task handle for `key`.
    /// Starting it while a live task already holds the key is a no-op.
    Subscription(&'static str),
    /// Independent command task; not tracked, not cancelled with the store.
    Detached,
}

/// Executes effects against external collaborators on behalf of one store.
///
/// A worker never sees store state. Its only way back is the [`EventSink`]
/// passed to [`run`](Worker::run).
pub trait Worker: Send + Sync + 'static {
    type Event: Send + 'static;
    type Effect: Send + 'static;

    fn schedule(&self, effect: &Self::Effect) -> Schedule;

    fn run(self: Arc<Self>, effect: Self::Effect, sink: EventSink<Self::Event>)
    -> BoxFuture<'static, ()>;
}
