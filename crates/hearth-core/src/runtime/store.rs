// ── Single-writer store ──
//
// Holds the current state of one UI surface. `send` is the only mutator
// and runs the reducer synchronously; effects are handed to the worker.
// Derived events produced by the worker queue up in the store's inbox and
// are folded back in one at a time by whoever owns the store, so no two
// transitions ever overlap.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::feature::{Reducer, Schedule, Worker};
use super::sink::EventSink;
use super::task::TaskHandle;

/// Single-writer holder of a feature's state.
///
/// Owned by exactly one execution context (a UI loop, or the task started
/// by [`spawn`](Store::spawn)). Dropping the store cancels every live
/// subscription and closes its inbox, so no worker callback can reach it
/// afterwards.
pub struct Store<R, W>
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    state: Arc<R::State>,
    published: watch::Sender<Arc<R::State>>,
    worker: Arc<W>,
    subscriptions: HashMap<&'static str, TaskHandle>,
    inbox_tx: mpsc::UnboundedSender<R::Event>,
    inbox_rx: mpsc::UnboundedReceiver<R::Event>,
    scope: CancellationToken,
}

impl<R, W> Store<R, W>
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    pub fn new(initial: R::State, worker: W) -> Self {
        let state = Arc::new(initial);
        let (published, _) = watch::channel(Arc::clone(&state));
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Self {
            state,
            published,
            worker: Arc::new(worker),
            subscriptions: HashMap::new(),
            inbox_tx,
            inbox_rx,
            scope: CancellationToken::new(),
        }
    }

    /// Current state. Always reflects every transition applied so far.
    pub fn state(&self) -> &R::State {
        &self.state
    }

    /// Shared handle to the current state snapshot.
    pub fn snapshot(&self) -> Arc<R::State> {
        Arc::clone(&self.state)
    }

    /// Observe state changes. Receivers are notified only when a
    /// transition produced a state different from the previous one.
    pub fn subscribe(&self) -> watch::Receiver<Arc<R::State>> {
        self.published.subscribe()
    }

    /// Apply one event: reduce, replace state, dispatch effects.
    pub fn send(&mut self, event: R::Event) {
        trace!(store = R::NAME, ?event, "reduce");
        let (next, effects) = R::reduce(&self.state, event);

        if next != *self.state {
            let next = Arc::new(next);
            self.state = Arc::clone(&next);
            self.published.send_replace(next);
        }

        for effect in effects {
            self.dispatch(effect);
        }
    }

    /// Wait for the next derived event from the worker and apply it.
    ///
    /// Never resolves if no work is outstanding; pair it with
    /// `tokio::select!` or a timeout.
    pub async fn next(&mut self) {
        if let Some(event) = self.inbox_rx.recv().await {
            self.send(event);
        }
    }

    /// Apply every derived event already queued, without waiting.
    /// Returns how many were applied.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.send(event);
            applied += 1;
        }
        applied
    }

    /// Fold derived events in until `done` holds for the current state.
    pub async fn wait_for(&mut self, mut done: impl FnMut(&R::State) -> bool) {
        while !done(&self.state) {
            self.next().await;
        }
    }

    /// Whether the subscription for `key` currently has a live task.
    pub fn is_observing(&self, key: &str) -> bool {
        self.subscriptions.get(key).is_some_and(TaskHandle::is_active)
    }

    pub(crate) fn inbox(&self) -> mpsc::UnboundedSender<R::Event> {
        self.inbox_tx.clone()
    }

    pub(crate) async fn recv_inbox(&mut self) -> Option<R::Event> {
        self.inbox_rx.recv().await
    }

    fn dispatch(&mut self, effect: R::Effect) {
        match self.worker.schedule(&effect) {
            Schedule::Subscription(key) => {
                let handle = self.subscriptions.entry(key).or_default();
                if handle.is_active() {
                    trace!(store = R::NAME, key, "subscription already live");
                    return;
                }

                debug!(store = R::NAME, key, "starting subscription");
                let worker = Arc::clone(&self.worker);
                let inbox = self.inbox_tx.clone();
                handle.spawn(&self.scope, move |cancel| {
                    let sink = EventSink::new(inbox, cancel);
                    async move {
                        worker.run(effect, sink).await;
                        debug!(store = R::NAME, key, "subscription ended");
                    }
                });
            }
            Schedule::Detached => {
                trace!(store = R::NAME, ?effect, "spawning command");
                let worker = Arc::clone(&self.worker);
                let sink = EventSink::new(self.inbox_tx.clone(), self.scope.clone());
                tokio::spawn(worker.run(effect, sink));
            }
        }
    }
}

impl<R, W> Drop for Store<R, W>
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    fn drop(&mut self) {
        self.scope.cancel();
        for handle in self.subscriptions.values_mut() {
            handle.clear();
        }
        debug!(store = R::NAME, "store disposed");
    }
}
