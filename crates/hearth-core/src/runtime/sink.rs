// ── Worker → store callback channel ──
//
// The only path by which asynchronous work re-enters a store. A sink is
// bound to a cancellation scope; once that scope is cancelled every send is
// refused, so a disposed store never receives another event.

use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cloneable handle a worker uses to hand derived events back to its store.
pub struct EventSink<E> {
    tx: mpsc::UnboundedSender<E>,
    scope: CancellationToken,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            scope: self.scope.clone(),
        }
    }
}

impl<E> EventSink<E> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<E>, scope: CancellationToken) -> Self {
        Self { tx, scope }
    }

    /// Deliver an event to the store. Returns `false` if the scope was
    /// cancelled or the store is gone; the event is dropped in that case.
    pub fn send(&self, event: E) -> bool {
        if self.scope.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once the sink's scope is cancelled.
    pub async fn cancelled(&self) {
        self.scope.cancelled().await;
    }
}

/// Drive an observation feed into a store.
///
/// Pulls one element at a time, racing each pull against cancellation, and
/// re-checks cancellation after every element before translating it. A
/// `None` from `translate` discards the element. Completion of the feed
/// is a silent end of updates.
pub async fn forward<S, E, F>(feed: S, sink: &EventSink<E>, mut translate: F)
where
    S: Stream,
    F: FnMut(S::Item) -> Option<E>,
{
    let mut feed = pin!(feed);
    loop {
        let next = tokio::select! {
            biased;
            () = sink.cancelled() => break,
            next = feed.next() => next,
        };
        let Some(value) = next else {
            debug!("observation feed completed");
            break;
        };
        if sink.is_cancelled() {
            break;
        }
        if let Some(event) = translate(value) {
            if !sink.send(event) {
                break;
            }
        }
    }
}
