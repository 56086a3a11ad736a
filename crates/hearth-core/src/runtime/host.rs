// ── Store host ──
//
// Runs a store on its own tokio task so the task is the single writer.
// UI intents and worker-derived events arrive through the same inbox and
// are applied strictly in arrival order. Observers read the last published
// snapshot synchronously through a `watch` receiver.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::feature::{Reducer, Worker};
use super::store::Store;
use crate::error::CoreError;

/// Handle to a store running on its own task.
///
/// Dropping the handle stops the loop, which drops the store and cancels
/// its subscriptions.
pub struct StoreHandle<R: Reducer> {
    events: mpsc::UnboundedSender<R::Event>,
    state: watch::Receiver<Arc<R::State>>,
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl<R, W> Store<R, W>
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    /// Move the store onto a dedicated task.
    pub fn spawn(mut self) -> StoreHandle<R> {
        let events = self.inbox();
        let state = self.subscribe();
        let cancel = CancellationToken::new();
        let stop = cancel.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = stop.cancelled() => break,
                    event = self.recv_inbox() => {
                        let Some(event) = event else { break };
                        self.send(event);
                    }
                }
            }
            debug!(store = R::NAME, "store loop stopped");
        });

        StoreHandle {
            events,
            state,
            cancel,
            join: Some(join),
        }
    }
}

impl<R: Reducer> StoreHandle<R> {
    /// Queue an event for the store.
    pub fn send(&self, event: R::Event) -> Result<(), CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::StoreClosed { store: R::NAME });
        }
        self.events
            .send(event)
            .map_err(|_| CoreError::StoreClosed { store: R::NAME })
    }

    /// Last published state.
    pub fn state(&self) -> Arc<R::State> {
        Arc::clone(&self.state.borrow())
    }

    /// Wait for the next published state change.
    pub async fn changed(&mut self) -> Result<Arc<R::State>, CoreError> {
        self.state
            .changed()
            .await
            .map_err(|_| CoreError::StoreClosed { store: R::NAME })?;
        Ok(Arc::clone(&self.state.borrow_and_update()))
    }

    /// Wait until the published state satisfies `done`.
    pub async fn wait_for(
        &mut self,
        mut done: impl FnMut(&R::State) -> bool,
    ) -> Result<Arc<R::State>, CoreError> {
        let state = self
            .state
            .wait_for(|state| done(state))
            .await
            .map_err(|_| CoreError::StoreClosed { store: R::NAME })?;
        Ok(Arc::clone(&state))
    }

    /// Stop the loop and wait for the store to be dropped.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl<R: Reducer> Drop for StoreHandle<R> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
