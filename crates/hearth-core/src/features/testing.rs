// Test doubles for feature workers: scripted feeds and recorded commands.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::domain::{CommandFn, FeedFn, KeyedFeedFn};
use crate::model::EntityId;
use crate::runtime::{Reducer, Store, Worker};

/// A feed the test pushes into. Hands out its receiver exactly once and
/// counts how often the factory was called.
pub(crate) struct ScriptedFeed<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<T>>>>,
    calls: Arc<AtomicUsize>,
}

impl<T: Send + 'static> ScriptedFeed<T> {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(Some(rx))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn push(&self, value: T) {
        self.tx.send(value).unwrap();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn factory(&self) -> FeedFn<T> {
        let rx = Arc::clone(&self.rx);
        let calls = Arc::clone(&self.calls);
        Arc::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            match rx.lock().unwrap().take() {
                Some(rx) => UnboundedReceiverStream::new(rx).boxed(),
                None => futures_util::stream::pending().boxed(),
            }
        })
    }

    /// Keyed form; the key is recorded but every caller shares one feed.
    pub(crate) fn keyed(&self, seen: Arc<Mutex<Vec<EntityId>>>) -> KeyedFeedFn<T> {
        let factory = self.factory();
        Arc::new(move |id: &EntityId| {
            seen.lock().unwrap().push(id.clone());
            factory()
        })
    }
}

/// Records every argument a command function was called with.
pub(crate) struct CommandLog<A> {
    calls: Arc<Mutex<Vec<A>>>,
}

impl<A: Clone + Send + 'static> CommandLog<A> {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn command(&self) -> CommandFn<A> {
        let calls = Arc::clone(&self.calls);
        Arc::new(move |arg| {
            calls.lock().unwrap().push(arg);
            async {}.boxed()
        })
    }

    pub(crate) fn calls(&self) -> Vec<A> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until the command has been called `n` times.
    pub(crate) async fn wait_for(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while self.calls.lock().unwrap().len() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}

/// Fold derived events in until `done` holds, failing after a second.
pub(crate) async fn settle<R, W>(store: &mut Store<R, W>, done: impl FnMut(&R::State) -> bool)
where
    R: Reducer,
    W: Worker<Event = R::Event, Effect = R::Effect>,
{
    tokio::time::timeout(Duration::from_secs(1), store.wait_for(done))
        .await
        .unwrap();
}
