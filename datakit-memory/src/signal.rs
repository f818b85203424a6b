//! The per-table broadcast change signal.

use std::{mem, sync::Arc};

use mea::{latch::Latch, mutex::Mutex};
use tracing::trace;

/// Broadcast primitive that wakes every subscriber of a table after any
/// mutation.
///
/// Holds the current generation as a one-count latch. [`notify`] trips the
/// latch and installs a fresh one, so every task holding a [`watch`] handle
/// taken before the notify resumes, while later watchers wait for the next
/// generation. Mutations that land between a subscriber's wakeup and its
/// next watch are coalesced: the subscriber re-reads only the latest state.
///
/// [`notify`]: ChangeSignal::notify
/// [`watch`]: ChangeSignal::watch
#[derive(Debug)]
pub(crate) struct ChangeSignal {
    current: Mutex<Arc<Latch>>,
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self { current: Mutex::new(Arc::new(Latch::new(1))) }
    }

    /// Handle on the current generation.
    ///
    /// Take the handle before reading table state and await it after: a
    /// write landing between the read and the await still trips this
    /// generation, so no wakeup is lost.
    pub async fn watch(&self) -> Arc<Latch> {
        self.current.lock().await.clone()
    }

    /// Wakes every watcher of the current generation.
    pub async fn notify(&self) {
        let mut current = self.current.lock().await;
        let fired = mem::replace(&mut *current, Arc::new(Latch::new(1)));
        drop(current);

        trace!("change signal fired");
        fired.count_down();
    }
}
