// SPDX-License-Identifier: MPL-2.0
//! Cancellable, fire-once image loads.
//!
//! A view that requests an image holds the [`LoadTicket`]. Tearing the view
//! down drops the ticket, which cancels the load; a result that arrives
//! afterwards is discarded instead of reaching freed state.

use crate::application::port::ImageLoader;
use crate::domain::error::LoadError;
use crate::domain::Bitmap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

/// Where a spawned load is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    /// The callback has been claimed and is running or has run.
    Delivering,
    Cancelled,
}

/// Handle to a load started by [`spawn_load`].
///
/// Dropping the ticket cancels the load.
#[derive(Debug)]
pub struct LoadTicket {
    phase: Arc<Mutex<Phase>>,
    handle: Option<JoinHandle<()>>,
}

impl LoadTicket {
    /// Cancels the load. If the callback has not started yet, it will never
    /// be invoked.
    ///
    /// Safe to call from inside the callback itself; once delivery has
    /// started this is a no-op.
    pub fn cancel(&self) {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *phase != Phase::Pending {
            return;
        }
        *phase = Phase::Cancelled;
        drop(phase);
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) == Phase::Cancelled
    }

    /// Returns `true` once the load task has stopped, whether it delivered
    /// a result or was cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts loading `url` on the current tokio runtime and calls
/// `on_complete` exactly once with the result, unless the ticket is
/// cancelled first.
///
/// Outside a tokio runtime the callback receives
/// [`LoadError::Transport`] immediately.
pub fn spawn_load<F>(loader: Arc<dyn ImageLoader>, url: impl Into<String>, on_complete: F) -> LoadTicket
where
    F: FnOnce(Result<Bitmap, LoadError>) + Send + 'static,
{
    let url = url.into();

    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(err) => {
            on_complete(Err(LoadError::Transport(format!("no async runtime: {err}"))));
            return LoadTicket {
                phase: Arc::new(Mutex::new(Phase::Delivering)),
                handle: None,
            };
        }
    };

    let phase = Arc::new(Mutex::new(Phase::Pending));
    let task_phase = Arc::clone(&phase);
    let handle = runtime.spawn(async move {
        let result = loader.load(&url).await;
        if !claim_delivery(&task_phase) {
            log::debug!("Discarding result of cancelled load {url}");
            return;
        }
        if let Err(err) = &result {
            log::warn!("Failed to load {url}: {err}");
        }
        // The lock is released here: the callback may cancel or drop its
        // own ticket.
        on_complete(result);
    });

    LoadTicket {
        phase,
        handle: Some(handle),
    }
}

/// Moves `Pending` to `Delivering`. Returns `false` if the load was cancelled.
fn claim_delivery(phase: &Mutex<Phase>) -> bool {
    let mut phase = phase.lock().unwrap_or_else(PoisonError::into_inner);
    match *phase {
        Phase::Pending => {
            *phase = Phase::Delivering;
            true
        }
        Phase::Delivering | Phase::Cancelled => false,
    }
}
