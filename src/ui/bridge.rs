// UiBridge - Coordinates between the tokio async runtime and the Slint
// event loop
//
// Two event loops coexist: Slint's single-threaded GUI loop and tokio's
// multi-threaded runtime for camera and file I/O. The bridge marshals
// between them:
// - UI updates from background tasks via upgrade_in_event_loop
// - Spawning async tasks from Slint callbacks

use slint::{ComponentHandle, Weak};
use std::future::Future;
use tokio::sync::mpsc;

/// Cloneable bridge between the tokio runtime and the Slint event loop.
///
/// - [`update_ui()`](Self::update_ui) schedules a closure onto the Slint
///   event loop from any thread
/// - [`spawn_async()`](Self::spawn_async) runs a future on tokio from a
///   Slint callback
///
/// A background handler thread drains the update channel and queues each
/// closure onto the event loop; the channel is bounded so a lagging UI drops
/// updates instead of growing without bound.
pub struct UiBridge<T: ComponentHandle> {
    /// Weak reference to the UI component to prevent circular references
    ui_weak: Weak<T>,

    /// Handle to the tokio runtime for spawning async tasks
    tokio_handle: tokio::runtime::Handle,

    /// Channel carrying UI update closures to the handler thread
    ui_update_tx: mpsc::Sender<Box<dyn FnOnce(&T) + Send>>,
}

impl<T: ComponentHandle + 'static> UiBridge<T> {
    /// Create a new bridge and start its handler thread.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let ui_weak = ui.as_weak();
        // Bounded to 100 updates to prevent unbounded memory growth if the
        // UI lags behind (e.g. a stream of preview frames).
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<Box<dyn FnOnce(&T) + Send>>(100);

        let ui_weak_clone = ui_weak.clone();
        std::thread::spawn(move || {
            tracing::debug!("UiBridge handler thread started");

            while let Some(update_fn) = ui_update_rx.blocking_recv() {
                let result = ui_weak_clone.upgrade_in_event_loop(move |ui| {
                    update_fn(&ui);
                });

                if let Err(e) = result {
                    tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                    // The event loop has stopped; nothing left to do.
                    break;
                }
            }

            tracing::debug!("UiBridge handler thread terminated");
        });

        Self {
            ui_weak,
            tokio_handle,
            ui_update_tx,
        }
    }

    /// Schedule a UI update from any thread.
    ///
    /// The closure runs on the Slint event loop with the upgraded component.
    /// Updates are dropped (with a warning) when the channel is full.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("UI update channel full - skipping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send UI update - handler thread has stopped");
            }
        }
    }

    /// Spawn an async task on the tokio runtime from a Slint callback.
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }

    /// Get a weak reference to the UI component.
    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for UiBridge<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}
