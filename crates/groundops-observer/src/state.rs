//! Shared application state for the Observer API server.
//!
//! [`AppState`] carries the [`SchedulerHandle`] used by every REST handler
//! and the [`NotificationBus`] the `WebSocket` endpoint subscribes to. The
//! observer never owns the scheduler: every read and command is a message
//! to the driver task.

use groundops_core::{NotificationBus, SchedulerHandle};
use groundops_types::Notification;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the simulation driver.
    pub handle: SchedulerHandle,
    /// Notification channel streamed to `WebSocket` clients.
    pub bus: NotificationBus,
}

impl AppState {
    /// Create the application state.
    pub const fn new(handle: SchedulerHandle, bus: NotificationBus) -> Self {
        Self { handle, bus }
    }

    /// Subscribe to the notification stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.bus.subscribe()
    }
}
