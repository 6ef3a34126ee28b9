//! The notification bus: one broadcast channel for every lifecycle and
//! state-mutation notification.
//!
//! Each subscriber owns its own receiver, so a slow or dropped subscriber
//! never blocks the scheduler or other subscribers. A subscriber that falls
//! more than the channel capacity behind receives
//! [`broadcast::error::RecvError::Lagged`] and skips to the newest message.

use groundops_types::Notification;
use tokio::sync::broadcast;
use tracing::trace;

/// Default capacity of the notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Publisher side of the notification channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<Notification>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationBus {
    /// Create a bus buffering up to `capacity` notifications per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a notification to every current subscriber.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, notification: Notification) {
        let kind = notification.name();
        match self.tx.send(notification) {
            Ok(receivers) => trace!(kind, receivers, "Notification published"),
            Err(_unheard) => trace!(kind, "Notification dropped, no subscribers"),
        }
    }

    /// Subscribe to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = NotificationBus::default();
        bus.publish(Notification::TimeScaleChanged { time_scale: 2.0 });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_emission_order() {
        let bus = NotificationBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        bus.publish(Notification::SimulationStarted { current_time: 0 });
        bus.publish(Notification::Tick {
            current_time: 100,
            queue_length: 0,
        });

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap().name(), "simulation-started");
            assert_eq!(rx.recv().await.unwrap().name(), "tick");
        }
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_block_others() {
        let bus = NotificationBus::new(2);
        let dropped = bus.subscribe();
        let mut live = bus.subscribe();
        drop(dropped);
        bus.publish(Notification::SimulationReset { scenario_id: None });
        assert_eq!(live.recv().await.unwrap().name(), "simulation-reset");
    }
}
