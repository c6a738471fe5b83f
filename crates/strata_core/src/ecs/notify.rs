//! Registry notification channel.
//!
//! ```text
//! Registry ──send──> [unbounded channel] ──drain──> transport layer
//! ```
//!
//! Sends never block the tick and never drop: a lost `EntityAdded` or
//! `EntityDestroyed` would desync the peer for good. A backlog past the
//! configured threshold is logged, with the warning backing off by doubling.

use crossbeam_channel::{unbounded, Receiver, Sender};
use strata_shared::Notification;
use tracing::warn;

/// Producer side, owned by the registry.
#[derive(Debug)]
pub(crate) struct NotificationBus {
    sender: Sender<Notification>,
    receiver: Receiver<Notification>,
    threshold: usize,
    next_warning: usize,
}

impl NotificationBus {
    pub(crate) fn new(backlog_threshold: usize) -> Self {
        let (sender, receiver) = unbounded();
        let threshold = backlog_threshold.max(1);
        Self {
            sender,
            receiver,
            threshold,
            next_warning: threshold,
        }
    }

    pub(crate) fn send(&mut self, notification: Notification) {
        // The bus holds a receiver, so the channel is never disconnected.
        let _ = self.sender.send(notification);

        let pending = self.receiver.len();
        if pending < self.threshold {
            self.next_warning = self.threshold;
        } else if pending >= self.next_warning {
            warn!(
                pending,
                threshold = self.threshold,
                "Notification backlog growing, is anyone draining?"
            );
            self.next_warning = self.next_warning.saturating_mul(2);
        }
    }

    pub(crate) fn receiver(&self) -> NotificationReceiver {
        NotificationReceiver {
            receiver: self.receiver.clone(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.receiver.len()
    }
}

/// Consumer handle for registry notifications. Cheap to clone.
#[derive(Clone, Debug)]
pub struct NotificationReceiver {
    receiver: Receiver<Notification>,
}

impl NotificationReceiver {
    /// Takes every pending notification without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }

    /// Takes one notification, if any.
    #[must_use]
    pub fn try_recv(&self) -> Option<Notification> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending notifications.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_shared::EntityId;

    #[test]
    fn test_backlog_past_threshold_is_kept() {
        let mut bus = NotificationBus::new(2);
        for i in 0..5 {
            bus.send(Notification::EntityAdded { entity: EntityId(i) });
        }
        assert_eq!(bus.pending(), 5);
        assert_eq!(bus.next_warning, 8);

        let rx = bus.receiver();
        let drained = rx.drain();
        assert_eq!(drained.len(), 5);
        assert_eq!(drained[0].entity(), EntityId(0));
        assert_eq!(drained[4].entity(), EntityId(4));
        assert!(rx.try_recv().is_none());

        bus.send(Notification::EntityDestroyed { entity: EntityId(0) });
        assert_eq!(bus.next_warning, 2);
    }
}
