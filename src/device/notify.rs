//! Out-of-band notifications — transition outcomes sent from a device
//! controller to whoever orchestrates the experiment cycle.
//!
//! Backed by a lock-free SPSC ring buffer so the receiving side can poll it
//! from another thread without blocking the controller.

use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Default number of undelivered notifications kept.
pub const NOTIFY_CAPACITY: usize = 64;

/// Result of a mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// A transition outcome for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub device: String,
    pub outcome: Outcome,
}

/// Producer half, owned by a device controller.
pub struct NotificationSender {
    producer: HeapProd<Notification>,
}

impl NotificationSender {
    /// Queue a notification. Returns `false` (and drops it) if the receiver
    /// has fallen `NOTIFY_CAPACITY` notifications behind.
    pub fn send(&mut self, notification: Notification) -> bool {
        match self.producer.try_push(notification) {
            Ok(()) => true,
            Err(dropped) => {
                tracing::warn!(
                    device = %dropped.device,
                    outcome = ?dropped.outcome,
                    "notification channel full, dropping"
                );
                false
            }
        }
    }
}

/// Consumer half, held by the orchestrator.
pub struct NotificationReceiver {
    consumer: HeapCons<Notification>,
}

impl NotificationReceiver {
    /// Non-blocking poll for the next notification.
    pub fn poll(&mut self) -> Option<Notification> {
        self.consumer.try_pop()
    }

    /// Drain all pending notifications.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Some(n) = self.consumer.try_pop() {
            out.push(n);
        }
        out
    }
}

/// Create a notification channel holding up to `capacity` entries.
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let rb = HeapRb::<Notification>::new(capacity);
    let (producer, consumer) = rb.split();
    (
        NotificationSender { producer },
        NotificationReceiver { consumer },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(device: &str, outcome: Outcome) -> Notification {
        Notification {
            device: device.to_string(),
            outcome,
        }
    }

    #[test]
    fn send_and_poll() {
        let (mut tx, mut rx) = notification_channel(4);
        assert!(tx.send(note("asg", Outcome::Success)));
        assert_eq!(rx.poll(), Some(note("asg", Outcome::Success)));
        assert_eq!(rx.poll(), None);
    }

    #[test]
    fn drain_preserves_order() {
        let (mut tx, mut rx) = notification_channel(4);
        tx.send(note("a", Outcome::Success));
        tx.send(note("b", Outcome::Failed));
        let all = rx.drain();
        assert_eq!(all, vec![note("a", Outcome::Success), note("b", Outcome::Failed)]);
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn full_channel_drops_newest() {
        let (mut tx, mut rx) = notification_channel(1);
        assert!(tx.send(note("a", Outcome::Success)));
        assert!(!tx.send(note("b", Outcome::Failed)));
        assert_eq!(rx.drain(), vec![note("a", Outcome::Success)]);
    }

    #[test]
    fn receiver_works_across_threads() {
        let (mut tx, mut rx) = notification_channel(NOTIFY_CAPACITY);
        let handle = std::thread::spawn(move || {
            tx.send(note("asg", Outcome::Failed));
        });
        handle.join().unwrap();
        assert_eq!(rx.poll().map(|n| n.outcome), Some(Outcome::Failed));
    }
}
