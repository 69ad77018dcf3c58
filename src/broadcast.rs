//! Bounded fan-out to downstream consumers.
//!
//! Each subscriber gets its own bounded queue. Publishing never blocks: a
//! full queue drops the item for that subscriber only, and a subscriber whose
//! receiver was dropped is removed. One slow or gone consumer cannot stall the
//! producer or starve the others.

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers that received the item
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers removed because their receiver is gone
    pub disconnected: usize,
}

struct Subscriber<T> {
    id: u64,
    tx: Sender<T>,
    dropped: u64,
}

/// Fan-out of cloned items to any number of bounded queues.
pub struct Broadcaster<T> {
    name: &'static str,
    capacity: usize,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T: Clone> Broadcaster<T> {
    /// Create a broadcaster whose subscriber queues hold `capacity` items.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            next_id: AtomicU64::new(0),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a new consumer.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = channel::bounded(self.capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Subscriber { id, tx, dropped: 0 });
        tracing::debug!("{}: subscriber {} registered", self.name, id);
        rx
    }

    /// Deliver an item to every subscriber without blocking.
    pub fn publish(&self, item: T) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut subscribers = self.lock();

        subscribers.retain_mut(|sub| match sub.tx.try_send(item.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                sub.dropped += 1;
                report.dropped += 1;
                // Log the first drop and then every 100th
                if sub.dropped % 100 == 1 {
                    tracing::warn!(
                        "{}: subscriber {} is not keeping up ({} items dropped)",
                        self.name,
                        sub.id,
                        sub.dropped
                    );
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                report.disconnected += 1;
                tracing::debug!("{}: subscriber {} disconnected", self.name, sub.id);
                false
            }
        });

        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber<T>>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
