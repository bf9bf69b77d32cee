//! Subscription registry and snapshot broadcasting.

use crate::types::Record;
use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{DropReason, FeedConfig, FeedEvent, FeedHandle, FeedId};

/// Internal subscription state.
struct Subscription {
    collection: String,
    sender: Sender<FeedEvent>,
    /// Suspended subscriptions skip broadcasts (transient connectivity loss);
    /// subscriber state stays intact until resume.
    suspended: bool,
}

impl Subscription {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: FeedEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }

    fn matches(&self, collection: &str) -> bool {
        self.collection == collection
    }
}

/// Manages feed subscriptions and broadcasts collection snapshots.
pub struct FeedManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<FeedId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl FeedManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a subscription to one collection.
    ///
    /// Returns a handle for receiving deliveries. The initial snapshot is the
    /// store's responsibility (it is sent through `send_to` so it carries the
    /// state current at registration time).
    pub fn subscribe(&self, collection: &str, config: FeedConfig) -> FeedHandle {
        let id = FeedId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        let subscription = Subscription {
            collection: collection.to_string(),
            sender,
            suspended: false,
        };

        self.subscriptions.write().insert(id, subscription);

        FeedHandle { id, receiver }
    }

    /// Unsubscribe and release the subscription.
    pub fn unsubscribe(&self, id: FeedId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Final event is best effort
            let _ = sub.sender.try_send(FeedEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Suspend deliveries without tearing down subscriber state.
    pub fn suspend(&self, id: FeedId) {
        if let Some(sub) = self.subscriptions.write().get_mut(&id) {
            sub.suspended = true;
        }
    }

    /// Resume deliveries. Returns the subscribed collection so the caller can
    /// redeliver a fresh full snapshot.
    pub fn resume(&self, id: FeedId) -> Option<String> {
        let mut subs = self.subscriptions.write();
        let sub = subs.get_mut(&id)?;
        sub.suspended = false;
        Some(sub.collection.clone())
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    // --- Broadcasting ---

    /// Broadcast a full-collection snapshot to matching subscriptions.
    /// Suspended subscriptions are skipped.
    pub fn broadcast_snapshot(&self, collection: &str, records: Vec<Record>) {
        let event = FeedEvent::Snapshot {
            collection: collection.to_string(),
            records,
        };

        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if !sub.suspended && sub.matches(collection) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        // Remove dropped subscriptions
        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::debug!(target: "liveboard::feed", id = id.0, "dropping slow subscriber");
                    // Try to notify about the drop (might fail, that's ok)
                    let _ = sub.sender.try_send(FeedEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }

    /// Send an event directly to one subscription (initial snapshot, resync).
    /// Returns false if the subscription is gone or its buffer is full.
    pub fn send_to(&self, id: FeedId, event: FeedEvent) -> bool {
        let subs = self.subscriptions.read();
        match subs.get(&id) {
            Some(sub) => sub.try_send(event),
            None => false,
        }
    }
}

impl Default for FeedManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Fields, Record, RecordId, Timestamp};
    use std::time::Duration;

    fn make_record(id: u64) -> Record {
        Record {
            id: RecordId(id),
            created_at: Timestamp::now(),
            fields: Fields::new(),
        }
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let manager = FeedManager::new();

        let handle = manager.subscribe("announcements", FeedConfig::default());
        assert_eq!(manager.subscription_count(), 1);

        manager.unsubscribe(handle.id);
        assert_eq!(manager.subscription_count(), 0);

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert!(matches!(
            event,
            FeedEvent::Dropped {
                reason: DropReason::Unsubscribed
            }
        ));
    }

    #[test]
    fn test_broadcast_to_matching_collection() {
        let manager = FeedManager::new();

        let handle = manager.subscribe("announcements", FeedConfig::default());
        let other = manager.subscribe("payments", FeedConfig::default());

        manager.broadcast_snapshot("announcements", vec![make_record(1)]);

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        match event {
            FeedEvent::Snapshot {
                collection,
                records,
            } => {
                assert_eq!(collection, "announcements");
                assert_eq!(records.len(), 1);
            }
            _ => panic!("Expected Snapshot event, got {:?}", event),
        }

        // Other collection's subscriber sees nothing
        assert!(other.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_suspended_skips_delivery() {
        let manager = FeedManager::new();

        let handle = manager.subscribe("announcements", FeedConfig::default());
        manager.suspend(handle.id);

        manager.broadcast_snapshot("announcements", vec![make_record(1)]);
        assert!(handle.recv_timeout(Duration::from_millis(50)).is_err());

        let collection = manager.resume(handle.id).unwrap();
        assert_eq!(collection, "announcements");
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let manager = FeedManager::new();
        let handle = manager.subscribe("announcements", FeedConfig { buffer_size: 2 });

        // Flood without draining
        for i in 0..10 {
            manager.broadcast_snapshot("announcements", vec![make_record(i)]);
        }

        assert_eq!(manager.subscription_count(), 0);

        // The buffered deliveries are still readable; after them the channel
        // is disconnected because the sender side was removed.
        assert!(handle.try_recv().is_ok());
        assert!(handle.try_recv().is_ok());
        assert!(matches!(
            handle.try_recv(),
            Err(crossbeam_channel::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_send_to_unknown_id() {
        let manager = FeedManager::new();
        assert!(!manager.send_to(
            FeedId(99),
            FeedEvent::Snapshot {
                collection: "announcements".to_string(),
                records: vec![],
            }
        ));
    }
}
