//! In-memory backing store: the single linearization point.
//!
//! Every committed mutation happens here, under one write lock, and every
//! commit broadcasts a full snapshot of the touched collection through the
//! feed. There is no other path between participants: one participant's
//! gateway call becomes visible to another participant only after the store
//! commits it and the other participant's feed client applies the resulting
//! snapshot.
//!
//! Conflict resolution is last-write-wins per field path; writes to disjoint
//! field paths never conflict. The store offers no conditional write, which
//! is what makes the claim arbiter's stale-snapshot race possible (see
//! `claims`).

use crate::error::{Result, SyncError};
use crate::feed::{FeedConfig, FeedEvent, FeedHandle, FeedId, FeedManager};
use crate::types::{Fields, Record, RecordId, Timestamp};
use crate::writes::{apply_write, RecordUpdate};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// The backing store for all collections.
pub struct BackingStore {
    /// Committed records, by collection then id.
    collections: RwLock<HashMap<String, BTreeMap<RecordId, Record>>>,

    /// Feed subscriptions.
    feed: FeedManager,

    /// Counter for record ids. Ids are never reused.
    next_id: AtomicU64,

    /// Last issued `created_at`, to keep creation markers strictly monotonic
    /// even when the wall clock does not advance between creates.
    clock: Mutex<i64>,

    /// Lock serializing commit + broadcast so snapshot deliveries are ordered
    /// consistently with commits.
    write_lock: Mutex<()>,
}

impl BackingStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            feed: FeedManager::new(),
            next_id: AtomicU64::new(1),
            clock: Mutex::new(0),
            write_lock: Mutex::new(()),
        }
    }

    fn next_created_at(&self) -> Timestamp {
        let mut last = self.clock.lock();
        let now = Timestamp::now().0;
        let issued = now.max(*last + 1);
        *last = issued;
        Timestamp(issued)
    }

    // --- Record Operations ---

    /// Commit a new record. Assigns the id and `created_at`.
    pub fn create(&self, collection: &str, fields: Fields) -> Record {
        let _commit = self.write_lock.lock();

        let record = Record {
            id: RecordId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            created_at: self.next_created_at(),
            fields,
        };

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(record.id, record.clone());

        self.publish(collection);
        record
    }

    /// Commit a partial update: only the field paths present in the payload
    /// are written. Fails with `NotFound` if the record no longer exists, in
    /// which case nothing is committed or broadcast.
    pub fn update(&self, collection: &str, id: RecordId, update: &RecordUpdate) -> Result<()> {
        let _commit = self.write_lock.lock();

        {
            let mut collections = self.collections.write();
            let records = collections
                .get_mut(collection)
                .ok_or(SyncError::NotFound(id))?;
            let record = records.get_mut(&id).ok_or(SyncError::NotFound(id))?;

            // Immutable-by-replacement: build the full next value, then swap.
            let mut next = record.fields.clone();
            for (path, write) in update.iter() {
                apply_write(&mut next, path, write);
            }
            record.fields = next;
        }

        self.publish(collection);
        Ok(())
    }

    /// Commit a delete, returning the pre-image of the removed record, or
    /// `None` if a race already removed it. The pre-image is not persisted
    /// anywhere; this return value is the only copy.
    pub fn delete(&self, collection: &str, id: RecordId) -> Option<Record> {
        let _commit = self.write_lock.lock();

        let removed = {
            let mut collections = self.collections.write();
            collections
                .get_mut(collection)
                .and_then(|records| records.remove(&id))
        };

        if removed.is_some() {
            self.publish(collection);
        }
        removed
    }

    /// Get one committed record.
    pub fn get(&self, collection: &str, id: RecordId) -> Option<Record> {
        self.collections
            .read()
            .get(collection)
            .and_then(|records| records.get(&id))
            .cloned()
    }

    /// Current full snapshot of a collection, ordered `created_at` descending.
    pub fn snapshot(&self, collection: &str) -> Vec<Record> {
        let collections = self.collections.read();
        let mut records: Vec<Record> = collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        records
    }

    // --- Feed Operations ---

    /// Subscribe to a collection's change feed.
    ///
    /// The handle immediately receives a snapshot of the current state, then
    /// one full snapshot per committed mutation of the collection.
    /// Re-subscribing after an unsubscribe restarts from the current state,
    /// not from history.
    pub fn subscribe(&self, collection: &str, config: FeedConfig) -> FeedHandle {
        // Under the commit lock so the initial snapshot cannot be reordered
        // after a newer broadcast.
        let _commit = self.write_lock.lock();

        let handle = self.feed.subscribe(collection, config);
        self.feed.send_to(
            handle.id,
            FeedEvent::Snapshot {
                collection: collection.to_string(),
                records: self.snapshot(collection),
            },
        );
        handle
    }

    /// Unsubscribe and release the underlying subscription.
    pub fn unsubscribe(&self, id: FeedId) {
        self.feed.unsubscribe(id);
    }

    /// Suspend feed deliveries for one subscription (transient connectivity
    /// loss). Subscriber state stays intact.
    pub fn suspend_feed(&self, id: FeedId) {
        self.feed.suspend(id);
    }

    /// Resume a suspended subscription and redeliver a fresh full snapshot.
    pub fn resume_feed(&self, id: FeedId) {
        let _commit = self.write_lock.lock();

        if let Some(collection) = self.feed.resume(id) {
            let records = self.snapshot(&collection);
            self.feed.send_to(
                id,
                FeedEvent::Snapshot {
                    collection,
                    records,
                },
            );
        }
    }

    /// Number of live feed subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.feed.subscription_count()
    }

    fn publish(&self, collection: &str) {
        self.feed
            .broadcast_snapshot(collection, self.snapshot(collection));
    }
}

impl Default for BackingStore {
    fn default() -> Self {
        Self::new()
    }
}
