//! Change feed client: the one writer of the materialized view.

use crate::store::BackingStore;
use crate::types::Record;
use crate::view::CollectionView;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use super::types::{DropReason, FeedConfig, FeedEvent, FeedHandle};

/// Subscribes to one collection and materializes its snapshots.
///
/// Deliveries are applied only inside [`poll`](Self::poll) (and the
/// convenience [`wait`](Self::wait)), so within one participant process a
/// pending mutation and an incoming snapshot are strictly serialized: the
/// view changes at poll points and nowhere else. No component other than this
/// client may write the view.
pub struct ChangeFeedClient {
    collection: String,
    store: Arc<BackingStore>,
    handle: FeedHandle,
    view: RwLock<Arc<CollectionView>>,
    dropped: RwLock<Option<DropReason>>,
}

impl ChangeFeedClient {
    /// Subscribe with the default feed configuration.
    ///
    /// The initial snapshot is applied before this returns, so the view
    /// reflects the current committed state (not history).
    pub fn subscribe(store: Arc<BackingStore>, collection: &str) -> Self {
        Self::subscribe_with(store, collection, FeedConfig::default())
    }

    /// Subscribe with an explicit feed configuration.
    pub fn subscribe_with(store: Arc<BackingStore>, collection: &str, config: FeedConfig) -> Self {
        let handle = store.subscribe(collection, config);
        let client = Self {
            collection: collection.to_string(),
            store,
            handle,
            view: RwLock::new(Arc::new(CollectionView::empty())),
            dropped: RwLock::new(None),
        };
        client.poll();
        client
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Drain pending deliveries, atomically replacing the view for each full
    /// snapshot. Returns how many snapshots were applied.
    pub fn poll(&self) -> usize {
        let mut applied = 0;
        loop {
            match self.handle.try_recv() {
                Ok(FeedEvent::Snapshot { records, .. }) => {
                    self.replace_view(records);
                    applied += 1;
                }
                Ok(FeedEvent::Dropped { reason }) => {
                    *self.dropped.write() = Some(reason);
                }
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    self.mark_disconnected();
                    break;
                }
            }
        }
        applied
    }

    /// Block until the next delivery (or timeout), apply it, then drain the
    /// rest. Returns true if at least one snapshot was applied.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.handle.recv_timeout(timeout) {
            Ok(FeedEvent::Snapshot { records, .. }) => {
                self.replace_view(records);
                self.poll();
                true
            }
            Ok(FeedEvent::Dropped { reason }) => {
                *self.dropped.write() = Some(reason);
                false
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                self.mark_disconnected();
                false
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => false,
        }
    }

    /// The current materialized view.
    pub fn view(&self) -> Arc<CollectionView> {
        self.view.read().clone()
    }

    /// Suspend deliveries (transient connectivity loss). The view keeps its
    /// last applied state.
    pub fn suspend(&self) {
        self.store.suspend_feed(self.handle.id);
    }

    /// Resume deliveries. The store redelivers a fresh full snapshot, which
    /// is applied before this returns. Clients must not assume the resumed
    /// feed picks up incrementally where it left off.
    pub fn resume(&self) {
        self.store.resume_feed(self.handle.id);
        self.poll();
    }

    /// Why this subscription was dropped, if it was.
    pub fn drop_reason(&self) -> Option<DropReason> {
        self.dropped.read().clone()
    }

    pub fn is_live(&self) -> bool {
        self.dropped.read().is_none()
    }

    /// Stop delivery and release the underlying subscription.
    pub fn unsubscribe(self) {
        self.store.unsubscribe(self.handle.id);
    }

    fn replace_view(&self, records: Vec<Record>) {
        *self.view.write() = Arc::new(CollectionView::new(records));
    }

    fn mark_disconnected(&self) {
        let mut dropped = self.dropped.write();
        if dropped.is_none() {
            *dropped = Some(DropReason::Disconnected);
        }
    }
}
