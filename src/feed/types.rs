//! Change feed types for live collection updates.

use crate::types::Record;
use serde::{Deserialize, Serialize};

/// Configuration for a feed subscription.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Max buffered deliveries before the subscriber is dropped.
    /// Default: 256
    pub buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { buffer_size: 256 }
    }
}

/// Events delivered to feed subscribers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A full-collection snapshot, ordered by `created_at` descending.
    ///
    /// Every delivery is a complete replacement of the prior materialized
    /// view, never a delta the subscriber must apply. Clients must not assume
    /// incremental-only updates: after a resume, the same event shape carries
    /// the fresh full state.
    Snapshot {
        collection: String,
        records: Vec<Record>,
    },

    /// The subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Delivery buffer overflowed (slow consumer).
    BufferOverflow,
    /// The delivery channel went away without an explicit drop event (e.g.
    /// the buffer was too full to even carry one).
    Disconnected,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a feed subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FeedId(pub u64);

/// Handle to receive feed deliveries.
pub struct FeedHandle {
    pub id: FeedId,
    /// Channel carrying the deliveries.
    pub receiver: crossbeam_channel::Receiver<FeedEvent>,
}

impl FeedHandle {
    /// Receive the next delivery (blocking).
    pub fn recv(&self) -> Result<FeedEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a delivery (non-blocking).
    pub fn try_recv(&self) -> Result<FeedEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<FeedEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
