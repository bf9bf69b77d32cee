//! Change feed for live collection updates.
//!
//! Subscribing to a collection yields a lazy, infinite, restartable sequence
//! of full-collection snapshots: one immediately (the current state), then
//! one per committed mutation. Each delivery completely replaces the prior
//! materialized view; subscribers never apply deltas, which removes a class
//! of merge bugs at the cost of bandwidth.
//!
//! Feeds support:
//! - Suspension and resume (resume redelivers a fresh full snapshot)
//! - Bounded buffers with slow-subscriber dropping
//! - Explicit unsubscribe as the only cancellation primitive
//!
//! # Example
//!
//! ```ignore
//! let client = ChangeFeedClient::subscribe(store, "announcements");
//!
//! // ... another participant commits a record ...
//!
//! client.poll();
//! for record in client.view().iter() {
//!     println!("{}: {:?}", record.id, record.str_field("title"));
//! }
//! ```

mod client;
mod manager;
mod types;

pub use client::ChangeFeedClient;
pub use manager::FeedManager;
pub use types::{DropReason, FeedConfig, FeedEvent, FeedHandle, FeedId};
