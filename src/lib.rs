//! # Liveboard
//!
//! A live-syncing store for shared, continuously-changing records:
//! announcements, claimable "materials" requests, tasks with attachments,
//! and payment obligations, kept consistent across many concurrently
//! connected participants.
//!
//! ## Core Concepts
//!
//! - **Records**: generic field envelopes, created/updated/deleted through a
//!   validating gateway
//! - **Change feed**: full-collection snapshots delivered on every commit;
//!   each participant materializes them into its local view
//! - **Claims**: mutually-exclusive holds on indexed sub-items via
//!   field-scoped partial writes, with no central lock manager
//! - **Undo**: deletes capture a pre-image that can be replayed within a
//!   bounded window
//!
//! ## Example
//!
//! ```ignore
//! use liveboard::{BackingStore, ChangeFeedClient, MutationGateway};
//! use liveboard::{Announcement, ANNOUNCEMENT_SCHEMA};
//! use std::sync::Arc;
//!
//! let store = Arc::new(BackingStore::new());
//! let gateway = MutationGateway::new(store.clone(), ANNOUNCEMENT_SCHEMA);
//! let client = ChangeFeedClient::subscribe(store, "announcements");
//!
//! gateway.create(Announcement::fields("Field trip", "Friday, bring lunch"))?;
//!
//! client.poll();
//! for record in client.view().iter() {
//!     println!("{}", Announcement::from_record(record).title);
//! }
//! ```

pub mod attachments;
pub mod claims;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod notify;
pub mod payments;
pub mod store;
pub mod tasks;
pub mod types;
pub mod undo;
pub mod view;
pub mod writes;

// Re-exports
pub use attachments::{
    attachment_path, attachment_prefix, unique_name, AttachmentRef, AttachmentStore,
    FsAttachmentStore,
};
pub use claims::{ClaimArbiter, ClaimOutcome, ASSIGNMENTS_FIELD};
pub use error::{Result, SyncError};
pub use feed::{ChangeFeedClient, DropReason, FeedConfig, FeedEvent, FeedHandle, FeedId, FeedManager};
pub use gateway::{CollectionSchema, MutationGateway};
pub use model::{
    collections, Announcement, ClaimRecord, MaterialRequest, PaymentObligation, Task,
    ANNOUNCEMENT_SCHEMA, MATERIAL_SCHEMA, PAYMENT_SCHEMA, TASK_SCHEMA,
};
pub use normalize::{normalize_id_list, remove_id, union_id};
pub use notify::{LogNotifier, Notice, NoticeAction, Notifier};
pub use payments::PaymentLedger;
pub use store::BackingStore;
pub use tasks::TaskBoard;
pub use types::{Fields, Identity, Record, RecordId, Role, Timestamp};
pub use undo::{UndoCoordinator, UndoToken, UNDO_WINDOW};
pub use view::CollectionView;
pub use writes::{apply_write, FieldPath, FieldWrite, RecordUpdate};
