//! Reversible deletes: pre-image capture and bounded-window undo.
//!
//! The pre-image returned by a delete is the only copy of the lost content:
//! it is not persisted anywhere, and losing the token (e.g. a crash between
//! capture and undo) loses the undo opportunity permanently. A restored
//! record is a faithful *content* restoration, not an undelete: it receives a
//! new id and a new `created_at`, and anything keyed by the old id (such as
//! attachment paths) is not relinked.

use crate::error::Result;
use crate::gateway::MutationGateway;
use crate::notify::{Notice, Notifier};
use crate::types::{Record, RecordId};
use std::time::{Duration, Instant};

/// How long an undo affordance stays invocable.
pub const UNDO_WINDOW: Duration = Duration::from_millis(4500);

/// A captured pre-image, redeemable for a restoration until the window
/// lapses.
pub struct UndoToken {
    pre_image: Record,
    expires_at: Instant,
}

impl UndoToken {
    /// The deleted record as it was at capture time.
    pub fn pre_image(&self) -> &Record {
        &self.pre_image
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Capture-and-delete with a bounded undo window.
#[derive(Clone)]
pub struct UndoCoordinator {
    gateway: MutationGateway,
    window: Duration,
}

impl UndoCoordinator {
    pub fn new(gateway: MutationGateway) -> Self {
        Self::with_window(gateway, UNDO_WINDOW)
    }

    /// Use a non-default undo window.
    pub fn with_window(gateway: MutationGateway, window: Duration) -> Self {
        Self { gateway, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Delete a record, capturing its pre-image first.
    ///
    /// Returns `None` when the record no longer existed (already deleted by a
    /// race); there is nothing to undo then.
    pub fn capture_and_delete(&self, id: RecordId) -> Result<Option<UndoToken>> {
        let pre_image = match self.gateway.delete(id)? {
            Some(record) => record,
            None => return Ok(None),
        };

        Ok(Some(UndoToken {
            pre_image,
            expires_at: Instant::now() + self.window,
        }))
    }

    /// Redeem a token: re-create equivalent content from the pre-image
    /// fields (minus the old id). Returns the new record's id, or `None`
    /// when the window has lapsed.
    pub fn undo(&self, token: UndoToken) -> Result<Option<RecordId>> {
        if token.expired() {
            return Ok(None);
        }
        let id = self.gateway.create(token.pre_image.fields)?;
        Ok(Some(id))
    }

    /// Post a notice with an action that performs the undo when invoked.
    /// The notice itself is fire-and-forget; whether the action is still
    /// honored is decided by the token's window at invocation time.
    pub fn offer_undo(&self, notifier: &dyn Notifier, message: &str, token: UndoToken) {
        let coordinator = self.clone();
        notifier.notify(Notice::with_action(message, "Undo", move || {
            if let Err(err) = coordinator.undo(token) {
                tracing::warn!(target: "liveboard::undo", error = %err, "undo failed");
            }
        }));
    }
}
