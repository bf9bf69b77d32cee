//! Payment ledger: settlement tracking and receipt evidence.

use crate::attachments::{attachment_path, unique_name, AttachmentRef, AttachmentStore};
use crate::error::{Result, SyncError};
use crate::feed::ChangeFeedClient;
use crate::gateway::MutationGateway;
use crate::model::{collections, PaymentObligation};
use crate::normalize::{remove_id, union_id};
use crate::types::RecordId;
use crate::writes::{FieldPath, RecordUpdate};
use serde_json::json;
use std::sync::Arc;

/// Settlement and receipt operations over the payments collection.
///
/// `settled_by` membership is the sole source of truth for "has this
/// participant paid". Receipts are evidence only: attaching one never marks
/// settlement; an admin still settles explicitly after reviewing it.
pub struct PaymentLedger {
    gateway: MutationGateway,
    client: Arc<ChangeFeedClient>,
    attachments: Arc<dyn AttachmentStore>,
}

impl PaymentLedger {
    pub fn new(
        gateway: MutationGateway,
        client: Arc<ChangeFeedClient>,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            gateway,
            client,
            attachments,
        }
    }

    /// Create a payment obligation.
    pub fn add_payment(&self, concept: &str, amount: f64) -> Result<RecordId> {
        // amount >= 0.0 is false for NaN too
        if !(amount >= 0.0) {
            return Err(SyncError::Validation {
                field: "amount".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        self.gateway.create(PaymentObligation::fields(concept, amount))
    }

    /// Mark a participant as settled. Idempotent: set union, never a
    /// duplicate entry.
    pub fn settle(&self, id: RecordId, participant_id: &str) -> Result<()> {
        self.client.poll();
        let payment = self.payment(id)?;

        if payment.is_settled_by(participant_id) {
            return Ok(());
        }

        let settled = union_id(&payment.settled_by, participant_id);
        self.gateway
            .update(id, RecordUpdate::new().set("settled_by", json!(settled)))
    }

    /// Remove a participant from the settled set.
    pub fn unsettle(&self, id: RecordId, participant_id: &str) -> Result<()> {
        self.client.poll();
        let payment = self.payment(id)?;

        if !payment.is_settled_by(participant_id) {
            return Ok(());
        }

        let settled = remove_id(&payment.settled_by, participant_id);
        self.gateway
            .update(id, RecordUpdate::new().set("settled_by", json!(settled)))
    }

    /// Store receipt evidence for a participant and link it on the record.
    /// Does not alter `settled_by`.
    pub fn attach_receipt(
        &self,
        id: RecordId,
        participant_id: &str,
        bytes: &[u8],
        filename: &str,
    ) -> Result<AttachmentRef> {
        self.client.poll();
        self.payment(id)?;

        let name = format!("{}_{}", participant_id, unique_name(bytes, filename));
        let reference = self
            .attachments
            .put(&attachment_path(collections::PAYMENTS, id, &name), bytes)?;

        self.gateway.update(
            id,
            RecordUpdate::new().set(
                FieldPath::new(["receipts", participant_id]),
                json!(reference.as_str()),
            ),
        )?;

        Ok(reference)
    }

    fn payment(&self, id: RecordId) -> Result<PaymentObligation> {
        let view = self.client.view();
        let record = view.get(id).ok_or(SyncError::NotFound(id))?;
        Ok(PaymentObligation::from_record(record))
    }
}
