//! Task board: tasks with binary attachments.

use crate::attachments::{attachment_path, attachment_prefix, unique_name, AttachmentRef, AttachmentStore};
use crate::error::{Result, SyncError};
use crate::feed::ChangeFeedClient;
use crate::gateway::MutationGateway;
use crate::model::{collections, Task};
use crate::types::{Record, RecordId, Timestamp};
use crate::writes::RecordUpdate;
use serde_json::json;
use std::sync::Arc;

/// Task operations, including the attachment lifecycle.
///
/// Attachments are stored under `tasks/{record-id}/...` so that deleting a
/// task can enumerate and purge everything the record owned.
pub struct TaskBoard {
    gateway: MutationGateway,
    client: Arc<ChangeFeedClient>,
    attachments: Arc<dyn AttachmentStore>,
}

impl TaskBoard {
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

    /// Create a task, then upload and link its attachments.
    ///
    /// Two-phase because attachment paths need the record id: the record is
    /// committed first with an empty list, then updated once the uploads
    /// finish. Upload failures surface as `TransientIo` and leave the task in
    /// place with whatever was linked.
    pub fn add_task(
        &self,
        title: &str,
        description: &str,
        due_date: Timestamp,
        files: &[(&str, &[u8])],
    ) -> Result<RecordId> {
        let id = self.gateway.create(Task::fields(title, description, due_date))?;

        if !files.is_empty() {
            let references = self.upload(id, files)?;
            self.gateway
                .update(id, RecordUpdate::new().set("attachments", json!(references)))?;
        }

        Ok(id)
    }

    /// Upload more attachments and append them to the task's list.
    pub fn add_attachments(
        &self,
        id: RecordId,
        files: &[(&str, &[u8])],
    ) -> Result<Vec<AttachmentRef>> {
        self.client.poll();

        let view = self.client.view();
        let record = view.get(id).ok_or(SyncError::NotFound(id))?;
        let current = Task::from_record(record).attachments;

        let uploaded = self.upload(id, files)?;

        let mut combined = current;
        combined.extend(uploaded.iter().cloned());
        self.gateway
            .update(id, RecordUpdate::new().set("attachments", json!(combined)))?;

        Ok(uploaded)
    }

    /// Delete a task and purge its attachments.
    ///
    /// The purge is best effort: the record delete has already committed, so
    /// attachment-store failures are logged and otherwise ignored rather than
    /// surfaced. Returns the pre-image, or `None` if the task was already
    /// gone.
    pub fn delete_task(&self, id: RecordId) -> Result<Option<Record>> {
        let pre_image = self.gateway.delete(id)?;

        if pre_image.is_some() {
            self.purge_attachments(id);
        }

        Ok(pre_image)
    }

    fn upload(&self, id: RecordId, files: &[(&str, &[u8])]) -> Result<Vec<AttachmentRef>> {
        let mut references = Vec::with_capacity(files.len());
        for (filename, bytes) in files {
            let name = unique_name(bytes, filename);
            let path = attachment_path(collections::TASKS, id, &name);
            references.push(self.attachments.put(&path, bytes)?);
        }
        Ok(references)
    }

    fn purge_attachments(&self, id: RecordId) {
        let prefix = attachment_prefix(collections::TASKS, id);
        let references = match self.attachments.list(&prefix) {
            Ok(references) => references,
            Err(err) => {
                tracing::warn!(
                    target: "liveboard::tasks",
                    error = %err,
                    prefix = %prefix,
                    "skipping attachment purge"
                );
                return;
            }
        };

        for reference in references {
            if let Err(err) = self.attachments.delete(&reference) {
                tracing::warn!(
                    target: "liveboard::tasks",
                    error = %err,
                    reference = %reference,
                    "failed to purge attachment"
                );
            }
        }
    }
}
