//! Mutation gateway: validation and submission.

use crate::error::{Result, SyncError};
use crate::normalize::normalize_id_list;
use crate::store::BackingStore;
use crate::types::{Fields, Record, RecordId};
use crate::writes::{FieldWrite, RecordUpdate};
use serde_json::Value;
use std::sync::Arc;

/// Shape requirements for one collection.
#[derive(Clone, Copy, Debug)]
pub struct CollectionSchema {
    /// Collection name in the backing store.
    pub collection: &'static str,

    /// Fields that must be present and non-null on create.
    pub required: &'static [&'static str],

    /// Top-level fields holding id lists, canonicalized on every write (the
    /// matching read-side normalization lives in the typed decoders).
    pub id_list_fields: &'static [&'static str],
}

/// Validates and submits mutations for one collection.
///
/// All writes from a participant go through here: required fields are checked
/// before anything reaches the store (a failed validation never submits, so
/// the materialized view stays untouched), and id-list fields are
/// canonicalized so the store only ever receives the array shape.
#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<BackingStore>,
    schema: CollectionSchema,
}

impl MutationGateway {
    pub fn new(store: Arc<BackingStore>, schema: CollectionSchema) -> Self {
        Self { store, schema }
    }

    pub fn collection(&self) -> &'static str {
        self.schema.collection
    }

    /// Validate and commit a new record, returning its store-assigned id.
    /// Never partially creates.
    pub fn create(&self, mut fields: Fields) -> Result<RecordId> {
        for &required in self.schema.required {
            match fields.get(required) {
                None | Some(Value::Null) => return Err(SyncError::missing_field(required)),
                Some(_) => {}
            }
        }

        for field in self.schema.id_list_fields {
            if let Some(value) = fields.get_mut(*field) {
                *value = Value::from(normalize_id_list(value));
            }
        }

        Ok(self.store.create(self.schema.collection, fields).id)
    }

    /// Commit a partial update. Only the field paths present in the payload
    /// are written; an empty payload is a local no-op and is not submitted.
    pub fn update(&self, id: RecordId, mut update: RecordUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        for (path, write) in update.iter_mut() {
            if let FieldWrite::Set(value) = write {
                let is_id_list = path
                    .as_root_field()
                    .map(|root| self.schema.id_list_fields.contains(&root))
                    .unwrap_or(false);
                if is_id_list {
                    *value = Value::from(normalize_id_list(value));
                }
            }
        }

        self.store.update(self.schema.collection, id, &update)
    }

    /// Commit a delete, returning the pre-image, or `None` if a race already
    /// removed the record.
    pub fn delete(&self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.store.delete(self.schema.collection, id))
    }
}
