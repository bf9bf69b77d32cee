//! Typed views over the generic record envelope.
//!
//! Specializations decode from `Record.fields` with documented defaults for
//! malformed or partial data (an empty string, list, or map per field)
//! rather than failing the whole snapshot. Field builders produce the
//! `Fields` payloads the mutation gateway expects.

use crate::attachments::AttachmentRef;
use crate::gateway::CollectionSchema;
use crate::normalize::normalize_id_list;
use crate::types::{Fields, Record, RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Collection names used by the board.
pub mod collections {
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const MATERIALS: &str = "materials";
    pub const TASKS: &str = "tasks";
    pub const PAYMENTS: &str = "payments";
}

pub const ANNOUNCEMENT_SCHEMA: CollectionSchema = CollectionSchema {
    collection: collections::ANNOUNCEMENTS,
    required: &["title", "description"],
    id_list_fields: &[],
};

pub const MATERIAL_SCHEMA: CollectionSchema = CollectionSchema {
    collection: collections::MATERIALS,
    required: &["title", "description", "items"],
    id_list_fields: &[],
};

pub const TASK_SCHEMA: CollectionSchema = CollectionSchema {
    collection: collections::TASKS,
    required: &["title", "description", "due_date"],
    id_list_fields: &[],
};

pub const PAYMENT_SCHEMA: CollectionSchema = CollectionSchema {
    collection: collections::PAYMENTS,
    required: &["concept", "amount"],
    id_list_fields: &["settled_by"],
};

// --- Decode helpers (defaults for malformed fields) ---

fn text(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(fields: &Fields, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(fields: &Fields, key: &str) -> BTreeMap<String, String> {
    fields
        .get(key)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

// --- Announcements ---

/// A plain announcement: title and body, nothing claimable.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub title: String,
    pub description: String,
}

impl Announcement {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            title: text(&record.fields, "title"),
            description: text(&record.fields, "description"),
        }
    }

    /// Field payload for `create`.
    pub fn fields(title: &str, description: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("description".to_string(), json!(description));
        fields
    }
}

// --- Materials ---

/// One exclusive hold over one indexed item of a material request.
///
/// `claimant_name` is the display name captured at claim time and is NOT
/// re-resolved later; a rename after claiming does not update existing
/// claims. `claimant_id` is `None` only for claims recorded anonymously by
/// older writers; the arbiter itself always records the caller's id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    #[serde(default)]
    pub claimant_id: Option<String>,
    #[serde(default)]
    pub claimant_name: String,
}

/// A shareable request for materials, with claimable items.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialRequest {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub title: String,
    pub description: String,
    /// Append-only item list (from the participant's perspective).
    pub items: Vec<String>,
    /// Item-index (as string) to claim. Independent of `items`: removing an
    /// item does not prune its assignment, and an orphaned entry is tolerated.
    pub assignments: BTreeMap<String, ClaimRecord>,
}

impl MaterialRequest {
    pub fn from_record(record: &Record) -> Self {
        let assignments = record
            .fields
            .get("assignments")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| {
                        serde_json::from_value::<ClaimRecord>(v.clone())
                            .ok()
                            .map(|claim| (k.clone(), claim))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: record.id,
            created_at: record.created_at,
            title: text(&record.fields, "title"),
            description: text(&record.fields, "description"),
            items: string_list(&record.fields, "items"),
            assignments,
        }
    }

    /// Field payload for `create`. Duplicate items are suppressed
    /// (case-sensitively) here, at the input layer.
    pub fn fields(title: &str, description: &str, items: &[String]) -> Fields {
        let mut deduped: Vec<&String> = Vec::with_capacity(items.len());
        for item in items {
            if !deduped.iter().any(|existing| *existing == item) {
                deduped.push(item);
            }
        }

        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("description".to_string(), json!(description));
        fields.insert("items".to_string(), json!(deduped));
        fields.insert("assignments".to_string(), json!({}));
        fields
    }

    /// The claim on one item index, if any.
    pub fn assignment(&self, index: usize) -> Option<&ClaimRecord> {
        self.assignments.get(&index.to_string())
    }
}

// --- Tasks ---

/// A task with a due date and binary attachments.
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub title: String,
    pub description: String,
    pub due_date: Option<Timestamp>,
    pub attachments: Vec<AttachmentRef>,
}

impl Task {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            title: text(&record.fields, "title"),
            description: text(&record.fields, "description"),
            due_date: record
                .fields
                .get("due_date")
                .and_then(Value::as_i64)
                .map(Timestamp),
            attachments: string_list(&record.fields, "attachments")
                .into_iter()
                .map(AttachmentRef)
                .collect(),
        }
    }

    /// Field payload for `create`. Attachments start empty; they are linked
    /// after upload.
    pub fn fields(title: &str, description: &str, due_date: Timestamp) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), json!(title));
        fields.insert("description".to_string(), json!(description));
        fields.insert("due_date".to_string(), json!(due_date.0));
        fields.insert("attachments".to_string(), json!([]));
        fields
    }
}

// --- Payments ---

/// A payment obligation tracked per participant.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentObligation {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub concept: String,
    pub amount: f64,
    /// Membership here is the sole source of truth for "has settled".
    pub settled_by: Vec<String>,
    /// Uploaded evidence, keyed by participant. Entries exist independently
    /// of `settled_by` membership: uploading a receipt does not settle.
    pub receipts: BTreeMap<String, AttachmentRef>,
}

impl PaymentObligation {
    pub fn from_record(record: &Record) -> Self {
        // Read-side canonicalization: the store may hold the settled set as
        // an array or an object of values, depending on the writer.
        let settled_by = record
            .fields
            .get("settled_by")
            .map(normalize_id_list)
            .unwrap_or_default();

        Self {
            id: record.id,
            created_at: record.created_at,
            concept: text(&record.fields, "concept"),
            amount: record
                .fields
                .get("amount")
                .and_then(Value::as_f64)
                .unwrap_or_default(),
            settled_by,
            receipts: string_map(&record.fields, "receipts")
                .into_iter()
                .map(|(k, v)| (k, AttachmentRef(v)))
                .collect(),
        }
    }

    /// Field payload for `create`.
    pub fn fields(concept: &str, amount: f64) -> Fields {
        let mut fields = Fields::new();
        fields.insert("concept".to_string(), json!(concept));
        fields.insert("amount".to_string(), json!(amount));
        fields.insert("settled_by".to_string(), json!([]));
        fields.insert("receipts".to_string(), json!({}));
        fields
    }

    pub fn is_settled_by(&self, participant_id: &str) -> bool {
        self.settled_by.iter().any(|id| id == participant_id)
    }
}
