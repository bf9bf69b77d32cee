//! Core types for the record board.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a record.
///
/// Assigned once by the backing store at creation, stable for the record's
/// lifetime, never reused. A record restored through undo receives a fresh id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Named field values of a record, in deterministic key order.
pub type Fields = BTreeMap<String, Value>;

/// A single record in a collection.
///
/// The generic envelope every specialization decodes from. Records are
/// immutable-by-replacement: a committed mutation produces a new `fields`
/// value, never an in-place edit visible before commit. `created_at` is
/// assigned by the store and never updated afterward, even across field
/// updates; collections present records in `created_at` descending order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier (assigned by store).
    pub id: RecordId,

    /// Monotonic creation marker (assigned by store, used as the sort key).
    pub created_at: Timestamp,

    /// Application-defined field values.
    pub fields: Fields,
}

impl Record {
    /// Get a field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Get a field as a string slice, if it is one.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Role of a participant, resolved by the external identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Standard,
}

/// Identity context for the current session.
///
/// Yielded by the external identity provider and passed explicitly into every
/// claim/settle/delete call. The core never caches it beyond the current call
/// and keeps no ambient "current user" state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub participant_id: String,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(
        participant_id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
