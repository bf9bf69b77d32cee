//! Field-path-scoped partial writes.
//!
//! An update payload lists exactly the field paths it touches; paths absent
//! from the payload are left untouched server-side. This keeps "not provided"
//! distinct from "set to empty", and lets concurrent writes to disjoint paths
//! commit without conflicting (each path is independently addressed; the last
//! write to the *same* path wins).

use serde_json::{Map, Value};

use crate::types::Fields;

/// A dotted path addressing one field, possibly nested inside map-valued
/// fields (e.g. `assignments.0`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build a path from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPath(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        FieldPath(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The top-level field name this path addresses, when it is not nested.
    pub fn as_root_field(&self) -> Option<&str> {
        match self.0.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        FieldPath::parse(&path)
    }
}

/// One write at a field path.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldWrite {
    /// Replace the value at the path (creating intermediate maps as needed).
    Set(Value),

    /// Remove the entry at the path. Missing intermediates make this a no-op.
    Delete,
}

/// A partial update: the ordered set of field paths to write.
///
/// Only the paths present here are written; everything else on the record is
/// left as committed. An empty update is a local no-op and is never submitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordUpdate {
    writes: Vec<(FieldPath, FieldWrite)>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a set-write at a path.
    pub fn set(mut self, path: impl Into<FieldPath>, value: Value) -> Self {
        self.writes.push((path.into(), FieldWrite::Set(value)));
        self
    }

    /// Add a delete-write at a path.
    pub fn delete(mut self, path: impl Into<FieldPath>) -> Self {
        self.writes.push((path.into(), FieldWrite::Delete));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FieldPath, FieldWrite)> {
        self.writes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut (FieldPath, FieldWrite)> {
        self.writes.iter_mut()
    }
}

/// Apply one write to a record's fields.
///
/// Paths with no segments are ignored. A set-write through a non-map
/// intermediate replaces that intermediate with a map; a delete-write through
/// a missing or non-map intermediate is a no-op.
pub fn apply_write(fields: &mut Fields, path: &FieldPath, write: &FieldWrite) {
    let (first, rest) = match path.segments().split_first() {
        Some(parts) => parts,
        None => return,
    };

    if rest.is_empty() {
        match write {
            FieldWrite::Set(value) => {
                fields.insert(first.clone(), value.clone());
            }
            FieldWrite::Delete => {
                fields.remove(first);
            }
        }
        return;
    }

    match write {
        FieldWrite::Set(_) => {
            let slot = fields
                .entry(first.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            apply_nested(slot, rest, write);
        }
        FieldWrite::Delete => {
            if let Some(slot) = fields.get_mut(first) {
                apply_nested(slot, rest, write);
            }
        }
    }
}

fn apply_nested(value: &mut Value, segments: &[String], write: &FieldWrite) {
    let (first, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return,
    };

    if !value.is_object() {
        match write {
            FieldWrite::Set(_) => *value = Value::Object(Map::new()),
            FieldWrite::Delete => return,
        }
    }
    let map = match value {
        Value::Object(map) => map,
        _ => return,
    };

    if rest.is_empty() {
        match write {
            FieldWrite::Set(new_value) => {
                map.insert(first.clone(), new_value.clone());
            }
            FieldWrite::Delete => {
                map.remove(first);
            }
        }
        return;
    }

    match write {
        FieldWrite::Set(_) => {
            let slot = map
                .entry(first.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            apply_nested(slot, rest, write);
        }
        FieldWrite::Delete => {
            if let Some(slot) = map.get_mut(first) {
                apply_nested(slot, rest, write);
            }
        }
    }
}
