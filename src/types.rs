//! Typed values and records.
//!
//! A [`Record`] holds one [`PlanValue`] per field. Plan records may contain
//! unknown values; state records read back from the server only contain
//! null or present values.

use crate::schema::{FieldKind, ResourceSchema};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Marker string that denotes an unknown value inside a plan document.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// A concrete field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit integer.
    Int(i64),
    /// A string value (also used for enum strings).
    String(String),
    /// A set of strings (also used for enum string sets).
    StringSet(BTreeSet<String>),
}

impl FieldValue {
    /// Build a set value from any iterator of strings.
    pub fn set<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringSet(members.into_iter().map(Into::into).collect())
    }

    /// Whether this is an empty string or an empty set.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::StringSet(set) => set.is_empty(),
            Self::Bool(_) | Self::Int(_) => false,
        }
    }

    /// String encoding used in update operations.
    pub fn encode(&self) -> Vec<String> {
        match self {
            Self::Bool(b) => vec![b.to_string()],
            Self::Int(i) => vec![i.to_string()],
            Self::String(s) => vec![s.clone()],
            Self::StringSet(set) => set.iter().cloned().collect(),
        }
    }

    /// JSON representation used in plan, state and remote documents.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::String(s) => Value::String(s.clone()),
            Self::StringSet(set) => Value::Array(set.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Tri-state value of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlanValue {
    /// Not yet determined; the remote value is left alone.
    #[default]
    Unknown,
    /// Explicitly absent.
    Null,
    /// Present with a concrete value.
    Present(FieldValue),
}

static UNKNOWN: PlanValue = PlanValue::Unknown;
static NULL: PlanValue = PlanValue::Null;

impl PlanValue {
    /// Wrap a concrete value.
    pub fn present(value: impl Into<FieldValue>) -> Self {
        Self::Present(value.into())
    }

    /// Whether the value is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether the value is explicitly null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The concrete value, if present.
    pub fn as_present(&self) -> Option<&FieldValue> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Whether this value, compared as a `kind` field, means "nothing".
    ///
    /// Null always does. For set fields the empty set does too.
    pub fn is_absent_for(&self, kind: FieldKind) -> bool {
        match self {
            Self::Null => true,
            Self::Present(FieldValue::StringSet(set)) => kind.is_set() && set.is_empty(),
            _ => false,
        }
    }

    /// Field-kind-aware equality of two known values.
    ///
    /// Sets compare by membership, and for set fields null equals the empty set.
    /// Unknown values are never equivalent to anything.
    pub fn equivalent(&self, other: &PlanValue, kind: FieldKind) -> bool {
        match (self, other) {
            (Self::Unknown, _) | (_, Self::Unknown) => false,
            (a, b) if a.is_absent_for(kind) && b.is_absent_for(kind) => true,
            (Self::Present(a), Self::Present(b)) => a == b,
            _ => false,
        }
    }
}

/// A mapping from internal field name to tri-state value.
///
/// Fields missing from the map read as [`PlanValue::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: BTreeMap<String, PlanValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: PlanValue) -> Self {
        self.set(name, value);
        self
    }

    /// Set the value of a field.
    pub fn set(&mut self, name: impl Into<String>, value: PlanValue) {
        self.values.insert(name.into(), value);
    }

    /// Get the value of a field; missing fields are unknown.
    pub fn get(&self, name: &str) -> &PlanValue {
        self.values.get(name).unwrap_or(&UNKNOWN)
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<PlanValue> {
        self.values.remove(name)
    }

    /// Number of fields held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether this record satisfies every opinion expressed by `plan`.
    ///
    /// Unknown plan fields, and null or empty plan fields whose descriptor
    /// treats empty as unset, impose nothing. Every other plan field must be
    /// equivalent to this record's value.
    pub fn satisfies(&self, schema: &ResourceSchema, plan: &Record) -> bool {
        schema.fields.iter().all(|field| {
            let wanted = plan.get(&field.name);
            match wanted {
                PlanValue::Unknown => true,
                PlanValue::Null if field.empty_as_unset => true,
                PlanValue::Present(v) if field.empty_as_unset && v.is_empty() => true,
                _ => {
                    let actual = match self.get(&field.name) {
                        PlanValue::Unknown => &NULL,
                        other => other,
                    };
                    wanted.equivalent(actual, field.kind)
                },
            }
        })
    }
}

impl FromIterator<(String, PlanValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, PlanValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
