//! Plan/state reconciliation.
//!
//! [`reconcile`] compares a plan record against a state record, field by
//! field in schema declaration order, and produces the minimal list of
//! [`UpdateOperation`]s that moves the remote object toward the plan. An
//! empty list means the object is already converged and no remote call is
//! needed.
//!
//! # Example
//!
//! ```
//! use dsconfig_provider_sdk::operations::{reconcile, OperationKind};
//! use dsconfig_provider_sdk::schema::{FieldDescriptor, ResourceSchema};
//! use dsconfig_provider_sdk::types::{FieldValue, PlanValue, Record};
//!
//! let schema = ResourceSchema::v0()
//!     .with_field(FieldDescriptor::optional_bool("enabled"))
//!     .with_field(FieldDescriptor::optional_string_set("default_severity"));
//!
//! let state = Record::new()
//!     .with("enabled", PlanValue::present(false))
//!     .with("default_severity", PlanValue::present(FieldValue::set(["error", "warning"])));
//! let plan = Record::new()
//!     .with("enabled", PlanValue::present(true))
//!     .with("default_severity", PlanValue::present(FieldValue::set(["warning", "notice"])));
//!
//! let ops = reconcile(&schema, &plan, &state);
//! assert_eq!(ops.len(), 3);
//! assert_eq!(ops[0].kind, OperationKind::Replace);
//! assert_eq!(ops[0].values, vec!["true"]);
//! assert_eq!(ops[1].kind, OperationKind::AddSetMembers);
//! assert_eq!(ops[2].kind, OperationKind::RemoveSetMembers);
//! ```

use crate::error::ProviderError;
use crate::schema::{FieldDescriptor, FieldKind, ResourceSchema};
use crate::types::{FieldValue, PlanValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// The kind of a field-level update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    /// Replace the field's value.
    Replace,
    /// Add members to a set field.
    AddSetMembers,
    /// Remove members from a set field.
    RemoveSetMembers,
    /// Clear the field.
    Remove,
}

/// One field-level instruction sent to the remote configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "WireOperation", from = "WireOperation")]
pub struct UpdateOperation {
    /// What to do.
    pub kind: OperationKind,
    /// External (kebab-case) field name.
    pub field: String,
    /// String-encoded values; empty for [`OperationKind::Remove`].
    pub values: Vec<String>,
}

impl UpdateOperation {
    /// Create a new operation.
    pub fn new(kind: OperationKind, field: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            values,
        }
    }

    /// Create a replace operation.
    pub fn replace(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(OperationKind::Replace, field, values)
    }

    /// Create an add-members operation.
    pub fn add(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(OperationKind::AddSetMembers, field, values)
    }

    /// Create a remove-members operation.
    pub fn remove_members(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(OperationKind::RemoveSetMembers, field, values)
    }

    /// Create an operation that clears the field.
    pub fn remove(field: impl Into<String>) -> Self {
        Self::new(OperationKind::Remove, field, Vec::new())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireVerb {
    Replace,
    Add,
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireOperation {
    operation: WireVerb,
    attribute: String,
    #[serde(default)]
    values: Vec<String>,
}

impl From<UpdateOperation> for WireOperation {
    fn from(op: UpdateOperation) -> Self {
        let operation = match op.kind {
            OperationKind::Replace => WireVerb::Replace,
            OperationKind::AddSetMembers => WireVerb::Add,
            OperationKind::RemoveSetMembers | OperationKind::Remove => WireVerb::Remove,
        };
        Self {
            operation,
            attribute: op.field,
            values: op.values,
        }
    }
}

impl From<WireOperation> for UpdateOperation {
    fn from(wire: WireOperation) -> Self {
        let kind = match wire.operation {
            WireVerb::Replace => OperationKind::Replace,
            WireVerb::Add => OperationKind::AddSetMembers,
            WireVerb::Remove if wire.values.is_empty() => OperationKind::Remove,
            WireVerb::Remove => OperationKind::RemoveSetMembers,
        };
        Self::new(kind, wire.attribute, wire.values)
    }
}

/// PATCH body carrying an operation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateRequest {
    /// Operations in the order they were produced.
    pub operations: Vec<UpdateOperation>,
}

impl UpdateRequest {
    /// Wrap an operation list.
    pub fn new(operations: Vec<UpdateOperation>) -> Self {
        Self { operations }
    }

    /// Whether the request carries nothing to do.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Compute the operations that move `state` toward `plan`.
///
/// Fields are visited in `schema` declaration order and each field yields at
/// most one replace, one add/remove pair, or one clear. Unknown plan fields
/// never produce an operation.
pub fn reconcile(schema: &ResourceSchema, plan: &Record, state: &Record) -> Vec<UpdateOperation> {
    let mut ops = Vec::new();
    for field in &schema.fields {
        reconcile_field(field, plan.get(&field.name), state.get(&field.name), &mut ops);
    }
    ops
}

fn reconcile_field(
    field: &FieldDescriptor,
    plan: &PlanValue,
    state: &PlanValue,
    ops: &mut Vec<UpdateOperation>,
) {
    let desired = match plan {
        PlanValue::Unknown => return,
        PlanValue::Null if field.empty_as_unset => return,
        PlanValue::Present(v) if field.empty_as_unset && v.is_empty() => return,
        PlanValue::Null => None,
        PlanValue::Present(v) => Some(v),
    };

    let before = ops.len();
    match desired {
        None => {
            if !state.is_unknown() && !state.is_absent_for(field.kind) {
                ops.push(UpdateOperation::remove(&field.api_name));
            }
        },
        Some(want) if field.kind.is_set() => {
            let empty = BTreeSet::new();
            let want = members(Some(want), &empty);
            let have = members(state.as_present(), &empty);

            let added: Vec<String> = want.difference(have).cloned().collect();
            let removed: Vec<String> = have.difference(want).cloned().collect();
            if !added.is_empty() {
                ops.push(UpdateOperation::add(&field.api_name, added));
            }
            if !removed.is_empty() {
                ops.push(UpdateOperation::remove_members(&field.api_name, removed));
            }
        },
        Some(want) => {
            if state.as_present() != Some(want) {
                ops.push(UpdateOperation::replace(&field.api_name, want.encode()));
            }
        },
    }

    for op in &ops[before..] {
        debug!(
            operation = ?op.kind,
            attribute = %op.field,
            values = %display_values(field, &op.values),
            "Update operation required"
        );
    }
}

fn members<'a>(value: Option<&'a FieldValue>, empty: &'a BTreeSet<String>) -> &'a BTreeSet<String> {
    match value {
        Some(FieldValue::StringSet(set)) => set,
        _ => empty,
    }
}

fn display_values(field: &FieldDescriptor, values: &[String]) -> String {
    if field.flags.sensitive {
        "(sensitive)".to_string()
    } else {
        format!("{:?}", values)
    }
}

/// Render an operation list for logs, redacting sensitive values.
pub fn summarize(schema: &ResourceSchema, ops: &[UpdateOperation]) -> String {
    if ops.is_empty() {
        return "no changes".to_string();
    }
    ops.iter()
        .map(|op| {
            let verb = match op.kind {
                OperationKind::Replace => "replace",
                OperationKind::AddSetMembers => "add",
                OperationKind::RemoveSetMembers | OperationKind::Remove => "remove",
            };
            let sensitive = schema
                .field_by_api_name(&op.field)
                .is_some_and(|f| f.flags.sensitive);
            if op.values.is_empty() {
                format!("{} {}", verb, op.field)
            } else if sensitive {
                format!("{} {}=(sensitive)", verb, op.field)
            } else {
                format!("{} {}={:?}", verb, op.field, op.values)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Apply an operation list to a record the way the remote store does.
///
/// Fails with [`ProviderError::InvalidRequest`] when an operation names an
/// unknown attribute, uses the wrong arity, targets a scalar with a set
/// operation, or carries a value that does not parse for the field kind.
pub fn apply_operations(
    schema: &ResourceSchema,
    state: &Record,
    ops: &[UpdateOperation],
) -> Result<Record, ProviderError> {
    let mut record = state.clone();
    for op in ops {
        let field = schema.field_by_api_name(&op.field).ok_or_else(|| {
            ProviderError::InvalidRequest(format!("unknown attribute '{}'", op.field))
        })?;

        let next = match op.kind {
            OperationKind::Remove => {
                if !op.values.is_empty() {
                    return Err(ProviderError::InvalidRequest(format!(
                        "clearing '{}' takes no values",
                        op.field
                    )));
                }
                PlanValue::Null
            },
            OperationKind::Replace if field.kind.is_set() => {
                check_members(field, &op.values)?;
                PlanValue::present(FieldValue::set(op.values.iter().cloned()))
            },
            OperationKind::Replace => match op.values.as_slice() {
                [value] => PlanValue::Present(parse_scalar(field, value)?),
                _ => {
                    return Err(ProviderError::InvalidRequest(format!(
                        "replacing '{}' takes exactly one value, got {}",
                        op.field,
                        op.values.len()
                    )))
                },
            },
            OperationKind::AddSetMembers | OperationKind::RemoveSetMembers => {
                if !field.kind.is_set() {
                    return Err(ProviderError::InvalidRequest(format!(
                        "'{}' is not a set attribute",
                        op.field
                    )));
                }
                check_members(field, &op.values)?;
                let empty = BTreeSet::new();
                let mut set = members(record.get(&field.name).as_present(), &empty).clone();
                if op.kind == OperationKind::AddSetMembers {
                    set.extend(op.values.iter().cloned());
                } else {
                    for value in &op.values {
                        set.remove(value);
                    }
                }
                PlanValue::Present(FieldValue::StringSet(set))
            },
        };
        record.set(field.name.clone(), next);
    }
    Ok(record)
}

fn check_members(field: &FieldDescriptor, values: &[String]) -> Result<(), ProviderError> {
    match values.iter().find(|v| !field.accepts(v)) {
        Some(bad) => Err(ProviderError::InvalidRequest(format!(
            "'{}' is not a valid value for '{}'",
            bad, field.api_name
        ))),
        None => Ok(()),
    }
}

fn parse_scalar(field: &FieldDescriptor, value: &str) -> Result<FieldValue, ProviderError> {
    let invalid = || {
        ProviderError::InvalidRequest(format!(
            "'{}' is not a valid {} for '{}'",
            value,
            field.kind.type_name(),
            field.api_name
        ))
    };
    match field.kind {
        FieldKind::Bool => value.parse::<bool>().map(FieldValue::Bool).map_err(|_| invalid()),
        FieldKind::Int => value.parse::<i64>().map(FieldValue::Int).map_err(|_| invalid()),
        FieldKind::EnumString if !field.accepts(value) => Err(invalid()),
        FieldKind::String | FieldKind::EnumString => Ok(FieldValue::String(value.to_string())),
        FieldKind::StringSet | FieldKind::EnumStringSet => Err(invalid()),
    }
}
