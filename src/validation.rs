//! Schema validation and document conversion.
//!
//! Plan and state documents are JSON objects keyed by internal field names.
//! Remote documents returned by the configuration API are keyed by external
//! (kebab-case) names. This module validates both against a
//! [`ResourceSchema`] and converts them to and from typed [`Record`]s.
//!
//! # Example
//!
//! ```
//! use dsconfig_provider_sdk::schema::{FieldDescriptor, ResourceSchema};
//! use dsconfig_provider_sdk::validation::validate;
//! use serde_json::json;
//!
//! let schema = ResourceSchema::v0()
//!     .with_field(FieldDescriptor::required_bool("enabled"))
//!     .with_field(FieldDescriptor::optional_enum("output_location", ["standard-output", "standard-error"]));
//!
//! let diagnostics = validate(&schema, &json!({"enabled": true, "output_location": "standard-error"}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"enabled": true, "output_location": "printer"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("output_location".to_string()));
//! ```

use crate::error::ProviderError;
use crate::schema::{Diagnostic, DiagnosticSeverity, FieldDescriptor, FieldKind, ResourceSchema};
use crate::types::{FieldValue, PlanValue, Record, UNKNOWN_VALUE};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Validate a plan or configuration document against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required fields must be present and non-null
/// - Computed-only fields are skipped (the server sets these)
/// - Values must match the field kind; enum values must be accepted
/// - The unknown-value marker is accepted for any field
/// - Keys that name no field are rejected
pub fn validate(schema: &ResourceSchema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let obj = match value {
        Value::Object(map) => map,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    for field in &schema.fields {
        validate_field(field, obj.get(&field.name), &mut diagnostics);
    }

    for key in obj.keys() {
        if schema.field(key).is_none() {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", key))
                    .with_detail("The schema does not declare this attribute")
                    .with_attribute(key.as_str()),
            );
        }
    }

    diagnostics
}

/// Validate a document, returning Ok if valid or Err with diagnostics.
///
/// This is a convenience wrapper around [`validate`] that returns a Result.
pub fn validate_result(schema: &ResourceSchema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a document is valid against a schema.
pub fn is_valid(schema: &ResourceSchema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_field(field: &FieldDescriptor, value: Option<&Value>, diagnostics: &mut Vec<Diagnostic>) {
    if field.is_read_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if field.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", field.name))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(field.name.as_str()),
                );
            }
        },
        Some(Value::String(s)) if s == UNKNOWN_VALUE => {},
        Some(v) => {
            if let Err(err) = decode(field, v) {
                diagnostics.push(err.into_diagnostic(&field.name));
            }
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Naming {
    Internal,
    External,
}

impl Naming {
    fn key(self, field: &FieldDescriptor) -> &str {
        match self {
            Self::Internal => &field.name,
            Self::External => &field.api_name,
        }
    }
}

/// Parse a plan document into a record.
///
/// Missing keys stay missing (unknown), `null` becomes [`PlanValue::Null`]
/// and the unknown-value marker becomes [`PlanValue::Unknown`]. Computed-only
/// fields belong to the server and are always left unknown.
///
/// # Errors
///
/// [`ProviderError::UnrecognizedEnumValue`] for enum strings outside the
/// accepted set, [`ProviderError::Validation`] for anything else.
pub fn parse_plan(schema: &ResourceSchema, value: &Value) -> Result<Record, ProviderError> {
    let obj = as_object(value)?;
    reject_unsupported(schema, obj)?;

    let mut record = Record::new();
    for field in schema.fields.iter().filter(|f| !f.is_read_only()) {
        let parsed = match obj.get(&field.name) {
            None => continue,
            Some(Value::Null) => PlanValue::Null,
            Some(Value::String(s)) if s == UNKNOWN_VALUE => PlanValue::Unknown,
            Some(v) => PlanValue::Present(decode(field, v).map_err(|e| e.into_error(&field.name))?),
        };
        record.set(field.name.clone(), parsed);
    }
    Ok(record)
}

/// Parse a persisted state document (internal names) into a record.
///
/// Missing keys become null.
pub fn parse_state(schema: &ResourceSchema, value: &Value) -> Result<Record, ProviderError> {
    let obj = as_object(value)?;
    reject_unsupported(schema, obj)?;
    parse_concrete(schema, obj, Naming::Internal)
}

/// Parse a document returned by the remote API (external names) into a record.
///
/// Missing keys become null and keys that name no field are ignored.
pub fn parse_remote(schema: &ResourceSchema, value: &Value) -> Result<Record, ProviderError> {
    let obj = as_object(value)?;
    parse_concrete(schema, obj, Naming::External)
}

fn parse_concrete(
    schema: &ResourceSchema,
    obj: &Map<String, Value>,
    naming: Naming,
) -> Result<Record, ProviderError> {
    schema
        .fields
        .iter()
        .map(|field| -> Result<(String, PlanValue), ProviderError> {
            let key = naming.key(field);
            let parsed = match obj.get(key) {
                None | Some(Value::Null) => PlanValue::Null,
                Some(v) => PlanValue::Present(decode(field, v).map_err(|e| e.into_error(key))?),
            };
            Ok((field.name.clone(), parsed))
        })
        .collect()
}

/// Render a record as a state document keyed by internal names.
///
/// Unknown values are written as `null`.
pub fn to_state_document(schema: &ResourceSchema, record: &Record) -> Value {
    let map = schema
        .fields
        .iter()
        .map(|field| {
            let value = record
                .get(&field.name)
                .as_present()
                .map(FieldValue::to_json)
                .unwrap_or(Value::Null);
            (field.name.clone(), value)
        })
        .collect();
    Value::Object(map)
}

/// Render the present fields of a record as a remote document keyed by external names.
pub fn to_remote_document(schema: &ResourceSchema, record: &Record) -> Value {
    let map = schema
        .fields
        .iter()
        .filter_map(|field| {
            let value = record.get(&field.name).as_present()?;
            Some((field.api_name.clone(), value.to_json()))
        })
        .collect();
    Value::Object(map)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ProviderError> {
    value.as_object().ok_or_else(|| {
        ProviderError::Validation(format!("expected object, got {}", value_type_name(value)))
    })
}

fn reject_unsupported(schema: &ResourceSchema, obj: &Map<String, Value>) -> Result<(), ProviderError> {
    match obj.keys().find(|key| schema.field(key).is_none()) {
        Some(key) => Err(ProviderError::Validation(format!(
            "unsupported attribute '{}'",
            key
        ))),
        None => Ok(()),
    }
}

#[derive(Debug)]
enum DecodeError {
    Type { expected: &'static str, got: &'static str },
    Enum { value: String },
}

impl DecodeError {
    fn into_diagnostic(self, path: &str) -> Diagnostic {
        match self {
            Self::Type { expected, got } => type_error(path, expected, got),
            Self::Enum { value } => Diagnostic::error(format!(
                "Invalid value for attribute '{}'",
                path
            ))
            .with_detail(format!("'{}' is not one of the accepted values", value))
            .with_attribute(path),
        }
    }

    fn into_error(self, path: &str) -> ProviderError {
        match self {
            Self::Type { expected, got } => ProviderError::Validation(format!(
                "attribute '{}': expected {}, got {}",
                path, expected, got
            )),
            Self::Enum { value } => ProviderError::UnrecognizedEnumValue {
                attribute: path.to_string(),
                value,
            },
        }
    }
}

fn decode(field: &FieldDescriptor, value: &Value) -> Result<FieldValue, DecodeError> {
    let mismatch = || DecodeError::Type {
        expected: field.kind.type_name(),
        got: value_type_name(value),
    };

    match field.kind {
        FieldKind::Bool => value.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
        FieldKind::Int => as_int64(value).map(FieldValue::Int).ok_or_else(mismatch),
        FieldKind::String | FieldKind::EnumString => {
            let s = value.as_str().ok_or_else(mismatch)?;
            check_enum(field, s)?;
            Ok(FieldValue::String(s.to_string()))
        },
        FieldKind::StringSet | FieldKind::EnumStringSet => {
            let items = value.as_array().ok_or_else(mismatch)?;
            let mut set = BTreeSet::new();
            for item in items {
                let s = item.as_str().ok_or_else(|| DecodeError::Type {
                    expected: "string element",
                    got: value_type_name(item),
                })?;
                check_enum(field, s)?;
                set.insert(s.to_string());
            }
            Ok(FieldValue::StringSet(set))
        },
    }
}

fn check_enum(field: &FieldDescriptor, value: &str) -> Result<(), DecodeError> {
    if field.accepts(value) {
        Ok(())
    } else {
        Err(DecodeError::Enum {
            value: value.to_string(),
        })
    }
}

// Helper functions

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_int64(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n,
        _ => return None,
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    // Integral floats such as 42.0 are accepted. `i64::MAX as f64` is 2^63,
    // one past the largest i64, so the upper bound is exclusive.
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn type_error(path: &str, expected: &str, got: &str) -> Diagnostic {
    Diagnostic {
        severity: DiagnosticSeverity::Error,
        summary: format!("Invalid type for attribute '{}'", path),
        detail: Some(format!("Expected {}, got {}", expected, got)),
        attribute: Some(path.to_string()),
    }
}
