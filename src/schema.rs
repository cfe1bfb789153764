//! Schema types for describing provider and resource structure.
//!
//! A directory-server configuration object is flat: every attribute is a
//! scalar or a set of strings. A [`ResourceSchema`] is therefore an ordered
//! list of [`FieldDescriptor`]s. Declaration order is significant because
//! the reconciliation engine visits fields in that order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The semantic kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A boolean value.
    Bool,
    /// A 64-bit integer.
    Int,
    /// A free-form string.
    String,
    /// An unordered set of free-form strings.
    StringSet,
    /// A string restricted to the descriptor's allowed values.
    EnumString,
    /// An unordered set of strings restricted to the allowed values.
    EnumStringSet,
}

impl FieldKind {
    /// Whether values of this kind are sets.
    pub fn is_set(self) -> bool {
        matches!(self, Self::StringSet | Self::EnumStringSet)
    }

    /// Whether values of this kind are checked against allowed values.
    pub fn is_enum(self) -> bool {
        matches!(self, Self::EnumString | Self::EnumStringSet)
    }

    /// Human-readable type name used in diagnostics.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::String | Self::EnumString => "string",
            Self::StringSet | Self::EnumStringSet => "set of strings",
        }
    }
}

/// Describes how a field can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The field is required in configuration.
    pub required: bool,
    /// The field is optional in configuration.
    pub optional: bool,
    /// The field is computed by the remote server (read-only).
    pub computed: bool,
    /// The field is sensitive and should be hidden in logs/UI.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Create flags for a required field.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional field.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Create flags for a computed field (read-only, set by the server).
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional+computed field (can be set, but has a server default).
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }

    /// Mark the field as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Describes a single field of a configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Internal (snake_case) name used by plan and state documents.
    pub name: String,
    /// External (kebab-case) name used by the remote configuration API.
    pub api_name: String,
    /// The semantic kind of the field.
    pub kind: FieldKind,
    /// Flags describing how the field can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Accepted values for enum kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// If set, an empty or null plan value means "no opinion" rather than "clear".
    #[serde(default)]
    pub empty_as_unset: bool,
    /// Human-readable description of the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// Create a descriptor, deriving the external name from the internal one.
    pub fn new(name: impl Into<String>, kind: FieldKind, flags: AttributeFlags) -> Self {
        let name = name.into();
        Self {
            api_name: name.replace('_', "-"),
            name,
            kind,
            flags,
            allowed_values: Vec::new(),
            empty_as_unset: false,
            description: None,
        }
    }

    /// Create an optional+computed bool field.
    pub fn optional_bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool, AttributeFlags::optional_computed())
    }

    /// Create a required bool field.
    pub fn required_bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool, AttributeFlags::required())
    }

    /// Create an optional+computed int field.
    pub fn optional_int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int, AttributeFlags::optional_computed())
    }

    /// Create an optional string field that treats empty strings as unset.
    pub fn optional_string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String, AttributeFlags::optional()).with_empty_as_unset(true)
    }

    /// Create a required string field.
    pub fn required_string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String, AttributeFlags::required())
    }

    /// Create a computed string field.
    pub fn computed_string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String, AttributeFlags::computed())
    }

    /// Create an optional+computed set-of-strings field.
    pub fn optional_string_set(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringSet, AttributeFlags::optional_computed())
    }

    /// Create an optional+computed enum field.
    pub fn optional_enum<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, FieldKind::EnumString, AttributeFlags::optional_computed())
            .with_allowed_values(allowed)
    }

    /// Create a required enum field.
    pub fn required_enum<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, FieldKind::EnumString, AttributeFlags::required())
            .with_allowed_values(allowed)
    }

    /// Create an optional+computed set-of-enums field.
    pub fn optional_enum_set<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, FieldKind::EnumStringSet, AttributeFlags::optional_computed())
            .with_allowed_values(allowed)
    }

    /// Override the external (API) name.
    pub fn with_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.api_name = api_name.into();
        self
    }

    /// Set the accepted values for an enum field.
    pub fn with_allowed_values<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = allowed.into_iter().map(Into::into).collect();
        self
    }

    /// Set the empty-as-unset policy for this field.
    pub fn with_empty_as_unset(mut self, enabled: bool) -> Self {
        self.empty_as_unset = enabled;
        self
    }

    /// Set the description for this field.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark this field as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }

    /// Whether `value` is accepted by this field. Non-enum fields accept anything.
    pub fn accepts(&self, value: &str) -> bool {
        !self.kind.is_enum() || self.allowed_values.iter().any(|v| v == value)
    }

    /// Whether the field is read-only from the configuration's point of view.
    pub fn is_read_only(&self) -> bool {
        self.flags.computed && !self.flags.optional && !self.flags.required
    }
}

/// Schema for a resource or data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// The version of this schema (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// The object always exists on the server; create adopts it instead.
    #[serde(default)]
    pub adopt_existing: bool,
    /// Human-readable description of the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceSchema {
    /// Create a new schema with the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            fields: Vec::new(),
            adopt_existing: false,
            description: None,
        }
    }

    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Append a field. A field with the same internal name is replaced in place.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Mark the resource as adopt-only.
    pub fn adopt_existing(mut self) -> Self {
        self.adopt_existing = true;
        self
    }

    /// Set the description for this resource.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a field by internal name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by external (API) name.
    pub fn field_by_api_name(&self, api_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.api_name == api_name)
    }
}

impl Default for ResourceSchema {
    fn default() -> Self {
        Self::v0()
    }
}

/// Schemas for the provider configuration, resources and data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    #[serde(default)]
    pub provider: ResourceSchema,
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: HashMap<String, ResourceSchema>,
    /// Schemas for each data source type.
    #[serde(default)]
    pub data_sources: HashMap<String, ResourceSchema>,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: ResourceSchema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: ResourceSchema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: ResourceSchema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}
