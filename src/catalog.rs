//! Declarative schemas for the directory server objects this SDK ships with.
//!
//! Each function returns the field list of one configuration object type.
//! Declaration order follows the server's attribute order and is the order
//! in which update operations are produced.

use crate::config::ProviderConfig;
use crate::schema::{FieldDescriptor, ProviderSchema, ResourceSchema};

/// Resource type name of the console JSON error log publisher.
pub const CONSOLE_JSON_ERROR_LOG_PUBLISHER: &str = "console_json_error_log_publisher";

/// Resource type name of the server's built-in console JSON error log publisher.
pub const DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER: &str =
    "default_console_json_error_log_publisher";

/// Resource type name of a location.
pub const LOCATION: &str = "location";

const SEVERITIES: [&str; 8] = [
    "all",
    "none",
    "fatal-error",
    "error",
    "warning",
    "notice",
    "info",
    "debug",
];

const OUTPUT_LOCATIONS: [&str; 2] = ["standard-output", "standard-error"];

const LOGGING_ERROR_BEHAVIORS: [&str; 2] = ["standard-error", "lockdown-mode"];

/// Fields of a console JSON error log publisher.
pub fn console_json_error_log_publisher() -> ResourceSchema {
    ResourceSchema::v0()
        .with_description("Publishes error messages as JSON objects to the console")
        .with_field(FieldDescriptor::required_bool("enabled"))
        .with_field(
            FieldDescriptor::optional_enum("output_location", OUTPUT_LOCATIONS)
                .with_description("Where the log messages are written"),
        )
        .with_field(FieldDescriptor::optional_bool("write_multi_line_messages"))
        .with_field(FieldDescriptor::optional_bool("include_product_name"))
        .with_field(FieldDescriptor::optional_bool("include_instance_name"))
        .with_field(FieldDescriptor::optional_bool("include_startup_id"))
        .with_field(FieldDescriptor::optional_bool("include_thread_id"))
        .with_field(FieldDescriptor::optional_bool("generify_message_strings_when_possible"))
        .with_field(FieldDescriptor::optional_enum_set("default_severity", SEVERITIES))
        .with_field(FieldDescriptor::optional_string_set("override_severity"))
        .with_field(FieldDescriptor::optional_string("description"))
        .with_field(FieldDescriptor::optional_enum(
            "logging_error_behavior",
            LOGGING_ERROR_BEHAVIORS,
        ))
}

/// The built-in console JSON error log publisher. It cannot be created or
/// deleted, only adopted and reconfigured.
pub fn default_console_json_error_log_publisher() -> ResourceSchema {
    let mut schema = console_json_error_log_publisher().adopt_existing();
    // The built-in instance may be reconfigured without restating `enabled`.
    if let Some(enabled) = schema.fields.iter_mut().find(|f| f.name == "enabled") {
        *enabled = FieldDescriptor::optional_bool("enabled");
    }
    schema
}

/// Fields of a location.
pub fn location() -> ResourceSchema {
    ResourceSchema::v0()
        .with_description("A named data center location")
        .with_field(FieldDescriptor::optional_string("description"))
}

/// The full provider schema: provider block, resources and data sources.
pub fn provider_schema() -> ProviderSchema {
    ProviderSchema::new()
        .with_provider_config(ProviderConfig::schema())
        .with_resource(CONSOLE_JSON_ERROR_LOG_PUBLISHER, console_json_error_log_publisher())
        .with_resource(
            DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER,
            default_console_json_error_log_publisher(),
        )
        .with_resource(LOCATION, location())
        .with_data_source(CONSOLE_JSON_ERROR_LOG_PUBLISHER, console_json_error_log_publisher())
        .with_data_source(LOCATION, location())
}
