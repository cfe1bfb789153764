//! Directory Configuration Provider SDK
//!
//! This crate provides the building blocks for a declarative provider that
//! manages a directory server through its REST configuration API.
//!
//! # Overview
//!
//! The SDK provides:
//!
//! - **Schema types**: Ordered field descriptors for each configuration object type
//! - **Records**: Tri-state (unknown / null / present) typed field values
//! - **Reconciliation**: [`reconcile`] turns a plan and a state into the minimal
//!   list of PATCH operations
//! - **Store trait**: [`ConfigStore`] for the remote API, plus an in-memory store
//! - **Resource lifecycle**: [`Provider`] handles for create, read, update and delete
//! - **Error types**: Common error types for provider implementations
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```
//! use dsconfig_provider_sdk::operations::{reconcile, OperationKind};
//! use dsconfig_provider_sdk::schema::{FieldDescriptor, ResourceSchema};
//! use dsconfig_provider_sdk::validation::{parse_plan, parse_remote};
//! use serde_json::json;
//!
//! let schema = ResourceSchema::v0()
//!     .with_field(FieldDescriptor::required_bool("enabled"))
//!     .with_field(FieldDescriptor::optional_string("description"));
//!
//! let state = parse_remote(&schema, &json!({"enabled": false, "description": "x"})).unwrap();
//! let plan = parse_plan(&schema, &json!({"enabled": true, "description": ""})).unwrap();
//!
//! let ops = reconcile(&schema, &plan, &state);
//! assert_eq!(ops.len(), 1);
//! assert_eq!(ops[0].kind, OperationKind::Replace);
//! assert_eq!(ops[0].field, "enabled");
//! ```
//!
//! # Wire Format
//!
//! Operations serialize to the body the configuration API expects:
//!
//! ```text
//! {"operation": "replace", "attribute": "enabled", "values": ["true"]}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod operations;
pub mod resource;
pub mod schema;
pub mod store;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use operations::{
    apply_operations, reconcile, OperationKind, UpdateOperation, UpdateRequest,
};
pub use resource::{DataSourceHandle, Provider, ResourceHandle};
pub use schema::{FieldDescriptor, FieldKind, ProviderSchema, ResourceSchema};
pub use store::{ConfigStore, MemoryStore};
pub use types::{FieldValue, PlanValue, Record, UNKNOWN_VALUE};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
