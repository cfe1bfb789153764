//! Testing utilities for resource schemas and lifecycles.
//!
//! [`ResourceTester`] runs a [`Provider`] against a [`MemoryStore`] so that
//! whole lifecycles can be exercised without a directory server.
//!
//! # Example
//!
//! ```ignore
//! use dsconfig_provider_sdk::catalog;
//! use dsconfig_provider_sdk::testing::{assert_replaces, ResourceTester};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_enable_publisher() {
//!     let tester = ResourceTester::new(catalog::provider_schema());
//!     let state = tester
//!         .lifecycle_create("console_json_error_log_publisher", "console", json!({"enabled": false}))
//!         .await
//!         .unwrap();
//!
//!     let ops = tester
//!         .plan_update("console_json_error_log_publisher", json!({"enabled": true}), state)
//!         .unwrap();
//!     assert_replaces(&ops, "enabled", &["true"]);
//! }
//! ```

use crate::error::ProviderError;
use crate::operations::{OperationKind, UpdateOperation};
use crate::resource::Provider;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;

/// A test harness for resource lifecycles.
pub struct ResourceTester {
    provider: Provider<MemoryStore>,
}

impl ResourceTester {
    /// Create a tester backed by an empty in-memory store.
    pub fn new(schema: ProviderSchema) -> Self {
        let store = Arc::new(MemoryStore::new(&schema));
        Self {
            provider: Provider::new(schema, store),
        }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &Provider<MemoryStore> {
        &self.provider
    }

    /// Get a reference to the in-memory store.
    pub fn store(&self) -> &MemoryStore {
        self.provider.store()
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Configure the provider.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Compute the update operations for a plan against a prior state.
    pub fn plan_update(
        &self,
        resource_type: &str,
        plan: Value,
        prior_state: Value,
    ) -> Result<Vec<UpdateOperation>, ProviderError> {
        self.provider
            .resource(resource_type)?
            .plan_operations(&plan, &prior_state)
    }

    /// Create a resource.
    pub async fn create(&self, resource_type: &str, id: &str, plan: Value) -> Result<Value, ProviderError> {
        self.provider.resource(resource_type)?.create(id, plan).await
    }

    /// Read a resource.
    pub async fn read(&self, resource_type: &str, id: &str) -> Result<Option<Value>, ProviderError> {
        self.provider.resource(resource_type)?.read(id).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        plan: Value,
        prior_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .resource(resource_type)?
            .update(id, plan, prior_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<(), ProviderError> {
        self.provider.resource(resource_type)?.delete(id).await
    }

    /// Read a data source.
    pub async fn read_data_source(&self, data_source_type: &str, id: &str) -> Result<Value, ProviderError> {
        self.provider.data_source(data_source_type)?.read(id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: create → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        id: &str,
        plan: Value,
    ) -> Result<Value, ProviderError> {
        self.create(resource_type, id, plan).await?;
        self.read_existing(resource_type, id).await
    }

    /// Run a full update lifecycle: update → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        id: &str,
        plan: Value,
        prior_state: Value,
    ) -> Result<Value, ProviderError> {
        self.update(resource_type, id, plan, prior_state).await?;
        self.read_existing(resource_type, id).await
    }

    /// Run a full delete lifecycle: delete → read.
    ///
    /// Fails if the resource is still readable afterwards, unless it is a
    /// built-in object that delete only drops from state.
    pub async fn lifecycle_delete(&self, resource_type: &str, id: &str) -> Result<(), ProviderError> {
        let handle = self.provider.resource(resource_type)?;
        handle.delete(id).await?;
        if handle.schema().adopt_existing {
            return Ok(());
        }
        match handle.read(id).await? {
            None => Ok(()),
            Some(_) => Err(ProviderError::Sdk(format!(
                "{}/{} still exists after delete",
                resource_type, id
            ))),
        }
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        id: &str,
        initial_plan: Value,
        updated_plan: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, id, initial_plan).await?;
        let updated = self
            .lifecycle_update(resource_type, id, updated_plan, created)
            .await?;
        self.lifecycle_delete(resource_type, id).await?;
        Ok(updated)
    }

    async fn read_existing(&self, resource_type: &str, id: &str) -> Result<Value, ProviderError> {
        self.read(resource_type, id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("{}/{}", resource_type, id)))
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

fn fields(ops: &[UpdateOperation]) -> Vec<&str> {
    ops.iter().map(|op| op.field.as_str()).collect()
}

fn assert_operation(ops: &[UpdateOperation], kind: OperationKind, attribute: &str, values: &[&str]) {
    let found = ops
        .iter()
        .any(|op| op.kind == kind && op.field == attribute && op.values == values);
    assert!(
        found,
        "Expected {:?} of '{}' with {:?}, but got: {:?}",
        kind, attribute, values, ops
    );
}

/// Assert that no operations were produced.
///
/// # Panics
///
/// Panics if the list is not empty.
pub fn assert_no_operations(ops: &[UpdateOperation]) {
    assert!(
        ops.is_empty(),
        "Expected no operations, but got {} operation(s) on {:?}",
        ops.len(),
        fields(ops)
    );
}

/// Assert that at least one operation was produced.
///
/// # Panics
///
/// Panics if the list is empty.
pub fn assert_has_operations(ops: &[UpdateOperation]) {
    assert!(!ops.is_empty(), "Expected operations, but got none");
}

/// Assert that `attribute` is replaced with exactly `values`.
///
/// # Panics
///
/// Panics if no matching replace operation exists.
pub fn assert_replaces(ops: &[UpdateOperation], attribute: &str, values: &[&str]) {
    assert_operation(ops, OperationKind::Replace, attribute, values);
}

/// Assert that `values` are added to the set `attribute`.
///
/// # Panics
///
/// Panics if no matching add operation exists.
pub fn assert_adds_members(ops: &[UpdateOperation], attribute: &str, values: &[&str]) {
    assert_operation(ops, OperationKind::AddSetMembers, attribute, values);
}

/// Assert that `values` are removed from the set `attribute`.
///
/// # Panics
///
/// Panics if no matching remove operation exists.
pub fn assert_removes_members(ops: &[UpdateOperation], attribute: &str, values: &[&str]) {
    assert_operation(ops, OperationKind::RemoveSetMembers, attribute, values);
}

/// Assert that `attribute` is cleared.
///
/// # Panics
///
/// Panics if no clear operation exists for the attribute.
pub fn assert_clears(ops: &[UpdateOperation], attribute: &str) {
    assert_operation(ops, OperationKind::Remove, attribute, &[]);
}

/// Assert that no operation touches `attribute`.
///
/// # Panics
///
/// Panics if any operation names the attribute.
pub fn assert_does_not_touch(ops: &[UpdateOperation], attribute: &str) {
    assert!(
        ops.iter().all(|op| op.field != attribute),
        "Expected no operation on '{}', but got: {:?}",
        attribute,
        ops
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        self, CONSOLE_JSON_ERROR_LOG_PUBLISHER, DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER, LOCATION,
    };
    use serde_json::json;

    fn tester() -> ResourceTester {
        ResourceTester::new(catalog::provider_schema())
    }

    #[tokio::test]
    async fn test_tester_configure() {
        let tester = tester();
        assert!(tester
            .configure(json!({"https_host": "https://localhost:1443"}))
            .await
            .is_ok());

        let err = tester.configure(json!({"https_host": 1})).await.unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(_)));
    }

    #[tokio::test]
    async fn test_tester_plan_update() {
        let tester = tester();
        let state = tester
            .lifecycle_create(
                CONSOLE_JSON_ERROR_LOG_PUBLISHER,
                "console",
                json!({
                    "enabled": false,
                    "description": "x",
                    "override_severity": ["replication=all", "plugin=error"]
                }),
            )
            .await
            .unwrap();

        let ops = tester
            .plan_update(
                CONSOLE_JSON_ERROR_LOG_PUBLISHER,
                json!({
                    "enabled": true,
                    "description": "",
                    "override_severity": ["plugin=error", "core=debug"]
                }),
                state,
            )
            .unwrap();

        assert_replaces(&ops, "enabled", &["true"]);
        assert_adds_members(&ops, "override-severity", &["core=debug"]);
        assert_removes_members(&ops, "override-severity", &["replication=all"]);
        assert_does_not_touch(&ops, "description");
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let tester = tester();
        let final_state = tester
            .lifecycle_crud(
                LOCATION,
                "east",
                json!({"description": "initial"}),
                json!({"description": "updated"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["description"], "updated");
        assert!(tester.read(LOCATION, "east").await.unwrap().is_none());
        assert_eq!(tester.store().update_calls(), 1);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud_built_in() {
        let tester = tester();
        tester
            .store()
            .insert(
                DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER,
                "console",
                json!({"enabled": false, "output-location": "standard-error"}),
            )
            .await
            .unwrap();

        let final_state = tester
            .lifecycle_crud(
                DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER,
                "console",
                json!({"enabled": true}),
                json!({"enabled": false}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["enabled"], false);
        assert_eq!(final_state["output_location"], "standard-error");
        assert!(tester
            .store()
            .contains(DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER, "console")
            .await);
        assert_eq!(tester.store().update_calls(), 2);
    }

    #[tokio::test]
    async fn test_tester_read_data_source() {
        let tester = tester();
        tester
            .create(LOCATION, "west", json!({"description": "West DC"}))
            .await
            .unwrap();
        let doc = tester.read_data_source(LOCATION, "west").await.unwrap();
        assert_eq!(doc["description"], "West DC");
    }

    #[test]
    fn test_assert_no_operations() {
        assert_no_operations(&[]);
        assert_has_operations(&[UpdateOperation::remove("description")]);
        assert_clears(&[UpdateOperation::remove("description")], "description");
    }

    #[test]
    #[should_panic(expected = "Expected no operations")]
    fn test_assert_no_operations_fails() {
        assert_no_operations(&[UpdateOperation::remove("description")]);
    }

    #[test]
    #[should_panic(expected = "Expected Replace of 'enabled'")]
    fn test_assert_replaces_fails() {
        assert_replaces(
            &[UpdateOperation::replace("enabled", vec!["false".into()])],
            "enabled",
            &["true"],
        );
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid configuration value")];
        assert_has_errors(&diagnostics);
        assert_error_contains(&diagnostics, "configuration");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("field1"));
        assert!(display.contains("More info"));
    }
}
