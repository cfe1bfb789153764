//! Resource lifecycle.
//!
//! A [`Provider`] pairs a [`ProviderSchema`] with a [`ConfigStore`] and hands
//! out per-type handles. [`ResourceHandle`] drives create, read, update and
//! delete; [`DataSourceHandle`] reads. Documents exchanged with callers are
//! plan/state JSON keyed by internal field names.
//!
//! Updates go through [`reconcile`]: when it yields no operations the store
//! is not called at all.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::operations::{reconcile, summarize, UpdateOperation, UpdateRequest};
use crate::schema::{Diagnostic, ProviderSchema, ResourceSchema};
use crate::store::ConfigStore;
use crate::types::Record;
use crate::validation::{
    parse_plan, parse_remote, parse_state, to_remote_document, to_state_document, validate,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// A provider bound to a configuration store.
pub struct Provider<S: ConfigStore> {
    schema: ProviderSchema,
    store: Arc<S>,
    config: RwLock<Option<ProviderConfig>>,
}

impl<S: ConfigStore> Provider<S> {
    /// Create a provider over `store`.
    pub fn new(schema: ProviderSchema, store: Arc<S>) -> Self {
        Self {
            schema,
            store,
            config: RwLock::new(None),
        }
    }

    /// The provider's schema.
    pub fn schema(&self) -> &ProviderSchema {
        &self.schema
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Sorted resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        let mut names: Vec<_> = self.schema.resources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        let mut names: Vec<_> = self.schema.data_sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate and store the provider block.
    ///
    /// Schema problems are returned as diagnostics; semantic problems (such
    /// as a non-https host) as an error.
    #[instrument(skip(self, config))]
    pub async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&self.schema.provider, &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
            return Ok(diagnostics);
        }

        let parsed = ProviderConfig::from_value(config)?;
        info!(host = %parsed.https_host, version = %parsed.product_version, "Provider configured");
        *self.config.write().await = Some(parsed);
        Ok(diagnostics)
    }

    /// The configuration stored by [`Provider::configure`], if any.
    pub async fn config(&self) -> Option<ProviderConfig> {
        self.config.read().await.clone()
    }

    /// Handle for a resource type.
    pub fn resource<'a>(&'a self, resource_type: &'a str) -> Result<ResourceHandle<'a, S>, ProviderError> {
        let schema = self
            .schema
            .resources
            .get(resource_type)
            .ok_or_else(|| {
                debug!(resource_type, known = ?self.resource_types(), "Unknown resource type");
                ProviderError::UnknownResource(resource_type.to_string())
            })?;
        Ok(ResourceHandle {
            resource_type,
            schema,
            store: self.store.as_ref(),
        })
    }

    /// Handle for a data source type.
    pub fn data_source<'a>(
        &'a self,
        data_source_type: &'a str,
    ) -> Result<DataSourceHandle<'a, S>, ProviderError> {
        let schema = self
            .schema
            .data_sources
            .get(data_source_type)
            .ok_or_else(|| {
                debug!(data_source_type, known = ?self.data_source_types(), "Unknown data source type");
                ProviderError::UnknownResource(data_source_type.to_string())
            })?;
        Ok(DataSourceHandle {
            data_source_type,
            schema,
            store: self.store.as_ref(),
        })
    }
}

/// Lifecycle operations for one resource type.
pub struct ResourceHandle<'a, S: ConfigStore> {
    resource_type: &'a str,
    schema: &'a ResourceSchema,
    store: &'a S,
}

impl<'a, S: ConfigStore> ResourceHandle<'a, S> {
    /// The resource's schema.
    pub fn schema(&self) -> &ResourceSchema {
        self.schema
    }

    fn check(&self, plan: &Value) -> Result<Record, ProviderError> {
        let diagnostics = validate(self.schema, plan);
        let errors: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.summary.as_str())
            .collect();
        if !errors.is_empty() {
            return Err(ProviderError::Validation(errors.join("; ")));
        }
        parse_plan(self.schema, plan)
    }

    /// Compute the operations an update would send, without sending them.
    pub fn plan_operations(
        &self,
        plan: &Value,
        prior_state: &Value,
    ) -> Result<Vec<UpdateOperation>, ProviderError> {
        let plan = self.check(plan)?;
        let state = parse_state(self.schema, prior_state)?;
        Ok(reconcile(self.schema, &plan, &state))
    }

    /// Create the object, or adopt it if the schema is adopt-only.
    #[instrument(skip(self, plan), fields(resource_type = self.resource_type))]
    pub async fn create(&self, id: &str, plan: Value) -> Result<Value, ProviderError> {
        if self.schema.adopt_existing {
            return self.create_adopt(id, plan).await;
        }

        let record = self.check(&plan)?;
        let created = self
            .store
            .create(self.resource_type, id, to_remote_document(self.schema, &record))
            .await?;
        info!(id, "Created resource");
        self.state_from_remote(&created)
    }

    /// Take over an object that already exists and reconcile it with `plan`.
    #[instrument(skip(self, plan), fields(resource_type = self.resource_type))]
    pub async fn create_adopt(&self, id: &str, plan: Value) -> Result<Value, ProviderError> {
        let record = self.check(&plan)?;
        let existing = self.store.fetch(self.resource_type, id).await?;
        let existing = parse_remote(self.schema, &existing)?;

        let ops = reconcile(self.schema, &record, &existing);
        if ops.is_empty() {
            info!(id, "Adopted existing resource without changes");
            return Ok(to_state_document(self.schema, &existing));
        }

        info!(id, changes = %summarize(self.schema, &ops), "Adopting existing resource");
        let updated = self
            .store
            .apply_operations(self.resource_type, id, UpdateRequest::new(ops))
            .await?;
        self.state_from_remote(&updated)
    }

    /// Read the current state. `None` means the object no longer exists.
    #[instrument(skip(self), fields(resource_type = self.resource_type))]
    pub async fn read(&self, id: &str) -> Result<Option<Value>, ProviderError> {
        match self.store.fetch(self.resource_type, id).await {
            Ok(remote) => self.state_from_remote(&remote).map(Some),
            Err(err) if err.is_not_found() => {
                warn!(id, "Resource not found, removing from state");
                Ok(None)
            },
            Err(err) => Err(err),
        }
    }

    /// Move the object from `prior_state` toward `plan`.
    ///
    /// Returns `prior_state` untouched when nothing differs.
    #[instrument(skip(self, plan, prior_state), fields(resource_type = self.resource_type))]
    pub async fn update(
        &self,
        id: &str,
        plan: Value,
        prior_state: Value,
    ) -> Result<Value, ProviderError> {
        let ops = self.plan_operations(&plan, &prior_state)?;
        if ops.is_empty() {
            debug!(id, "No changes, skipping update request");
            return Ok(prior_state);
        }

        info!(id, changes = %summarize(self.schema, &ops), "Updating resource");
        let updated = self
            .store
            .apply_operations(self.resource_type, id, UpdateRequest::new(ops))
            .await?;
        self.state_from_remote(&updated)
    }

    /// Delete the object. Adopt-only objects are only dropped from state.
    #[instrument(skip(self), fields(resource_type = self.resource_type))]
    pub async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        if self.schema.adopt_existing {
            debug!(id, "Built-in resource is not deleted from the server");
            return Ok(());
        }

        match self.store.delete(self.resource_type, id).await {
            Ok(()) => {
                info!(id, "Deleted resource");
                Ok(())
            },
            Err(err) if err.is_not_found() => {
                warn!(id, "Resource already deleted");
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    fn state_from_remote(&self, remote: &Value) -> Result<Value, ProviderError> {
        let record = parse_remote(self.schema, remote)?;
        Ok(to_state_document(self.schema, &record))
    }
}

/// Read access to one data source type.
pub struct DataSourceHandle<'a, S: ConfigStore> {
    data_source_type: &'a str,
    schema: &'a ResourceSchema,
    store: &'a S,
}

impl<'a, S: ConfigStore> DataSourceHandle<'a, S> {
    /// Read an object. A missing object is an error.
    #[instrument(skip(self), fields(data_source_type = self.data_source_type))]
    pub async fn read(&self, id: &str) -> Result<Value, ProviderError> {
        let remote = self.store.fetch(self.data_source_type, id).await?;
        let record = parse_remote(self.schema, &remote)?;
        Ok(to_state_document(self.schema, &record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, CONSOLE_JSON_ERROR_LOG_PUBLISHER, DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER, LOCATION};
    use crate::operations::OperationKind;
    use crate::store::MemoryStore;
    use crate::types::UNKNOWN_VALUE;
    use serde_json::json;

    fn provider() -> Provider<MemoryStore> {
        let schema = catalog::provider_schema();
        let store = Arc::new(MemoryStore::new(&schema));
        Provider::new(schema, store)
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = provider();
        assert!(matches!(
            provider.resource("printer"),
            Err(ProviderError::UnknownResource(_))
        ));
        assert_eq!(
            provider.resource_types(),
            vec![
                CONSOLE_JSON_ERROR_LOG_PUBLISHER.to_string(),
                DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER.to_string(),
                LOCATION.to_string(),
            ]
        );

        assert!(matches!(
            provider.data_source(DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER),
            Err(ProviderError::UnknownResource(_))
        ));
        assert_eq!(
            provider.data_source_types(),
            vec![CONSOLE_JSON_ERROR_LOG_PUBLISHER.to_string(), LOCATION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_configure() {
        let provider = provider();
        let diagnostics = provider.configure(json!({})).await.unwrap();
        assert!(diagnostics.iter().any(Diagnostic::is_error));
        assert!(provider.config().await.is_none());

        let diagnostics = provider
            .configure(json!({"https_host": "https://localhost:1443"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            provider.config().await.unwrap().https_host,
            "https://localhost:1443"
        );

        let err = provider
            .configure(json!({"https_host": "ldap://localhost"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_skips_unknown_fields() {
        let provider = provider();
        let publishers = provider.resource(CONSOLE_JSON_ERROR_LOG_PUBLISHER).unwrap();
        let state = publishers
            .create(
                "console",
                json!({
                    "enabled": true,
                    "output_location": UNKNOWN_VALUE,
                    "default_severity": ["error", "warning"]
                }),
            )
            .await
            .unwrap();

        assert_eq!(state["enabled"], json!(true));
        assert_eq!(state["output_location"], Value::Null);
        assert_eq!(state["default_severity"], json!(["error", "warning"]));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_plan() {
        let provider = provider();
        let publishers = provider.resource(CONSOLE_JSON_ERROR_LOG_PUBLISHER).unwrap();

        let err = publishers.create("console", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));

        let err = publishers
            .create("console", json!({"enabled": true, "output_location": "printer"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("output_location"));
        assert!(!provider.store().contains(CONSOLE_JSON_ERROR_LOG_PUBLISHER, "console").await);
    }

    #[tokio::test]
    async fn test_update_without_changes_skips_store() {
        let provider = provider();
        let locations = provider.resource(LOCATION).unwrap();
        let state = locations
            .create("east", json!({"description": "East DC"}))
            .await
            .unwrap();

        let after = locations
            .update("east", json!({"description": "East DC"}), state.clone())
            .await
            .unwrap();
        assert_eq!(after, state);
        assert_eq!(provider.store().update_calls(), 0);
    }

    #[tokio::test]
    async fn test_update_sends_operations() {
        let provider = provider();
        let publishers = provider.resource(CONSOLE_JSON_ERROR_LOG_PUBLISHER).unwrap();
        let state = publishers
            .create(
                "console",
                json!({"enabled": false, "default_severity": ["error", "warning"]}),
            )
            .await
            .unwrap();

        let plan = json!({"enabled": true, "default_severity": ["warning", "notice"]});
        let ops = publishers.plan_operations(&plan, &state).unwrap();
        assert_eq!(
            ops.iter().map(|op| op.kind).collect::<Vec<_>>(),
            vec![
                OperationKind::Replace,
                OperationKind::AddSetMembers,
                OperationKind::RemoveSetMembers
            ]
        );

        let updated = publishers.update("console", plan, state).await.unwrap();
        assert_eq!(updated["enabled"], json!(true));
        assert_eq!(updated["default_severity"], json!(["notice", "warning"]));
        assert_eq!(provider.store().update_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_conflict_is_reported() {
        let provider = provider();
        let locations = provider.resource(LOCATION).unwrap();
        let state = locations.create("east", json!({"description": "a"})).await.unwrap();
        provider.store().set_conflict(LOCATION, "east", true).await;

        let err = locations
            .update("east", json!({"description": "b"}), state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_read_missing_returns_none() {
        let provider = provider();
        let locations = provider.resource(LOCATION).unwrap();
        assert!(locations.read("nowhere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let provider = provider();
        let locations = provider.resource(LOCATION).unwrap();
        locations.create("east", json!({})).await.unwrap();
        locations.delete("east").await.unwrap();
        locations.delete("east").await.unwrap();
        assert!(!provider.store().contains(LOCATION, "east").await);
    }

    #[tokio::test]
    async fn test_adopt_existing_reconciles() {
        let provider = provider();
        provider
            .store()
            .insert(
                DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER,
                "Console JSON Error Logger",
                json!({"enabled": false, "output-location": "standard-output"}),
            )
            .await
            .unwrap();

        let publishers = provider.resource(DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER).unwrap();
        let state = publishers
            .create("Console JSON Error Logger", json!({"output_location": "standard-output"}))
            .await
            .unwrap();
        assert_eq!(state["enabled"], json!(false));
        assert_eq!(provider.store().update_calls(), 0);

        let state = publishers
            .create("Console JSON Error Logger", json!({"enabled": true}))
            .await
            .unwrap();
        assert_eq!(state["enabled"], json!(true));
        assert_eq!(provider.store().update_calls(), 1);

        publishers.delete("Console JSON Error Logger").await.unwrap();
        assert!(
            provider
                .store()
                .contains(DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER, "Console JSON Error Logger")
                .await
        );
    }

    #[tokio::test]
    async fn test_adopt_missing_object_fails() {
        let provider = provider();
        let publishers = provider.resource(DEFAULT_CONSOLE_JSON_ERROR_LOG_PUBLISHER).unwrap();
        let err = publishers.create("nope", json!({})).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_data_source_read() {
        let provider = provider();
        provider
            .resource(LOCATION)
            .unwrap()
            .create("east", json!({"description": "East DC"}))
            .await
            .unwrap();

        let locations = provider.data_source(LOCATION).unwrap();
        let doc = locations.read("east").await.unwrap();
        assert_eq!(doc, json!({"description": "East DC"}));

        assert!(locations.read("west").await.unwrap_err().is_not_found());
    }
}
