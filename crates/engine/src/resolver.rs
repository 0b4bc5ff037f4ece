//! Record resolution: from an identifier to a canonical record or nothing.
//!
//! A resolution walks `Idle -> Locating -> Building -> Executing ->
//! Normalizing -> Done`. A failure at any stage jumps straight to `Done` with
//! no record; callers cannot tell "not found" from "backend error".

use std::sync::Arc;

use intake_types::{CanonicalRecord, QueryCapabilities, RecordField};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    backend::{BackendClient, QueryObject},
    config::ResolverConfig,
    envelope::{extract_records, unwrap_raw_record},
    error::ResolveError,
    execution::await_handle,
    locator::ModelLocator,
    picker::pick_text,
    query::{QueryBuilder, QueryRequest},
};

/// Stages of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    Idle,
    Locating,
    Building,
    Executing,
    Normalizing,
    Done,
}

/// Resolves records by identifier against an attached backend client.
///
/// The resolver owns the model locator, so the discovered model name is
/// cached per resolver instance. It is `Send + Sync`; concurrent resolutions
/// through a shared reference only share that cache.
pub struct RecordResolver {
    client: Option<Arc<dyn BackendClient>>,
    capabilities: QueryCapabilities,
    locator: ModelLocator,
    config: ResolverConfig,
    current_id: Option<String>,
}

impl RecordResolver {
    /// Creates a resolver with no backend client attached.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            client: None,
            capabilities: QueryCapabilities::default(),
            locator: ModelLocator::from_config(&config),
            config,
            current_id: None,
        }
    }

    /// Creates a resolver attached to `client`.
    pub fn with_client(config: ResolverConfig, client: Arc<dyn BackendClient>) -> Self {
        let mut resolver = Self::new(config);
        resolver.attach(client);
        resolver
    }

    /// Attaches a backend client, reading its capability surface once.
    ///
    /// Any model name cached for a previous client is forgotten.
    pub fn attach(&mut self, client: Arc<dyn BackendClient>) {
        self.capabilities = client.capabilities();
        debug!(profile = ?self.capabilities.profile(), "backend client attached");
        self.locator.invalidate();
        self.client = Some(client);
    }

    /// Detaches the backend client; later resolutions yield nothing.
    pub fn detach(&mut self) {
        self.client = None;
        self.locator.invalidate();
    }

    pub fn is_attached(&self) -> bool {
        self.client.is_some()
    }

    pub fn capabilities(&self) -> QueryCapabilities {
        self.capabilities
    }

    pub fn locator(&self) -> &ModelLocator {
        &self.locator
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Stores the identifier used by [`RecordResolver::fetch_current`].
    ///
    /// Absent or blank identifiers are ignored.
    pub fn set_id(&mut self, identifier: Option<&str>) {
        if let Some(identifier) = identifier.map(str::trim).filter(|identifier| !identifier.is_empty()) {
            self.current_id = Some(identifier.to_string());
        }
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Resolves the identifier stored with [`RecordResolver::set_id`].
    pub async fn fetch_current(&self) -> Option<CanonicalRecord> {
        self.fetch_by_id(self.current_id.as_deref().unwrap_or_default()).await
    }

    /// Resolves `identifier` into a canonical record.
    ///
    /// Returns `None` for an empty identifier, a detached resolver, or any
    /// failure along the way. Never panics and never surfaces an error.
    pub async fn fetch_by_id(&self, identifier: &str) -> Option<CanonicalRecord> {
        match self.resolve(identifier).await {
            Ok(record) => {
                info!(id = %record.id, unique_id = %record.unique_id, "record resolved");
                Some(record)
            }
            Err(error) => {
                debug!(stage = ?error.stage(), %error, next = ?ResolutionStage::Done, "resolution yielded no record");
                None
            }
        }
    }

    async fn resolve(&self, identifier: &str) -> Result<CanonicalRecord, ResolveError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ResolveError::EmptyIdentifier);
        }
        let client = self.client.as_deref().ok_or(ResolveError::NoClient)?;

        debug!(stage = ?ResolutionStage::Locating, identifier, "resolving record");
        let located = self.locator.resolve(client).ok_or(ResolveError::ModelNotFound)?;

        debug!(stage = ?ResolutionStage::Building, model = %located.name);
        let request = QueryRequest::for_identifier(identifier)
            .with_filter_keys(self.config.filter_keys.clone(), self.config.fallback_filter_keys.clone())
            .with_limit(self.config.query_limit);
        let query = QueryBuilder::new(self.capabilities)
            .build(located.model.as_ref(), &request)
            .ok_or_else(|| ResolveError::QueryUnavailable {
                model: located.name.clone(),
            })?
            .query;
        drop(located);
        let mut query = QueryGuard {
            query,
            destroy: self.capabilities.destroy,
        };

        debug!(stage = ?ResolutionStage::Executing);
        let response = self.execute(query.query.as_mut()).await;
        drop(query);
        let response = response?;

        debug!(stage = ?ResolutionStage::Normalizing);
        let records = extract_records(&response);
        let first = records.first().ok_or(ResolveError::NoRecords)?;
        let container = unwrap_raw_record(first).ok_or_else(|| ResolveError::shape_mismatch("first record is not an object"))?;
        Ok(canonical_record(container))
    }

    async fn execute(&self, query: &mut dyn QueryObject) -> Result<Value, ResolveError> {
        let handle = query
            .execute()
            .map_err(|error| ResolveError::execution(error.to_string()))?;
        await_handle(handle, self.config.execution_timeout())
            .await
            .ok_or_else(|| ResolveError::execution("no value delivered"))
    }
}

/// Owns a built query and destroys it on drop when the backend reports
/// `destroy`, including when the resolution is cancelled mid-execution.
/// Destroy failures are ignored.
struct QueryGuard {
    query: Box<dyn QueryObject>,
    destroy: bool,
}

impl Drop for QueryGuard {
    fn drop(&mut self) {
        if !self.destroy {
            return;
        }
        if let Err(error) = self.query.destroy() {
            debug!(%error, "query destroy failed");
        }
    }
}

/// Assembles a canonical record, running the field picker once per field.
pub fn canonical_record(container: &Map<String, Value>) -> CanonicalRecord {
    let mut record = CanonicalRecord::default();
    for field in RecordField::ALL {
        record.set(field, pick_text(container, field.candidate_keys()));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_id_ignores_absent_and_blank_identifiers() {
        let mut resolver = RecordResolver::new(ResolverConfig::default());
        resolver.set_id(Some("42"));
        resolver.set_id(None);
        resolver.set_id(Some("   "));
        assert_eq!(resolver.current_id(), Some("42"));
        resolver.set_id(Some(" 43 "));
        assert_eq!(resolver.current_id(), Some("43"));
    }

    #[tokio::test]
    async fn detached_resolver_yields_nothing() {
        let resolver = RecordResolver::new(ResolverConfig::default());
        assert!(!resolver.is_attached());
        assert_eq!(resolver.fetch_by_id("42").await, None);
        assert_eq!(resolver.fetch_current().await, None);
    }

    #[test]
    fn canonical_record_is_fully_populated_from_partial_input() {
        let container = json!({"Id": 7, "fields": {"status": " open "}});
        let record = canonical_record(container.as_object().expect("object"));
        assert_eq!(record.id, "7");
        assert_eq!(record.status, "open");
        assert_eq!(record.unique_id, "");
        assert_eq!(record.request_summary, "");
    }

    #[test]
    fn resolver_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordResolver>();
    }
}
