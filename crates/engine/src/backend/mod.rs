//! Contracts consumed from a backend client.
//!
//! Modules:
//! - `memory`: fixture-driven in-memory backend used by the CLI and tests
//!
//! The traits model a client whose schema registry, query surface and
//! execution protocol are only known at runtime. Every call may fail; the
//! engine treats failures as "try the next strategy" rather than as errors.

pub mod memory;

use intake_types::{ModelDescriptor, QueryCapabilities};
use serde_json::Value;

use crate::{error::BackendError, execution::ExecutionHandle};

pub use memory::{BackendFixture, BuilderStyle, CallCounts, ExecutionProtocol, FixtureModel, MemoryBackend};

/// A backend client session.
pub trait BackendClient: Send + Sync {
    /// The client's own slug or name, when it has one.
    fn slug(&self) -> Option<String>;

    /// Enumerates the schema registry as `(key, descriptor)` pairs in registry order.
    fn schema_registry(&self) -> Result<Vec<(String, ModelDescriptor)>, BackendError>;

    /// Acquires the model registered under `model_name`.
    fn switch_to(&self, model_name: &str) -> Result<Box<dyn ModelHandle>, BackendError>;

    /// Query operations this client version implements.
    ///
    /// Consulted once when the client is attached to a resolver.
    fn capabilities(&self) -> QueryCapabilities {
        QueryCapabilities::default()
    }
}

/// An acquired entity model.
pub trait ModelHandle: Send + Sync {
    /// Name the model was acquired under.
    fn name(&self) -> &str;

    /// Schema descriptor, when the backend exposes one.
    fn schema(&self) -> Option<ModelDescriptor>;

    /// Obtains a fresh query object.
    fn query(&self) -> Result<Box<dyn QueryObject>, BackendError>;
}

/// Outcome of a successful query refinement.
///
/// Some builders mutate themselves, others return a new instance. A
/// replacement becomes the authoritative query from then on.
pub enum QueryStep {
    InPlace,
    Replaced(Box<dyn QueryObject>),
}

/// A query builder with an unknown subset of operations.
///
/// Every refinement defaults to [`BackendError::Unsupported`].
pub trait QueryObject: Send {
    fn deselect_all(&mut self) -> Result<QueryStep, BackendError> {
        Err(BackendError::unsupported("deselect_all"))
    }

    /// Selects one field under its external `name`, reported back as `alias`.
    fn select_field(&mut self, _name: &str, _alias: &str) -> Result<QueryStep, BackendError> {
        Err(BackendError::unsupported("select_field"))
    }

    fn select_bulk(&mut self, _names: &[&str]) -> Result<QueryStep, BackendError> {
        Err(BackendError::unsupported("select_bulk"))
    }

    fn filter(&mut self, _field: &str, _value: &Value) -> Result<QueryStep, BackendError> {
        Err(BackendError::unsupported("filter"))
    }

    fn limit(&mut self, _count: usize) -> Result<QueryStep, BackendError> {
        Err(BackendError::unsupported("limit"))
    }

    /// Triggers execution. `Ok(None)` means the backend returned no handle.
    fn execute(&mut self) -> Result<Option<ExecutionHandle>, BackendError>;

    /// Releases backend resources held by the query.
    fn destroy(&mut self) -> Result<(), BackendError> {
        Err(BackendError::unsupported("destroy"))
    }
}
