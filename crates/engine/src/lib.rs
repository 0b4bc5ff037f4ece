//! # Intake Engine
//!
//! The Intake Engine resolves a record identifier into a canonical record
//! against backend clients whose schema, query surface and execution protocol
//! are only known at runtime.
//!
//! ## Key Features
//!
//! - **Model Discovery**: Finds the entity model by registry hints or name guesses and caches the result
//! - **Capability Negotiation**: Builds the richest query the client's reported capabilities allow
//! - **Protocol Adaptation**: Awaits eager, future-style and subscription-style execution handles uniformly
//! - **Normalization**: Flattens known response envelopes and picks fields across key spellings
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use intake_engine::{MemoryBackend, RecordResolver, ResolverConfig};
//!
//! let backend = MemoryBackend::from_json_str(r#"{
//!     "models": {
//!         "Inquiry": {
//!             "descriptor": {"name": "Inquiry"},
//!             "records": [{"Id": 42, "UniqueId": "INQ-42", "Status": "open"}]
//!         }
//!     }
//! }"#)?;
//! let resolver = RecordResolver::with_client(ResolverConfig::default(), Arc::new(backend));
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let record = runtime.block_on(resolver.fetch_by_id("42")).expect("record resolved");
//! assert_eq!(record.unique_id, "INQ-42");
//! assert_eq!(record.status, "open");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`backend`**: Contracts consumed from backend clients, plus an in-memory implementation
//! - **`locator`**: Entity model discovery
//! - **`query`**: Capability-negotiating query construction
//! - **`execution`**: Execution handles and the protocol adapter
//! - **`envelope`**: Response envelope normalization
//! - **`picker`**: Field lookup across key spellings
//! - **`resolver`**: The end-to-end resolution pipeline
//! - **`config`**: Resolver settings and their on-disk format

pub mod backend;
pub mod config;
pub mod envelope;
pub mod error;
pub mod execution;
pub mod locator;
pub mod picker;
pub mod query;
pub mod resolver;

// Re-export commonly used types for convenience
pub use backend::{BackendClient, BackendFixture, MemoryBackend, ModelHandle, QueryObject, QueryStep};
pub use config::{ResolverConfig, load_config, load_config_from_path};
pub use envelope::{EnvelopeShape, extract_records, unwrap_raw_record};
pub use error::{BackendError, ResolveError};
pub use execution::{ExecutionHandle, Observer, Subscribe, Subscription, await_handle};
pub use intake_types::{CanonicalRecord, CapabilityProfile, ModelDescriptor, QueryCapabilities, RecordField};
pub use locator::{LocateStrategy, ModelLocator};
pub use picker::{pick, pick_text};
pub use query::{QueryBuilder, QueryRequest};
pub use resolver::{RecordResolver, ResolutionStage};
