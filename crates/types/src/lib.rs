//! Shared type definitions for the intake workspace.
//!
//! - `record`: the canonical record handed to presentation collaborators and
//!   the table of candidate key spellings per field
//! - `model`: schema registry descriptors
//! - `capability`: query capability descriptors and their coarse profiles

pub mod capability;
pub mod model;
pub mod record;

pub use capability::{CapabilityProfile, QueryCapabilities};
pub use model::ModelDescriptor;
pub use record::{CanonicalRecord, RecordField};
