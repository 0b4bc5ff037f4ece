//! Capability-negotiating query construction.
//!
//! The builder applies selection, filtering and limiting using only the
//! operations a backend reports in its [`QueryCapabilities`]. Each refinement
//! is attempted on its own: an unsupported or failing call is skipped and the
//! previous query reference stays authoritative.

use intake_types::{CapabilityProfile, QueryCapabilities, RecordField};
use serde_json::Value;
use tracing::debug;

use crate::{
    backend::{ModelHandle, QueryObject, QueryStep},
    error::BackendError,
};

/// What a built query should ask for.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Fields to select; each is requested under its external name with its internal alias.
    pub fields: Vec<RecordField>,
    /// Filter keys in priority order.
    pub filter_keys: Vec<String>,
    /// Alternate identifying fields tried when no filter key is accepted.
    pub fallback_filter_keys: Vec<String>,
    /// Value every filter attempt matches against.
    pub filter_value: Value,
    /// Row limit, when limiting is wanted.
    pub limit: Option<usize>,
}

impl QueryRequest {
    /// A request for every canonical field of the record identified by `identifier`.
    pub fn for_identifier(identifier: &str) -> Self {
        Self {
            fields: RecordField::ALL.to_vec(),
            filter_keys: Vec::new(),
            fallback_filter_keys: Vec::new(),
            filter_value: identifier_value(identifier),
            limit: None,
        }
    }

    pub fn with_filter_keys(mut self, filter_keys: Vec<String>, fallback_filter_keys: Vec<String>) -> Self {
        self.filter_keys = filter_keys;
        self.fallback_filter_keys = fallback_filter_keys;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Converts an identifier into the value used for filtering.
///
/// Identifiers in canonical integer form are sent as numbers, everything else
/// (including zero-padded digits) as strings.
pub fn identifier_value(identifier: &str) -> Value {
    let identifier = identifier.trim();
    match identifier.parse::<i64>() {
        Ok(number) if number.to_string() == identifier => Value::from(number),
        _ => Value::String(identifier.to_string()),
    }
}

/// How field selection was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// At least one per-field selection call was accepted.
    PerField,
    /// The bulk selection call was accepted.
    Bulk,
    /// No selection was applied; the backend returns its default fields.
    #[default]
    Default,
}

/// Refinements that were accepted while building a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedRefinements {
    pub deselected: bool,
    pub selection: SelectionMode,
    /// Filter key the query accepted, if any.
    pub filter_key: Option<String>,
    pub limited: bool,
}

/// A query ready for execution plus a record of how it was refined.
pub struct BuiltQuery {
    pub query: Box<dyn QueryObject>,
    pub applied: AppliedRefinements,
}

/// Builds queries against a fixed capability surface.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    capabilities: QueryCapabilities,
}

impl QueryBuilder {
    pub fn new(capabilities: QueryCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.capabilities.profile()
    }

    /// Builds a best-effort query on `model`.
    ///
    /// Returns `None` only when the model cannot hand out a query object. In
    /// the worst case the returned query is unselected, unfiltered and unlimited.
    pub fn build(&self, model: &dyn ModelHandle, request: &QueryRequest) -> Option<BuiltQuery> {
        let mut query = match model.query() {
            Ok(query) => query,
            Err(error) => {
                debug!(model = model.name(), %error, "query acquisition failed");
                return None;
            }
        };
        let mut applied = AppliedRefinements::default();

        if self.capabilities.deselect_all {
            applied.deselected = refine(&mut query, "deselect_all", |query| query.deselect_all());
        }
        applied.selection = self.select(&mut query, &request.fields);
        if self.capabilities.filter {
            applied.filter_key = apply_filter(&mut query, request);
        }
        if self.capabilities.limit
            && let Some(limit) = request.limit
        {
            applied.limited = refine(&mut query, "limit", |query| query.limit(limit));
        }

        debug!(
            model = model.name(),
            profile = ?self.profile(),
            selection = ?applied.selection,
            filter_key = applied.filter_key.as_deref().unwrap_or("<none>"),
            limited = applied.limited,
            "query built"
        );
        Some(BuiltQuery { query, applied })
    }

    fn select(&self, query: &mut Box<dyn QueryObject>, fields: &[RecordField]) -> SelectionMode {
        if fields.is_empty() {
            return SelectionMode::Default;
        }
        if self.capabilities.select_field {
            let accepted = fields
                .iter()
                .filter(|field| {
                    refine(query, "select_field", |query| query.select_field(field.external_name(), field.internal_name()))
                })
                .count();
            if accepted > 0 {
                return SelectionMode::PerField;
            }
        }
        if self.capabilities.select_bulk {
            let names: Vec<&str> = fields.iter().map(|field| field.external_name()).collect();
            if refine(query, "select_bulk", |query| query.select_bulk(&names)) {
                return SelectionMode::Bulk;
            }
        }
        SelectionMode::Default
    }
}

/// Tries each filter key, then each fallback key, stopping at the first accepted.
fn apply_filter(query: &mut Box<dyn QueryObject>, request: &QueryRequest) -> Option<String> {
    request
        .filter_keys
        .iter()
        .chain(&request.fallback_filter_keys)
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .find(|key| refine(query, "filter", |query| query.filter(key, &request.filter_value)))
        .map(str::to_string)
}

/// Runs one refinement, adopting a replacement query on success.
///
/// Returns whether the refinement was accepted. Failures keep the previous
/// query reference.
fn refine<F>(query: &mut Box<dyn QueryObject>, operation: &'static str, call: F) -> bool
where
    F: FnOnce(&mut dyn QueryObject) -> Result<QueryStep, BackendError>,
{
    match call(query.as_mut()) {
        Ok(QueryStep::InPlace) => true,
        Ok(QueryStep::Replaced(next)) => {
            *query = next;
            true
        }
        Err(error) => {
            debug!(operation, %error, "query refinement skipped");
            false
        }
    }
}
