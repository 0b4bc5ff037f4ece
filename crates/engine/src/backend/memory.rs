//! Fixture-driven in-memory backend.
//!
//! A [`BackendFixture`] describes a whole backend deployment: its slug, its
//! schema registry, the records held by each model, and the quirks of the
//! client version (capability surface, builder style, execution protocol and
//! response envelope). [`MemoryBackend`] serves that fixture through the
//! backend traits so the resolver can be exercised end to end.

use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use anyhow::Context;
use indexmap::IndexMap;
use intake_types::{CapabilityProfile, ModelDescriptor, QueryCapabilities};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use super::{BackendClient, ModelHandle, QueryObject, QueryStep};
use crate::{
    envelope::{EnvelopeShape, unwrap_raw_record},
    error::BackendError,
    execution::{ExecutionHandle, Observer, Subscription},
    picker::value_text,
};

/// How query execution delivers its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionProtocol {
    #[default]
    Eager,
    Thenable,
    Subscription,
}

/// Whether refinements mutate the query or hand back a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuilderStyle {
    #[default]
    InPlace,
    Replacing,
}

/// One model held by a fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureModel {
    /// Schema descriptor; a model without one exposes no schema.
    pub descriptor: Option<ModelDescriptor>,
    /// Left out of registry enumeration, reachable only by name.
    pub unlisted: bool,
    pub records: Vec<Value>,
}

/// A complete in-memory backend deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendFixture {
    pub slug: Option<String>,
    /// Capability profile, used unless `capabilities` spells the surface out.
    pub profile: CapabilityProfile,
    pub capabilities: Option<QueryCapabilities>,
    pub protocol: ExecutionProtocol,
    pub builder_style: BuilderStyle,
    pub envelope: EnvelopeShape,
    /// When set, registry enumeration fails with this message.
    pub registry_error: Option<String>,
    /// Models keyed by registry key, in registry order.
    pub models: IndexMap<String, FixtureModel>,
}

impl BackendFixture {
    pub fn capabilities(&self) -> QueryCapabilities {
        self.capabilities.unwrap_or_else(|| self.profile.capabilities())
    }

    /// Registry key of the model acquired as `name`: a key match first, then a descriptor name match.
    fn model_key(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.models.get_key_value(name) {
            return Some(key.as_str());
        }
        self.models
            .iter()
            .find(|(_, model)| model.descriptor.as_ref().and_then(|descriptor| descriptor.name.as_deref()) == Some(name))
            .map(|(key, _)| key.as_str())
    }
}

/// Snapshot of the calls a [`MemoryBackend`] has served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub registry_scans: usize,
    pub model_switches: usize,
    pub executions: usize,
    pub destroys: usize,
}

#[derive(Debug, Default)]
struct Counters {
    registry_scans: AtomicUsize,
    model_switches: AtomicUsize,
    executions: AtomicUsize,
    destroys: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Backend client serving a [`BackendFixture`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    fixture: Arc<BackendFixture>,
    counters: Arc<Counters>,
}

impl MemoryBackend {
    pub fn from_fixture(fixture: BackendFixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
            counters: Arc::default(),
        }
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let fixture: BackendFixture = serde_json::from_str(content).context("invalid backend fixture")?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("failed to read backend fixture: {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("failed to load backend fixture: {}", path.display()))
    }

    pub fn fixture(&self) -> &BackendFixture {
        &self.fixture
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            registry_scans: self.counters.registry_scans.load(Ordering::Relaxed),
            model_switches: self.counters.model_switches.load(Ordering::Relaxed),
            executions: self.counters.executions.load(Ordering::Relaxed),
            destroys: self.counters.destroys.load(Ordering::Relaxed),
        }
    }
}

impl BackendClient for MemoryBackend {
    fn slug(&self) -> Option<String> {
        self.fixture.slug.clone()
    }

    fn schema_registry(&self) -> Result<Vec<(String, ModelDescriptor)>, BackendError> {
        Counters::bump(&self.counters.registry_scans);
        if let Some(message) = &self.fixture.registry_error {
            return Err(BackendError::call(message.clone()));
        }
        Ok(self
            .fixture
            .models
            .iter()
            .filter(|(_, model)| !model.unlisted)
            .map(|(key, model)| (key.clone(), model.descriptor.clone().unwrap_or_default()))
            .collect())
    }

    fn switch_to(&self, model_name: &str) -> Result<Box<dyn ModelHandle>, BackendError> {
        Counters::bump(&self.counters.model_switches);
        let key = self
            .fixture
            .model_key(model_name)
            .ok_or_else(|| BackendError::model_not_found(model_name))?;
        Ok(Box::new(MemoryModel {
            key: key.to_string(),
            fixture: Arc::clone(&self.fixture),
            counters: Arc::clone(&self.counters),
        }))
    }

    fn capabilities(&self) -> QueryCapabilities {
        self.fixture.capabilities()
    }
}

struct MemoryModel {
    key: String,
    fixture: Arc<BackendFixture>,
    counters: Arc<Counters>,
}

impl MemoryModel {
    fn model(&self) -> Option<&FixtureModel> {
        self.fixture.models.get(&self.key)
    }
}

impl ModelHandle for MemoryModel {
    fn name(&self) -> &str {
        &self.key
    }

    fn schema(&self) -> Option<ModelDescriptor> {
        self.model().and_then(|model| model.descriptor.clone())
    }

    fn query(&self) -> Result<Box<dyn QueryObject>, BackendError> {
        if self.model().is_none() {
            return Err(BackendError::model_not_found(self.key.clone()));
        }
        Ok(Box::new(MemoryQuery {
            key: self.key.clone(),
            fixture: Arc::clone(&self.fixture),
            counters: Arc::clone(&self.counters),
            selection: None,
            filters: Vec::new(),
            limit: None,
        }))
    }
}

#[derive(Clone)]
struct MemoryQuery {
    key: String,
    fixture: Arc<BackendFixture>,
    counters: Arc<Counters>,
    /// `(source field, output key)` pairs; `None` returns records untouched.
    selection: Option<Vec<(String, String)>>,
    filters: Vec<(String, Value)>,
    limit: Option<usize>,
}

impl MemoryQuery {
    fn records(&self) -> &[Value] {
        self.fixture.models.get(&self.key).map(|model| model.records.as_slice()).unwrap_or_default()
    }

    fn refine<F>(&mut self, operation: &'static str, supported: bool, apply: F) -> Result<QueryStep, BackendError>
    where
        F: FnOnce(&mut Self) -> Result<(), BackendError>,
    {
        if !supported {
            return Err(BackendError::unsupported(operation));
        }
        match self.fixture.builder_style {
            BuilderStyle::InPlace => {
                apply(self)?;
                Ok(QueryStep::InPlace)
            }
            BuilderStyle::Replacing => {
                let mut next = self.clone();
                apply(&mut next)?;
                Ok(QueryStep::Replaced(Box::new(next)))
            }
        }
    }

    fn select(&mut self, name: &str, alias: &str) {
        self.selection.get_or_insert_with(Vec::new).push((name.to_string(), alias.to_string()));
    }

    fn matches(&self, record: &Value) -> bool {
        let Some(container) = unwrap_raw_record(record) else {
            return self.filters.is_empty();
        };
        self.filters.iter().all(|(field, expected)| {
            container
                .get(field)
                .is_some_and(|actual| value_text(actual) == value_text(expected))
        })
    }

    fn project(&self, record: &Value) -> Value {
        let (Some(selection), Some(container)) = (&self.selection, unwrap_raw_record(record)) else {
            return record.clone();
        };
        let projected: Map<String, Value> = selection
            .iter()
            .filter_map(|(name, alias)| container.get(name).map(|value| (alias.clone(), value.clone())))
            .collect();
        Value::Object(projected)
    }

    fn response(&self) -> Value {
        let records = self
            .records()
            .iter()
            .filter(|record| self.matches(record))
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|record| self.project(record))
            .collect();
        self.fixture.envelope.wrap(records, &self.key)
    }
}

impl QueryObject for MemoryQuery {
    fn deselect_all(&mut self) -> Result<QueryStep, BackendError> {
        let supported = self.fixture.capabilities().deselect_all;
        self.refine("deselect_all", supported, |query| {
            query.selection = Some(Vec::new());
            Ok(())
        })
    }

    fn select_field(&mut self, name: &str, alias: &str) -> Result<QueryStep, BackendError> {
        let supported = self.fixture.capabilities().select_field;
        self.refine("select_field", supported, |query| {
            query.select(name, alias);
            Ok(())
        })
    }

    fn select_bulk(&mut self, names: &[&str]) -> Result<QueryStep, BackendError> {
        let supported = self.fixture.capabilities().select_bulk;
        self.refine("select_bulk", supported, |query| {
            for name in names {
                query.select(name, name);
            }
            Ok(())
        })
    }

    fn filter(&mut self, field: &str, value: &Value) -> Result<QueryStep, BackendError> {
        let supported = self.fixture.capabilities().filter;
        self.refine("filter", supported, |query| {
            let known = query
                .records()
                .iter()
                .filter_map(unwrap_raw_record)
                .any(|container| container.contains_key(field));
            if !known {
                return Err(BackendError::call(format!("unknown filter field '{field}' on {}", query.key)));
            }
            query.filters.push((field.to_string(), value.clone()));
            Ok(())
        })
    }

    fn limit(&mut self, count: usize) -> Result<QueryStep, BackendError> {
        let supported = self.fixture.capabilities().limit;
        self.refine("limit", supported, |query| {
            query.limit = Some(count);
            Ok(())
        })
    }

    fn execute(&mut self) -> Result<Option<ExecutionHandle>, BackendError> {
        Counters::bump(&self.counters.executions);
        let response = self.response();
        let handle = match self.fixture.protocol {
            ExecutionProtocol::Eager => ExecutionHandle::ready(response),
            ExecutionProtocol::Thenable => ExecutionHandle::thenable(async move {
                tokio::task::yield_now().await;
                Ok(response)
            }),
            ExecutionProtocol::Subscription => ExecutionHandle::subscription(move |observer: Observer| -> Box<dyn Subscription> {
                let task = tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    observer.next(response);
                    observer.complete();
                });
                Box::new(TaskSubscription(task))
            }),
        };
        Ok(Some(handle))
    }

    fn destroy(&mut self) -> Result<(), BackendError> {
        if !self.fixture.capabilities().destroy {
            return Err(BackendError::unsupported("destroy"));
        }
        Counters::bump(&self.counters.destroys);
        Ok(())
    }
}

/// Subscription backed by the task that feeds the observer.
struct TaskSubscription(JoinHandle<()>);

impl Subscription for TaskSubscription {
    fn unsubscribe(&mut self) {
        self.0.abort();
    }
}
