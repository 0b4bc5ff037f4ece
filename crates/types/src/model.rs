//! Schema registry descriptors.

use serde::{Deserialize, Serialize};

/// Descriptor of one entity model in a backend's schema registry.
///
/// All parts are optional; registries in the wild fill in any subset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelDescriptor {
    /// Schema name of the model.
    pub name: Option<String>,
    /// Human-facing label shown in backend tooling.
    pub display_label: Option<String>,
    /// Short label, often singular.
    pub label: Option<String>,
}

impl ModelDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_display_label(mut self, display_label: impl Into<String>) -> Self {
        self.display_label = Some(display_label.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Present, non-blank parts in identity order: display label, label, name.
    pub fn identity_parts(&self) -> impl Iterator<Item = &str> {
        [&self.display_label, &self.label, &self.name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
    }

    /// True when no part carries a value.
    pub fn is_empty(&self) -> bool {
        self.identity_parts().next().is_none()
    }
}
