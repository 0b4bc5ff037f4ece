//! Query capability descriptors.
//!
//! Backend versions differ in which query-builder operations they implement.
//! Instead of probing for each operation at call time, a client reports its
//! surface once as a [`QueryCapabilities`] value.

use serde::{Deserialize, Serialize};

/// Coarse classification of a capability surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityProfile {
    /// Selection, filtering and limiting are available.
    #[default]
    FullCapability,
    /// Only bulk selection is available; the backend decides the row set.
    SelectOnly,
    /// Nothing beyond acquiring and executing a query.
    Minimal,
}

impl CapabilityProfile {
    /// The operation set a backend of this profile is assumed to implement.
    pub fn capabilities(self) -> QueryCapabilities {
        match self {
            CapabilityProfile::FullCapability => QueryCapabilities {
                deselect_all: true,
                select_field: true,
                select_bulk: true,
                filter: true,
                limit: true,
                destroy: true,
            },
            CapabilityProfile::SelectOnly => QueryCapabilities {
                select_bulk: true,
                destroy: true,
                ..QueryCapabilities::none()
            },
            CapabilityProfile::Minimal => QueryCapabilities::none(),
        }
    }
}

/// Operations a query object is known to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCapabilities {
    #[serde(default)]
    pub deselect_all: bool,
    #[serde(default)]
    pub select_field: bool,
    #[serde(default)]
    pub select_bulk: bool,
    #[serde(default)]
    pub filter: bool,
    #[serde(default)]
    pub limit: bool,
    #[serde(default)]
    pub destroy: bool,
}

impl QueryCapabilities {
    pub const fn none() -> Self {
        Self {
            deselect_all: false,
            select_field: false,
            select_bulk: false,
            filter: false,
            limit: false,
            destroy: false,
        }
    }

    /// True when any form of explicit field selection is available.
    pub fn supports_selection(&self) -> bool {
        self.select_field || self.select_bulk
    }

    /// Classifies this surface into a [`CapabilityProfile`].
    pub fn profile(&self) -> CapabilityProfile {
        if self.supports_selection() && self.filter && self.limit {
            CapabilityProfile::FullCapability
        } else if self.supports_selection() {
            CapabilityProfile::SelectOnly
        } else {
            CapabilityProfile::Minimal
        }
    }
}

impl Default for QueryCapabilities {
    fn default() -> Self {
        CapabilityProfile::default().capabilities()
    }
}

impl From<CapabilityProfile> for QueryCapabilities {
    fn from(profile: CapabilityProfile) -> Self {
        profile.capabilities()
    }
}
