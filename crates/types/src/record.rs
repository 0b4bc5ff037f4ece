//! Canonical record shape and field naming table.

use serde::{Deserialize, Serialize};

/// Fixed-shape record produced by a resolution.
///
/// Every field is always present. Values missing upstream are empty strings,
/// never `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalRecord {
    pub id: String,
    pub unique_id: String,
    pub source: String,
    pub created_at: String,
    pub owner_id: String,
    pub contact_id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub name: String,
    pub request_summary: String,
    pub status: String,
}

impl CanonicalRecord {
    /// Returns the value stored for `field`.
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Id => &self.id,
            RecordField::UniqueId => &self.unique_id,
            RecordField::Source => &self.source,
            RecordField::CreatedAt => &self.created_at,
            RecordField::OwnerId => &self.owner_id,
            RecordField::ContactId => &self.contact_id,
            RecordField::Type => &self.r#type,
            RecordField::Name => &self.name,
            RecordField::RequestSummary => &self.request_summary,
            RecordField::Status => &self.status,
        }
    }

    /// Stores `value` for `field`, replacing the previous value.
    pub fn set(&mut self, field: RecordField, value: String) {
        let slot = match field {
            RecordField::Id => &mut self.id,
            RecordField::UniqueId => &mut self.unique_id,
            RecordField::Source => &mut self.source,
            RecordField::CreatedAt => &mut self.created_at,
            RecordField::OwnerId => &mut self.owner_id,
            RecordField::ContactId => &mut self.contact_id,
            RecordField::Type => &mut self.r#type,
            RecordField::Name => &mut self.name,
            RecordField::RequestSummary => &mut self.request_summary,
            RecordField::Status => &mut self.status,
        };
        *slot = value;
    }

    /// True when no field carries a value.
    pub fn is_blank(&self) -> bool {
        RecordField::ALL.iter().all(|field| self.get(*field).is_empty())
    }
}

/// The fields of a [`CanonicalRecord`].
///
/// Backends disagree on spelling: some expose PascalCase external aliases
/// (`UniqueId`), others the snake_case internal names (`unique_id`). Each field
/// carries its ordered list of candidate keys, external alias first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Id,
    UniqueId,
    Source,
    CreatedAt,
    OwnerId,
    ContactId,
    Type,
    Name,
    RequestSummary,
    Status,
}

impl RecordField {
    pub const ALL: [RecordField; 10] = [
        RecordField::Id,
        RecordField::UniqueId,
        RecordField::Source,
        RecordField::CreatedAt,
        RecordField::OwnerId,
        RecordField::ContactId,
        RecordField::Type,
        RecordField::Name,
        RecordField::RequestSummary,
        RecordField::Status,
    ];

    /// Key used in the serialized canonical record.
    pub fn canonical_key(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::UniqueId => "unique_id",
            RecordField::Source => "source",
            RecordField::CreatedAt => "created_at",
            RecordField::OwnerId => "owner_id",
            RecordField::ContactId => "contact_id",
            RecordField::Type => "type",
            RecordField::Name => "name",
            RecordField::RequestSummary => "request_summary",
            RecordField::Status => "status",
        }
    }

    /// Candidate keys in lookup priority order. The first entry is the
    /// external alias and the second the internal name.
    pub fn candidate_keys(self) -> &'static [&'static str] {
        match self {
            RecordField::Id => &["Id", "id"],
            RecordField::UniqueId => &["UniqueId", "unique_id", "uniqueId"],
            RecordField::Source => &["Source", "source"],
            RecordField::CreatedAt => &["CreatedAt", "created_at", "CreatedDate", "created_date"],
            RecordField::OwnerId => &["OwnerId", "owner_id"],
            RecordField::ContactId => &["ContactId", "contact_id", "PrimaryContactId", "primary_contact_id"],
            RecordField::Type => &["Type", "type"],
            RecordField::Name => &["Name", "name", "DisplayName", "display_name"],
            RecordField::RequestSummary => &["RequestSummary", "request_summary", "Request", "request"],
            RecordField::Status => &["Status", "status"],
        }
    }

    /// External (PascalCase) alias requested from the backend.
    pub fn external_name(self) -> &'static str {
        self.candidate_keys()[0]
    }

    /// Internal (snake_case) name the backend may report instead.
    pub fn internal_name(self) -> &'static str {
        self.candidate_keys()[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_record_serializes_every_field_as_empty_string() {
        let value = serde_json::to_value(CanonicalRecord::default()).expect("serialize record");
        let object = value.as_object().expect("record serializes to an object");
        assert_eq!(object.len(), RecordField::ALL.len());
        for field in RecordField::ALL {
            assert_eq!(object.get(field.canonical_key()), Some(&json!("")), "field {}", field.canonical_key());
        }
    }

    #[test]
    fn set_and_get_address_the_same_slot() {
        let mut record = CanonicalRecord::default();
        for (index, field) in RecordField::ALL.iter().enumerate() {
            record.set(*field, format!("value-{index}"));
        }
        for (index, field) in RecordField::ALL.iter().enumerate() {
            assert_eq!(record.get(*field), format!("value-{index}"));
        }
        assert!(!record.is_blank());
        assert!(CanonicalRecord::default().is_blank());
    }

    #[test]
    fn candidate_keys_put_external_alias_before_internal_name() {
        assert_eq!(RecordField::UniqueId.external_name(), "UniqueId");
        assert_eq!(RecordField::UniqueId.internal_name(), "unique_id");
        for field in RecordField::ALL {
            assert!(field.candidate_keys().len() >= 2);
            assert_eq!(field.internal_name(), field.canonical_key());
        }
    }
}
