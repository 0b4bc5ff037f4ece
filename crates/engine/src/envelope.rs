//! Response envelope normalization.
//!
//! A completed execution returns a top-level value whose shape depends on the
//! backend. [`extract_records`] recognises the known shapes and yields the
//! candidate records in order; [`unwrap_raw_record`] then finds the field
//! container inside one record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The response envelope shapes a backend may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeShape {
    /// The envelope is the record list itself.
    #[default]
    List,
    /// `{ "resp": [...] }`
    Resp,
    /// `{ "records": [...] }`
    Records,
    /// `{ "records": { "<key>": {...}, ... } }`
    RecordsMap,
    /// `{ "data": { "<collection>": [...] } }`
    Data,
}

impl EnvelopeShape {
    /// Detects the shape of `envelope`, checking shapes in priority order.
    pub fn detect(envelope: &Value) -> Option<Self> {
        if envelope.is_array() {
            return Some(Self::List);
        }
        let object = envelope.as_object()?;
        if object.get("resp").is_some_and(Value::is_array) {
            return Some(Self::Resp);
        }
        match object.get("records") {
            Some(Value::Array(_)) => return Some(Self::Records),
            Some(Value::Object(_)) => return Some(Self::RecordsMap),
            _ => {}
        }
        let data = object.get("data").and_then(Value::as_object)?;
        data.values().next().filter(|first| first.is_array()).map(|_| Self::Data)
    }

    /// Wraps `records` into an envelope of this shape.
    ///
    /// `collection` names the inner list for [`EnvelopeShape::Data`]. Keyed
    /// collections use each record's `id` when present, else its position; a
    /// key that is already taken gets a `#<position>` suffix.
    pub fn wrap(self, records: Vec<Value>, collection: &str) -> Value {
        match self {
            Self::List => Value::Array(records),
            Self::Resp => single_entry("resp", Value::Array(records)),
            Self::Records => single_entry("records", Value::Array(records)),
            Self::RecordsMap => {
                let mut keyed = Map::new();
                for (position, record) in records.into_iter().enumerate() {
                    let key = unique_key(&keyed, record_key(&record, position), position);
                    keyed.insert(key, record);
                }
                single_entry("records", Value::Object(keyed))
            }
            Self::Data => single_entry("data", single_entry(collection, Value::Array(records))),
        }
    }
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), value);
    Value::Object(object)
}

fn record_key(record: &Value, position: usize) -> String {
    match record.get("id").or_else(|| record.get("Id")) {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => position.to_string(),
    }
}

fn unique_key(keyed: &Map<String, Value>, base: String, position: usize) -> String {
    let mut key = base.clone();
    let mut suffix = position;
    while keyed.contains_key(&key) {
        key = format!("{base}#{suffix}");
        suffix += 1;
    }
    key
}

/// Extracts the ordered candidate records from a response envelope.
///
/// Never fails: an envelope matching no known shape yields an empty list.
/// Keyed collections keep their insertion order.
pub fn extract_records(envelope: &Value) -> Vec<Value> {
    let Some(shape) = EnvelopeShape::detect(envelope) else {
        return Vec::new();
    };
    let records = match shape {
        EnvelopeShape::List => envelope.as_array(),
        EnvelopeShape::Resp => envelope.get("resp").and_then(Value::as_array),
        EnvelopeShape::Records => envelope.get("records").and_then(Value::as_array),
        EnvelopeShape::RecordsMap => {
            return envelope
                .get("records")
                .and_then(Value::as_object)
                .map(|keyed| keyed.values().cloned().collect())
                .unwrap_or_default();
        }
        EnvelopeShape::Data => envelope
            .get("data")
            .and_then(Value::as_object)
            .and_then(|data| data.values().next())
            .and_then(Value::as_array),
    };
    records.cloned().unwrap_or_default()
}

/// Finds the field container of a raw record.
///
/// Records serialized from stateful client objects carry their fields under a
/// nested `state` object; that container is preferred when present. Otherwise
/// the record itself is the container. Non-object records have none.
pub fn unwrap_raw_record(raw: &Value) -> Option<&Map<String, Value>> {
    let direct = raw.as_object()?;
    Some(direct.get("state").and_then(Value::as_object).unwrap_or(direct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_list_is_returned_directly() {
        let envelope = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(extract_records(&envelope), vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn resp_list_is_extracted() {
        assert_eq!(extract_records(&json!({"resp": [{"id": 42}]})), vec![json!({"id": 42})]);
    }

    #[test]
    fn resp_takes_priority_over_records() {
        let envelope = json!({"records": [{"id": "r"}], "resp": [{"id": "p"}]});
        assert_eq!(extract_records(&envelope), vec![json!({"id": "p"})]);
    }

    #[test]
    fn records_list_is_extracted() {
        assert_eq!(extract_records(&json!({"records": [{"id": 7}]})), vec![json!({"id": 7})]);
    }

    #[test]
    fn records_map_values_keep_insertion_order() {
        let envelope: Value = serde_json::from_str(r#"{"records": {"z": {"id": 3}, "a": {"id": 1}, "m": {"id": 2}}}"#)
            .expect("parse envelope");
        assert_eq!(extract_records(&envelope), vec![json!({"id": 3}), json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn data_mapping_uses_its_first_value() {
        let envelope: Value =
            serde_json::from_str(r#"{"data": {"inquiries": [{"id": 5}], "other": [{"id": 6}]}}"#).expect("parse envelope");
        assert_eq!(extract_records(&envelope), vec![json!({"id": 5})]);
    }

    #[test]
    fn data_mapping_whose_first_value_is_not_a_list_yields_nothing() {
        let envelope: Value =
            serde_json::from_str(r#"{"data": {"count": 1, "items": [{"id": 5}]}}"#).expect("parse envelope");
        assert!(extract_records(&envelope).is_empty());
    }

    #[test]
    fn unknown_shapes_yield_empty_list() {
        for envelope in [json!(null), json!("text"), json!({"resp": {"id": 1}}), json!({"items": []}), json!({"data": []})] {
            assert!(extract_records(&envelope).is_empty(), "envelope {envelope}");
        }
    }

    #[test]
    fn wrap_and_detect_agree_for_every_shape() {
        let records = vec![json!({"id": 1, "name": "a"}), json!({"id": "two"}), json!({"name": "c"})];
        for shape in [
            EnvelopeShape::List,
            EnvelopeShape::Resp,
            EnvelopeShape::Records,
            EnvelopeShape::RecordsMap,
            EnvelopeShape::Data,
        ] {
            let envelope = shape.wrap(records.clone(), "inquiries");
            assert_eq!(EnvelopeShape::detect(&envelope), Some(shape));
            assert_eq!(extract_records(&envelope), records, "shape {shape:?}");
        }
    }

    #[test]
    fn records_map_keys_prefer_record_ids() {
        let envelope = EnvelopeShape::RecordsMap.wrap(vec![json!({"id": 9}), json!({"name": "x"})], "unused");
        let keys: Vec<_> = envelope["records"].as_object().expect("map").keys().cloned().collect();
        assert_eq!(keys, vec!["9".to_string(), "1".to_string()]);
    }

    #[test]
    fn records_map_keeps_records_whose_keys_collide() {
        let records = vec![json!({"name": "positional"}), json!({"id": 0, "name": "zero"}), json!({"id": "0#1"})];
        let envelope = EnvelopeShape::RecordsMap.wrap(records.clone(), "unused");
        let keys: Vec<_> = envelope["records"].as_object().expect("map").keys().cloned().collect();
        assert_eq!(keys, vec!["0".to_string(), "0#1".to_string(), "0#1#2".to_string()]);
        assert_eq!(extract_records(&envelope), records);
    }

    #[test]
    fn raw_record_prefers_nested_state() {
        let wrapped = json!({"state": {"id": 1}, "id": 2});
        assert_eq!(unwrap_raw_record(&wrapped).and_then(|fields| fields.get("id")), Some(&json!(1)));

        let direct = json!({"id": 2, "state": "open"});
        assert_eq!(unwrap_raw_record(&direct).and_then(|fields| fields.get("id")), Some(&json!(2)));

        assert!(unwrap_raw_record(&json!(42)).is_none());
    }
}
