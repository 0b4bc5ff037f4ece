//! Field lookup across key spellings and nesting conventions.
//!
//! Backends mix PascalCase external aliases with lower-case internal names and
//! sometimes nest the actual values one level deeper under `fields` or `data`.

use serde_json::{Map, Value};

/// Nested containers searched after the record itself, in order.
const NESTED_CONTAINERS: [&str; 2] = ["fields", "data"];

/// Returns the first present value among `candidate_keys`.
///
/// For each candidate, in order: the key as given, then its lower-cased form,
/// on the container itself; then the same two lookups on a nested `fields`
/// object; then on a nested `data` object. `null` counts as absent.
///
/// ```rust
/// use intake_engine::picker::pick;
/// use serde_json::json;
///
/// let record = json!({"fields": {"status": "open"}, "Name": "Acme"});
/// let record = record.as_object().unwrap();
/// assert_eq!(pick(record, &["Status"]), Some(&json!("open")));
/// assert_eq!(pick(record, &["name", "Name"]), Some(&json!("Acme")));
/// assert_eq!(pick(record, &["missing"]), None);
/// ```
pub fn pick<'a>(container: &'a Map<String, Value>, candidate_keys: &[&str]) -> Option<&'a Value> {
    let scopes: Vec<&Map<String, Value>> = std::iter::once(container)
        .chain(NESTED_CONTAINERS.iter().filter_map(|key| container.get(*key).and_then(Value::as_object)))
        .collect();

    candidate_keys.iter().find_map(|key| {
        let lowered = key.to_lowercase();
        scopes.iter().copied().find_map(|scope| lookup(scope, key).or_else(|| lookup(scope, &lowered)))
    })
}

/// [`pick`] followed by [`value_text`]; absent values become the empty string.
pub fn pick_text(container: &Map<String, Value>, candidate_keys: &[&str]) -> String {
    pick(container, candidate_keys).map(value_text).unwrap_or_default()
}

fn lookup<'a>(scope: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    scope.get(key).filter(|value| !value.is_null())
}

/// Renders a JSON value as trimmed display text.
///
/// Strings are trimmed, numbers and booleans use their JSON spelling, `null`
/// is empty, and arrays or objects are rendered as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn direct_key_wins_over_nested_containers() {
        let record = object(json!({"Status": "direct", "fields": {"Status": "nested"}}));
        assert_eq!(pick(&record, &["Status"]), Some(&json!("direct")));
    }

    #[test]
    fn lower_cased_key_is_tried_before_nested_containers() {
        let record = object(json!({"status": "lower", "fields": {"Status": "nested"}}));
        assert_eq!(pick(&record, &["Status"]), Some(&json!("lower")));
    }

    #[test]
    fn fields_container_is_searched_before_data() {
        let record = object(json!({"data": {"source": "from-data"}, "fields": {"source": "from-fields"}}));
        assert_eq!(pick(&record, &["Source"]), Some(&json!("from-fields")));

        let record = object(json!({"data": {"source": "from-data"}}));
        assert_eq!(pick(&record, &["Source"]), Some(&json!("from-data")));
    }

    #[test]
    fn earlier_candidate_wins_even_when_nested() {
        let record = object(json!({"unique_id": "direct-internal", "fields": {"UniqueId": "nested-external"}}));
        assert_eq!(pick(&record, &["UniqueId", "unique_id"]), Some(&json!("nested-external")));
    }

    #[test]
    fn null_values_fall_through_to_later_candidates() {
        let record = object(json!({"Name": null, "name": "Acme"}));
        assert_eq!(pick(&record, &["Name"]), Some(&json!("Acme")));
        assert_eq!(pick(&object(json!({"Name": null})), &["Name"]), None);
    }

    #[test]
    fn non_object_nested_values_are_ignored() {
        let record = object(json!({"fields": ["id"], "data": "text"}));
        assert_eq!(pick(&record, &["id"]), None);
    }

    #[test]
    fn value_text_renders_scalars_and_trims_strings() {
        assert_eq!(value_text(&json!("  open \n")), "open");
        assert_eq!(value_text(&json!(42)), "42");
        assert_eq!(value_text(&json!(1.5)), "1.5");
        assert_eq!(value_text(&json!(true)), "true");
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!([7, "Owner"])), r#"[7,"Owner"]"#);
        assert_eq!(pick_text(&object(json!({"Id": 42})), &["Id"]), "42");
        assert_eq!(pick_text(&object(json!({})), &["Id"]), "");
    }
}
