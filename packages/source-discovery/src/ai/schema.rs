//! Strict JSON schemas for structured generation.
//!
//! Strict structured-output endpoints reject schemas that allow extra keys,
//! leave any property optional, or use `$ref`. [`strict_schema`] rewrites a
//! schemars schema into that shape.

use schemars::{schema_for, JsonSchema};
use serde_json::{Map, Value};

/// Generate a strict response schema for `T`.
///
/// Every object gets `additionalProperties: false` and lists all of its
/// properties as required (nullable fields stay nullable through their
/// type). Definitions are inlined and the `$schema` header is dropped.
pub fn strict_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();

    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions")
        }
        _ => None,
    };

    if let Some(Value::Object(defs)) = definitions {
        inline_definitions(&mut value, &defs);
    }
    close_objects(&mut value);

    value
}

fn close_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".into(), Value::Bool(false));

                let required: Option<Vec<Value>> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().map(Value::String).collect());
                if let Some(required) = required {
                    map.insert("required".into(), Value::Array(required));
                }
            }
            map.values_mut().for_each(close_objects);
        }
        Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}

fn inline_definitions(value: &mut Value, definitions: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            let referenced = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|r| r.strip_prefix("#/definitions/"))
                .and_then(|name| definitions.get(name))
                .cloned();
            if let Some(def) = referenced {
                *value = def;
                inline_definitions(value, definitions);
                return;
            }

            // schemars wraps described refs as a single-element allOf
            let single = match map.get("allOf").and_then(Value::as_array) {
                Some(all_of) if all_of.len() == 1 => all_of.first().cloned(),
                _ => None,
            };
            if let Some(inner) = single {
                map.remove("allOf");
                if let Value::Object(inner) = inner {
                    for (k, v) in inner {
                        map.entry(k).or_insert(v);
                    }
                }
                inline_definitions(value, definitions);
                return;
            }

            map.values_mut()
                .for_each(|v| inline_definitions(v, definitions));
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|v| inline_definitions(v, definitions)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    #[serde(rename_all = "lowercase")]
    #[allow(dead_code)]
    enum Label {
        Keep,
        Drop,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Entry {
        i: usize,
        label: Label,
        notes: Option<String>,
    }

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Envelope {
        items: Vec<Entry>,
    }

    #[test]
    fn test_top_level_is_closed() {
        let schema = strict_schema::<Envelope>();
        let obj = schema.as_object().unwrap();

        assert!(!obj.contains_key("$schema"));
        assert!(!obj.contains_key("definitions"));
        assert_eq!(obj["additionalProperties"], Value::Bool(false));
        assert_eq!(obj["required"], serde_json::json!(["items"]));
    }

    #[test]
    fn test_nested_objects_inlined_and_closed() {
        let schema = strict_schema::<Envelope>();
        let entry = &schema["properties"]["items"]["items"];

        assert!(entry.get("$ref").is_none());
        assert_eq!(entry["type"], "object");
        assert_eq!(entry["additionalProperties"], Value::Bool(false));

        let required: Vec<&str> = entry["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"i"));
        assert!(required.contains(&"label"));
        assert!(required.contains(&"notes"));

        let label = &entry["properties"]["label"];
        assert!(label.get("$ref").is_none());
        assert_eq!(label["enum"], serde_json::json!(["keep", "drop"]));
    }
}
