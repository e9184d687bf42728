//! Output schemas for schema-constrained decoding.

use schemars::JsonSchema;
use serde_json::{Map, Value};

/// Structural descriptor a response must conform to.
///
/// Usually built from a Rust type with [`OutputSchema::of`], which produces a
/// schema the service accepts in strict mode.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

impl OutputSchema {
    /// Create a strict schema from a raw JSON schema value.
    ///
    /// The value is used verbatim; call [`OutputSchema::of`] to get the
    /// strict-mode normalisation.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: sanitize_name(&name.into()),
            schema,
            strict: true,
        }
    }

    /// Derive the schema of `T`, normalised for strict decoding
    pub fn of<T: JsonSchema>() -> Self {
        let mut schema = serde_json::to_value(schemars::schema_for!(T))
            .unwrap_or_else(|_| Value::Object(Map::new()));
        if let Value::Object(root) = &mut schema {
            root.remove("$schema");
        }
        close_objects(&mut schema);

        Self {
            name: sanitize_name(&T::schema_name()),
            schema,
            strict: true,
        }
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Strict mode requires every object to list all of its properties as
/// required and to forbid additional ones.
///
/// Only subschemas are visited. A property map is walked through its values,
/// so a field that happens to be called `properties` is left alone.
fn close_objects(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    if is_object_schema(map) {
        if let Some(Value::Object(properties)) = map.get("properties") {
            let required = properties
                .keys()
                .map(|k| Value::String(k.clone()))
                .collect::<Vec<_>>();
            map.insert("required".to_string(), Value::Array(required));
            map.insert("additionalProperties".to_string(), Value::Bool(false));
        }
    }

    for keyword in ["properties", "patternProperties", "$defs", "definitions"] {
        if let Some(Value::Object(children)) = map.get_mut(keyword) {
            children.values_mut().for_each(close_objects);
        }
    }
    for keyword in ["anyOf", "oneOf", "allOf", "prefixItems"] {
        if let Some(Value::Array(children)) = map.get_mut(keyword) {
            children.iter_mut().for_each(close_objects);
        }
    }
    for keyword in ["items", "additionalProperties", "not", "if", "then", "else"] {
        match map.get_mut(keyword) {
            Some(Value::Array(children)) => children.iter_mut().for_each(close_objects),
            Some(child @ Value::Object(_)) => close_objects(child),
            _ => {}
        }
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(ty)) => ty == "object",
        Some(Value::Array(types)) => types.iter().any(|ty| ty == "object"),
        _ => false,
    }
}

/// Schema names may only contain `[a-zA-Z0-9_-]`, up to 64 characters.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect();

    if cleaned.is_empty() {
        "response".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Verdict {
        /// Whether the claim holds
        holds: bool,
        confidence: Option<f32>,
        evidence: Vec<Evidence>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Evidence {
        source: String,
    }

    #[test]
    fn test_of_closes_every_object() {
        let schema = OutputSchema::of::<Verdict>();

        assert_eq!(schema.name, "Verdict");
        assert!(schema.strict);
        assert!(schema.schema.get("$schema").is_none());
        assert_eq!(schema.schema["additionalProperties"], Value::Bool(false));

        let required = schema.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert!(required.contains(&Value::String("confidence".to_string())));

        let evidence = &schema.schema["$defs"]["Evidence"];
        assert_eq!(evidence["additionalProperties"], Value::Bool(false));
        assert_eq!(evidence["required"], serde_json::json!(["source"]));
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Node {
        properties: String,
        label: String,
    }

    #[test]
    fn test_field_named_properties_is_not_treated_as_schema() {
        let schema = OutputSchema::of::<Node>();

        let properties = schema.schema["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["properties"]["type"], "string");
        assert!(properties["properties"].get("required").is_none());

        let required = schema.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 2);
        assert!(required.contains(&Value::String("properties".to_string())));
        assert!(required.contains(&Value::String("label".to_string())));
    }

    #[test]
    fn test_nested_objects_under_combinators_are_closed() {
        let mut raw = serde_json::json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"k": {"type": "string"}}}
                },
                "either": {
                    "anyOf": [
                        {"type": ["object", "null"], "properties": {"x": {"type": "integer"}}},
                        {"type": "string"}
                    ]
                }
            }
        });
        close_objects(&mut raw);

        let item = &raw["properties"]["tags"]["items"];
        assert_eq!(item["required"], serde_json::json!(["k"]));
        assert_eq!(item["additionalProperties"], Value::Bool(false));

        let variant = &raw["properties"]["either"]["anyOf"][0];
        assert_eq!(variant["required"], serde_json::json!(["x"]));
        assert!(raw["properties"]["either"]["anyOf"][1]
            .get("additionalProperties")
            .is_none());
    }

    #[test]
    fn test_names_are_sanitized() {
        let schema = OutputSchema::new("my schema<v2>", serde_json::json!({"type": "object"}));
        assert_eq!(schema.name, "my_schema_v2_");

        assert_eq!(OutputSchema::new("", Value::Null).name, "response");
    }

    #[test]
    fn test_new_keeps_schema_verbatim() {
        let raw = serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        });
        let schema = OutputSchema::new("raw", raw.clone()).with_strict(false);

        assert_eq!(schema.schema, raw);
        assert!(!schema.strict);
    }
}
