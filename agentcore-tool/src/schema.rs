//! Parameter declarations and JSON-Schema derivation (§4.4).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn as_schema_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone)]
pub struct ToolParam {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
}

impl ToolParam {
    /// A required parameter with no default or enum constraint.
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self { name: name.into(), param_type, description: description.into(), required: true, default: None, enum_values: None }
    }

    /// An optional parameter with a default value.
    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>, default: Value) -> Self {
        Self { name: name.into(), param_type, description: description.into(), required: false, default: Some(default), enum_values: None }
    }

    /// Restrict this parameter to a fixed set of values.
    #[must_use]
    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Derive a `{type:"object", properties, required}` JSON-Schema block from
/// a list of parameter declarations.
pub fn derive_schema(params: &[ToolParam]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for p in params {
        let mut prop = serde_json::json!({
            "type": p.param_type.as_schema_str(),
            "description": p.description,
        });
        if let Some(default) = &p.default {
            prop["default"] = default.clone();
        }
        if let Some(values) = &p.enum_values {
            prop["enum"] = Value::Array(values.clone());
        }
        properties.insert(p.name.clone(), prop);
        if p.required {
            required.push(Value::String(p.name.clone()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": Value::Array(required),
    })
}
