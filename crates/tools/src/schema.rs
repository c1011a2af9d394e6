//! Tool trait, schemas and results

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default timeout for tool execution
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Tool {tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("Tool execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        ToolError::NotFound(name.into())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        ToolError::InvalidParams(message.into())
    }

    pub fn timeout(tool: impl Into<String>, secs: u64) -> Self {
        ToolError::Timeout {
            tool: tool.into(),
            secs,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}

impl From<dealer_agent_core::Error> for ToolError {
    fn from(err: dealer_agent_core::Error) -> Self {
        ToolError::Execution(err.to_string())
    }
}

/// JSON Schema subset for a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl PropertySchema {
    fn typed(prop_type: &str, description: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: description.into(),
            enum_values: None,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    pub fn enum_type(description: impl Into<String>, values: Vec<String>) -> Self {
        let mut schema = Self::typed("string", description);
        schema.enum_values = Some(values);
        schema
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn check(&self, name: &str, value: &Value) -> Result<(), ToolError> {
        let type_ok = match self.prop_type.as_str() {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_u64() || value.is_i64(),
            "boolean" => value.is_boolean(),
            _ => true,
        };
        if !type_ok {
            return Err(ToolError::invalid_params(format!(
                "{} must be a {}",
                name, self.prop_type
            )));
        }

        if let (Some(allowed), Some(s)) = (&self.enum_values, value.as_str()) {
            if !allowed.iter().any(|a| a == s) {
                return Err(ToolError::invalid_params(format!(
                    "{} must be one of: {}",
                    name,
                    allowed.join(", ")
                )));
            }
        }

        if let Some(n) = value.as_f64() {
            let below = self.minimum.map(|min| n < min).unwrap_or(false);
            let above = self.maximum.map(|max| n > max).unwrap_or(false);
            if below || above {
                return Err(ToolError::invalid_params(format!(
                    "{} is out of range",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Object schema for tool input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Check required keys, declared types, enums and ranges
    pub fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let object = input
            .as_object()
            .ok_or_else(|| ToolError::invalid_params("arguments must be a JSON object"))?;

        for name in &self.required {
            if object.get(name).map(Value::is_null).unwrap_or(true) {
                return Err(ToolError::invalid_params(format!("{} is required", name)));
            }
        }

        for (name, value) in object {
            if value.is_null() {
                continue;
            }
            if let Some(schema) = self.properties.get(name) {
                schema.check(name, value)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Json { value: Value },
}

/// Tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn json(value: Value) -> Self {
        Self {
            content: vec![ContentBlock::Json { value }],
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Plain text suitable for a template variable
    ///
    /// JSON blocks contribute their `summary` field when present.
    pub fn as_reply_fragment(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.clone(),
                ContentBlock::Json { value } => value
                    .get("summary")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A callable tool
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    /// Validate arguments against the schema before execution
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        self.schema().input_schema.validate(input)
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    fn timeout_secs(&self) -> u64 {
        DEFAULT_TOOL_TIMEOUT_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> InputSchema {
        InputSchema::object()
            .property("vehicle_id", PropertySchema::string("Vehicle id"), true)
            .property(
                "condition",
                PropertySchema::enum_type("Condition", vec!["new".into(), "used".into()]),
                false,
            )
            .property(
                "limit",
                PropertySchema::integer("Max results").with_range(1.0, 25.0),
                false,
            )
    }

    #[test]
    fn test_required_field() {
        let err = schema().validate(&json!({})).unwrap_err();
        assert_eq!(err, ToolError::invalid_params("vehicle_id is required"));
    }

    #[test]
    fn test_type_enum_and_range() {
        let s = schema();
        assert!(s.validate(&json!({"vehicle_id": "v1"})).is_ok());
        assert!(s.validate(&json!({"vehicle_id": 7})).is_err());
        assert!(s.validate(&json!({"vehicle_id": "v1", "condition": "salvage"})).is_err());
        assert!(s.validate(&json!({"vehicle_id": "v1", "limit": 100})).is_err());
        assert!(s.validate(&json!({"vehicle_id": "v1", "limit": 2.5})).is_err());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(schema().validate(&json!(["v1"])).is_err());
    }

    #[test]
    fn test_reply_fragment_prefers_summary() {
        let output = ToolOutput::json(json!({"summary": "2 vehicles match", "total_count": 2}));
        assert_eq!(output.as_reply_fragment(), "2 vehicles match");
        assert_eq!(ToolOutput::text("hello").as_reply_fragment(), "hello");
    }

    #[test]
    fn test_schema_serializes_as_json_schema() {
        let json = serde_json::to_value(schema()).unwrap();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["condition"]["enum"][1], "used");
        assert_eq!(json["required"][0], "vehicle_id");
    }
}
