use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Provider-agnostic description of one callable tool
///
/// Immutable once built. Converted, never mutated, into each backend's
/// declaration shape by the request builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name, unique within a request
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Ordered parameter list
    pub parameters: Vec<ToolParameter>,
}

/// One typed parameter of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// JSON Schema type of the parameter
    pub kind: ParameterKind,
    /// Human-readable description
    pub description: String,
    /// Whether the parameter must be supplied
    pub required: bool,
    /// Closed set of allowed values, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

/// JSON Schema primitive type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// UTF-8 string
    String,
    /// Integral number
    Integer,
    /// Floating-point number
    Number,
    /// Boolean flag
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl ParameterKind {
    /// The JSON Schema `type` keyword for this kind
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl ToolSchema {
    /// Create a schema with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a parameter, preserving declaration order
    #[must_use]
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// The JSON Schema object describing this tool's parameters
    ///
    /// All three backends accept the same `{type, properties, required}`
    /// object; only the envelope around it differs per backend.
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for parameter in &self.parameters {
            let mut property = Map::new();
            property.insert("type".to_owned(), Value::String(parameter.kind.json_type().to_owned()));
            property.insert("description".to_owned(), Value::String(parameter.description.clone()));
            if let Some(values) = &parameter.enum_values {
                property.insert(
                    "enum".to_owned(),
                    Value::Array(values.iter().map(|v| Value::String(v.clone())).collect()),
                );
            }
            properties.insert(parameter.name.clone(), Value::Object(property));

            if parameter.required {
                required.push(Value::String(parameter.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
