//! Tool descriptor value object and catalog normalization.
//!
//! Tool servers describe their tools in several shapes: MCP-style
//! `{name, description, inputSchema}` records, plugin manifests that carry
//! `parameters` instead of `inputSchema`, and OpenAI-style
//! `{"function": {...}}` wrappers. [`normalize_catalog`] turns any mix of
//! these into [`ToolDescriptor`] values and reports every entry it had to
//! reject instead of guessing at it.

use super::ToolShapeError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

const INPUT_SCHEMA_FIELDS: [&str; 3] = ["inputSchema", "input_schema", "parameters"];
const OUTPUT_SCHEMA_FIELDS: [&str; 2] = ["outputSchema", "output_schema"];

/// Canonical metadata for a tool exposed by a tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Creates a tool descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ToolShapeError::MissingName`] when `name` is empty after
    /// trimming.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Map<String, Value>,
    ) -> Result<Self, ToolShapeError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(ToolShapeError::MissingName);
        }

        Ok(Self {
            name: normalized_name,
            description: description.into().trim().to_owned(),
            input_schema: Value::Object(input_schema),
            output_schema: None,
        })
    }

    /// Sets an output schema.
    #[must_use]
    pub fn with_output_schema(mut self, output_schema: Map<String, Value>) -> Self {
        self.output_schema = Some(Value::Object(output_schema));
        self
    }

    /// Normalizes a single raw tool entry.
    ///
    /// # Errors
    ///
    /// Returns [`ToolShapeError`] when the entry is not an object, has no
    /// usable name, or carries a description or schema of the wrong type.
    pub fn from_raw(raw: &Value) -> Result<Self, ToolShapeError> {
        let Value::Object(outer) = raw else {
            return Err(ToolShapeError::NotAnObject(json_kind(raw).to_owned()));
        };
        let fields = match outer.get("function") {
            Some(Value::Object(inner)) if !outer.contains_key("name") => inner,
            _ => outer,
        };

        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .ok_or(ToolShapeError::MissingName)?;

        let description = match fields.get("description") {
            None | Some(Value::Null) => "",
            Some(Value::String(text)) => text.as_str(),
            Some(_) => return Err(ToolShapeError::InvalidDescription(name.to_owned())),
        };

        let input_schema = schema_field(fields, &INPUT_SCHEMA_FIELDS, name, "inputSchema")?
            .unwrap_or_default();
        let descriptor = Self::new(name, description, input_schema)?;

        Ok(
            match schema_field(fields, &OUTPUT_SCHEMA_FIELDS, name, "outputSchema")? {
                Some(output_schema) => descriptor.with_output_schema(output_schema),
                None => descriptor,
            },
        )
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description; may be empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema, always a JSON object.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the optional output schema.
    #[must_use]
    pub const fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }
}

/// Result of normalizing one raw catalog fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedCatalog {
    /// Accepted descriptors in source order, unique by name.
    pub tools: Vec<ToolDescriptor>,
    /// Entries that could not be normalized.
    pub rejected: Vec<ToolShapeError>,
    /// Names dropped because an earlier entry had the same name.
    pub duplicates: Vec<String>,
}

/// Normalizes a raw catalog into descriptors.
///
/// Within one fetch the first entry with a given name wins.
#[must_use]
pub fn normalize_catalog(raw_tools: &[Value]) -> NormalizedCatalog {
    let mut catalog = NormalizedCatalog::default();
    let mut seen = HashSet::new();

    for raw in raw_tools {
        match ToolDescriptor::from_raw(raw) {
            Ok(descriptor) if seen.insert(descriptor.name().to_owned()) => {
                catalog.tools.push(descriptor);
            }
            Ok(descriptor) => catalog.duplicates.push(descriptor.name().to_owned()),
            Err(err) => catalog.rejected.push(err),
        }
    }

    catalog
}

fn schema_field(
    fields: &Map<String, Value>,
    keys: &[&str],
    tool: &str,
    label: &'static str,
) -> Result<Option<Map<String, Value>>, ToolShapeError> {
    let present = keys
        .iter()
        .find_map(|key| fields.get(*key).filter(|value| !value.is_null()));

    match present {
        None => Ok(None),
        Some(Value::Object(schema)) => Ok(Some(schema.clone())),
        Some(_) => Err(ToolShapeError::InvalidSchema {
            tool: tool.to_owned(),
            field: label,
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of a tool invocation that reached the server.
///
/// `is_error` marks a tool that ran and reported failure, as opposed to a
/// tool that could not be reached at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    content: Value,
    is_error: bool,
}

impl ToolCallResult {
    /// Creates a successful result.
    #[must_use]
    pub const fn success(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Creates a result for a tool that ran and reported an error.
    #[must_use]
    pub const fn error(content: Value) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Returns the result payload.
    #[must_use]
    pub const fn content(&self) -> &Value {
        &self.content
    }

    /// Returns whether the tool reported an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Consumes the result and returns its payload.
    #[must_use]
    pub fn into_content(self) -> Value {
        self.content
    }
}
