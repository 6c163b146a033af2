//! Tool definition types for LLM tool use

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition handed to an LLM provider
///
/// Describes a callable tool: its name, what it does and the JSON schema of
/// its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the tool in the ToolRegistry)
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers to build JSON schemas for tools
pub mod schema {
    use serde_json::{Value, json};

    /// Schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use crew_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "symbol": schema::string("Ticker symbol"),
    ///         "days": schema::integer("Window size"),
    ///     }),
    ///     vec!["symbol"],
    /// );
    /// assert_eq!(schema["required"][0], "symbol");
    /// ```
    pub fn object(properties: Value, required: Vec<&str>) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// String property restricted to a set of values
    pub fn string_enum(description: &str, values: &[&str]) -> Value {
        json!({
            "type": "string",
            "description": description,
            "enum": values,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_creation() {
        let schema = schema::object(
            json!({
                "query": schema::string("Search query"),
            }),
            vec!["query"],
        );

        let tool = ToolDefinition::new("web_search", "Search the web", schema.clone());
        assert_eq!(tool.name, "web_search");
        assert_eq!(tool.description, "Search the web");
        assert_eq!(tool.input_schema, schema);
    }

    #[test]
    fn test_schema_builders() {
        assert_eq!(schema::string("s")["type"], "string");
        assert_eq!(schema::integer("n")["type"], "integer");

        let kinds = schema::string_enum("kind", &["news", "historical"]);
        assert_eq!(kinds["enum"], json!(["news", "historical"]));
    }
}
