//! Tool trait — the abstraction over callable document capabilities.
//!
//! Every processed document contributes tools (a filtered vector-search tool
//! and a whole-document summary tool). The agent loop only sees them through
//! this trait and their [`ToolDefinition`]s.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    /// A successful result.
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }

    /// A failed result carrying a plain-text explanation for the oracle.
    pub fn failed(call_id: impl Into<String>, error: &ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: format!("Error: {error}"),
        }
    }
}

/// The core Tool trait.
///
/// Tools are read-only queries over processed documents, so executing one
/// twice with the same arguments is always safe.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "vector_tool_amazon").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM and indexed
    /// for tool retrieval).
    fn description(&self) -> &str;

    /// The document this tool answers questions about, if any.
    fn doc_id(&self) -> Option<&str> {
        None
    }

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// The text indexed for tool retrieval: name plus description, or the
    /// bare name when the description is blank.
    fn retrieval_text(&self) -> String {
        let description = self.description().trim();
        if description.is_empty() {
            self.name().to_string()
        } else {
            format!("{}: {}", self.name(), description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool {
        description: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { self.description }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let text = arguments["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("missing 'text'".into()))?;
            Ok(ToolResult::ok("test", text))
        }
    }

    #[test]
    fn definition_carries_name_and_schema() {
        let def = EchoTool { description: "Echoes back the input" }.to_definition();
        assert_eq!(def.name, "echo");
        assert_eq!(def.parameters["required"][0], "text");
    }

    #[test]
    fn retrieval_text_falls_back_to_name() {
        assert_eq!(EchoTool { description: "  " }.retrieval_text(), "echo");
        assert_eq!(
            EchoTool { description: "Echoes" }.retrieval_text(),
            "echo: Echoes"
        );
    }

    #[tokio::test]
    async fn execute_reports_invalid_arguments() {
        let tool = EchoTool { description: "" };
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));

        let failed = ToolResult::failed("call_1", &err);
        assert!(!failed.success);
        assert!(failed.output.starts_with("Error:"));
    }
}
