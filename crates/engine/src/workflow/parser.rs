//! Workflow document parser.
//!
//! Accepts JSON or YAML. JSON documents are detected by their leading
//! brace so that parse errors point at the format the caller actually
//! submitted.

use crate::error::{EngineError, EngineResult};
use crate::workflow::types::WorkflowDefinition;

/// Parse a workflow document and validate its structure.
pub fn parse_definition(content: &str) -> EngineResult<WorkflowDefinition> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Err(EngineError::Parse("empty workflow document".to_string()));
    }

    let definition: WorkflowDefinition = if trimmed.starts_with('{') {
        serde_json::from_str(content).map_err(|e| EngineError::Parse(e.to_string()))?
    } else {
        serde_yaml::from_str(content).map_err(|e| EngineError::Parse(e.to_string()))?
    };

    definition.validate()?;
    Ok(definition)
}
