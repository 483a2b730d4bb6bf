//! Input checks applied before anything touches the store.

use pipeline_core::{PipelineError, PipelineResult};

pub const MAX_DESCRIPTION_CHARS: usize = 300;

/// Trim `value` and reject it if nothing is left.
pub fn required(field: &str, value: &str) -> PipelineResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, treating blank input as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn description(value: Option<String>) -> PipelineResult<Option<String>> {
    let value = optional(value);
    if let Some(ref text) = value {
        let len = text.chars().count();
        if len > MAX_DESCRIPTION_CHARS {
            return Err(PipelineError::Validation(format!(
                "description is {} characters long, the limit is {}",
                len, MAX_DESCRIPTION_CHARS
            )));
        }
    }
    Ok(value)
}
