use serde_json::Value;

use crate::errors::ExtractError;
use crate::notebook::{CellKind, Notebook};

/// The linear action sequence distilled from one notebook: the task the
/// user stated, the tool steps taken in order, and the index of the
/// reasoning cell those steps feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTrace {
    pub instruction: String,
    pub steps: Vec<Step>,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub tool_name: String,
    /// Argument name/value pairs in the order the call recorded them.
    pub arguments: Vec<(String, String)>,
    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Output(String),
    /// The call has no recorded output before the trace boundary.
    Pending,
}

/// Walk the cells once and build the trace. Scanning starts at the first
/// instruction cell; tool calls pair positionally with the next tool
/// output; the first reasoning cell after the steps ends the scan and
/// becomes the rewrite target.
pub fn extract(nb: &Notebook) -> Result<ActionTrace, ExtractError> {
    let mut instruction = None;
    let mut start = 0;
    for (idx, cell) in nb.cells.iter().enumerate() {
        match cell.kind {
            CellKind::Instruction => {
                instruction = Some(cell.body());
                start = idx + 1;
                break;
            }
            CellKind::ToolCall | CellKind::Reasoning => {
                return Err(ExtractError::NoInstruction)
            }
            CellKind::ToolResult | CellKind::Other => {}
        }
    }
    let instruction = instruction.ok_or(ExtractError::NoInstruction)?;

    let mut steps = Vec::new();
    let mut target = None;
    let mut i = start;
    while i < nb.cells.len() {
        let cell = &nb.cells[i];
        match cell.kind {
            CellKind::ToolCall => {
                let (tool_name, arguments) = parse_tool_call(&cell.body());
                let result = match nb.cells.get(i + 1) {
                    Some(next) if next.kind == CellKind::ToolResult => {
                        i += 1;
                        StepResult::Output(next.body())
                    }
                    _ => StepResult::Pending,
                };
                steps.push(Step {
                    tool_name,
                    arguments,
                    result,
                });
            }
            CellKind::Reasoning => {
                target = Some(i);
                break;
            }
            // A second instruction starts a new exchange; the trace ends here.
            CellKind::Instruction => break,
            // Stray outputs and screenshot/metadata cells carry no action.
            CellKind::ToolResult | CellKind::Other => {}
        }
        i += 1;
    }

    match target {
        Some(_) if steps.is_empty() => Err(ExtractError::EmptyTrace),
        Some(target) => Ok(ActionTrace {
            instruction,
            steps,
            target,
        }),
        None => Err(ExtractError::NoReasoningCell),
    }
}

/// Pull tool name and arguments out of a call cell's fenced JSON payload.
/// A payload that fails to parse degrades to the body's first line as the
/// tool name; extraction never aborts on one malformed call cell.
fn parse_tool_call(body: &str) -> (String, Vec<(String, String)>) {
    if let Some(payload) = extract_json_block(body) {
        if let Ok(value) = serde_json::from_str::<Value>(&payload) {
            let tool_name = value
                .get("tool_name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let arguments = match value.get("arguments") {
                Some(Value::Object(map)) => map
                    .iter()
                    .map(|(k, v)| (k.clone(), render_value(v)))
                    .collect(),
                Some(Value::String(s)) => vec![("command".to_string(), s.clone())],
                Some(other) => vec![("arguments".to_string(), render_value(other))],
                None => vec![],
            };
            return (tool_name, arguments);
        }
    }
    let head = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    (head.trim().to_string(), vec![])
}

fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract the contents of the first ```json fence.
fn extract_json_block(input: &str) -> Option<String> {
    let start_idx = input.find("```json")?;
    let after_tag = &input[start_idx + "```json".len()..];
    let code_start = after_tag.find('\n').map(|i| i + 1).unwrap_or(0);
    let code_region = &after_tag[code_start..];
    let end = code_region.find("```").unwrap_or(code_region.len());
    let code = code_region[..end].trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
