use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Cell markers used by the trajectory-notebook format. A cell's first
// non-blank line carries exactly one of these.
pub const MARKER_USER: &str = "**[user]**";
pub const MARKER_ASSISTANT: &str = "**[assistant]**";
pub const MARKER_TOOL_CALL: &str = "**[tool_call]**";
pub const MARKER_TOOL_OUTPUT: &str = "**[tool_output]**";

/// What a cell is. Decided once at parse time from its marker and never
/// re-inferred downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CellKind {
    /// `**[user]**`: the task the assistant was given.
    Instruction,
    /// `**[tool_call]**`: an invocation with a tool name and arguments.
    ToolCall,
    /// `**[tool_output]**`: the recorded result of the preceding call.
    ToolResult,
    /// `**[assistant]**`: reasoning text. The only mutable kind.
    Reasoning,
    /// Metadata, screenshots, anything unmarked.
    #[default]
    Other,
}

impl CellKind {
    pub fn classify(text: &str) -> Self {
        let head = text.trim_start();
        if head.starts_with(MARKER_USER) {
            CellKind::Instruction
        } else if head.starts_with(MARKER_ASSISTANT) {
            CellKind::Reasoning
        } else if head.starts_with(MARKER_TOOL_CALL) {
            CellKind::ToolCall
        } else if head.starts_with(MARKER_TOOL_OUTPUT) {
            CellKind::ToolResult
        } else {
            CellKind::Other
        }
    }
}

/// One ordered unit of a notebook. Unknown fields ride along in `extra`
/// so a parse/serialize round trip leaves them intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    pub source: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub kind: CellKind,
}

impl Cell {
    /// The cell's full text, source fragments joined.
    pub fn text(&self) -> String {
        self.source.concat()
    }

    /// The cell's text with its marker line stripped.
    pub fn body(&self) -> String {
        strip_marker(&self.text()).to_string()
    }
}

/// Drop the leading marker (if any) and the blank line after it.
pub fn strip_marker(text: &str) -> &str {
    let head = text.trim_start();
    for marker in [
        MARKER_USER,
        MARKER_ASSISTANT,
        MARKER_TOOL_CALL,
        MARKER_TOOL_OUTPUT,
    ] {
        if let Some(rest) = head.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_markers() {
        assert_eq!(CellKind::classify("**[user]**\n\nbook a flight"), CellKind::Instruction);
        assert_eq!(CellKind::classify("**[assistant]**\n\nthinking"), CellKind::Reasoning);
        assert_eq!(CellKind::classify("**[tool_call]**\n\n```json\n{}\n```"), CellKind::ToolCall);
        assert_eq!(CellKind::classify("**[tool_output]**\n\nok"), CellKind::ToolResult);
    }

    #[test]
    fn classify_unmarked_as_other() {
        assert_eq!(CellKind::classify("**[metadata]**\n\n{}"), CellKind::Other);
        assert_eq!(CellKind::classify("plain text"), CellKind::Other);
    }

    #[test]
    fn classify_tolerates_leading_whitespace() {
        assert_eq!(CellKind::classify("\n  **[user]**\n\nx"), CellKind::Instruction);
    }

    #[test]
    fn strip_marker_returns_body() {
        assert_eq!(strip_marker("**[user]**\n\nbook a flight"), "book a flight");
        assert_eq!(strip_marker("no marker here"), "no marker here");
    }
}
