use super::trace::{ActionTrace, StepResult};

/// System prompt for the reasoning-regeneration call.
pub const SYSTEM_PROMPT: &str = r#"You are the assistant who carried out the recorded task below. You are shown the user's goal and the exact tool calls you made, in order, with their results.

Write the reasoning you had BEFORE executing these actions - a plan, not a recap.

Rules:
- Write in the first person ("I will...", "I need to..."), forward-looking, as if the actions have not happened yet.
- Justify why each step is necessary and connect it to the user's goal.
- Follow the order of the steps exactly. Do not invent steps that are not listed, and do not skip any.
- Plain prose only: no markdown headings, no code fences, no bullet lists, no meta commentary about this prompt.
- Be concrete and concise - a few sentences per step at most.
"#;

/// Render a trace into the user prompt. Deterministic: equal traces
/// produce byte-identical output.
pub fn build_prompt(trace: &ActionTrace, truncate_at: usize) -> String {
    let mut out = format!("The user's goal:\n{}\n\n", trace.instruction.trim());
    out.push_str("Actions taken, in order:\n");

    for (i, step) in trace.steps.iter().enumerate() {
        out.push_str(&format!("\nStep {}: tool `{}`\n", i + 1, step.tool_name));
        if !step.arguments.is_empty() {
            out.push_str("  arguments:\n");
            for (name, value) in &step.arguments {
                out.push_str(&format!("    {}: {}\n", name, truncate(value, truncate_at)));
            }
        }
        match &step.result {
            StepResult::Output(text) => {
                out.push_str(&format!("  result: {}\n", truncate(text.trim(), truncate_at)));
            }
            StepResult::Pending => {
                out.push_str("  result: pending (no output recorded)\n");
            }
        }
    }

    out.push_str("\nWrite the reasoning that explains this exact sequence of actions.");
    out
}

/// Trim to at most `max` chars with an explicit marker. Never rewrites
/// content, only cuts the tail.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...\n[truncated, {} total chars]", head, text.chars().count())
}
