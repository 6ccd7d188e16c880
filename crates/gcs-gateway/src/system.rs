//! System-message composition: domain context, tool registry, and
//! tool-call output format instructions.

use gcs_core::ToolDefinition;

const TOOL_CALL_FORMAT_INSTRUCTIONS: &str = r#"When you need to invoke a tool, respond with exactly one JSON object and nothing else:
{"tool_call": {"agent_name": "<tool's namespace>", "method_name": "<tool name>", "parameters": {...}}}
Use EXACTLY "agent_name", "method_name", and "parameters" as the keys. If no tool is needed, respond in plain text instead."#;

const FINAL_PROMPT_INSTRUCTIONS: &str = r#"No further tool calls are permitted for this turn. Answer now in plain language. If you can name other agents or tools that might help next, end your answer with a line starting "Suggested Agents: " followed by a comma-separated list; omit that line otherwise."#;

/// Build the system message sent ahead of the conversation history:
/// optional domain context, the `[TOOL_REGISTRY]` block, then the tool-call
/// output-format instructions.
#[must_use]
pub fn compose_system_message(domain_context: Option<&str>, tools: &[ToolDefinition]) -> String {
    let mut sections = Vec::new();

    if let Some(context) = domain_context {
        if !context.is_empty() {
            sections.push(context.to_string());
        }
    }

    sections.push(render_tool_registry(tools));
    sections.push(TOOL_CALL_FORMAT_INSTRUCTIONS.to_string());

    sections.join("\n\n")
}

/// Build the system message for the bound-hit final prompt: domain context
/// plus instructions forbidding further tool calls. No `[TOOL_REGISTRY]`
/// block, since no tool is offered on this call.
#[must_use]
pub fn compose_final_system_message(domain_context: Option<&str>) -> String {
    let mut sections = Vec::new();

    if let Some(context) = domain_context {
        if !context.is_empty() {
            sections.push(context.to_string());
        }
    }

    sections.push(FINAL_PROMPT_INSTRUCTIONS.to_string());
    sections.join("\n\n")
}

fn render_tool_registry(tools: &[ToolDefinition]) -> String {
    let mut block = String::from("[TOOL_REGISTRY]\n");
    if tools.is_empty() {
        block.push_str("(no tools available)\n");
        return block;
    }
    for tool in tools {
        block.push_str(&format!(
            "- {}: {}\n  parameters: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }
    block
}
