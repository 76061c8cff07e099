//! Prompt templates for the tool loop
//!
//! The language-mirroring and redaction rules are contracts with the
//! model, not local filters: the engine instructs and trusts, it does not
//! verify compliance.

use super::tool_loop::ToolCallRecord;
use serde_json::Value;

/// Answer-language contract, carried verbatim in every system prompt.
pub const LANGUAGE_CONTRACT: &str =
    "Always answer in the same natural language as the user's question.";

/// Content-safety contract, carried verbatim in every system prompt.
pub const REDACTION_CONTRACT: &str =
    "Omit or redact sensitive personal content from your final answer: political \
     views or opinions, sex-related content, personal complaints about \
     relationships, family or partners, private personal information such as \
     addresses and phone numbers, and financial information such as bank details \
     and salaries. Replace such content with \"[REDACTED]\" or leave it out \
     entirely.";

/// The initial system prompt: protocol description, tool schemas, caller
/// context, and the negotiation contract.
pub(crate) fn build_system_prompt(tool_listing: &str, context: &str) -> String {
    let context_block = if context.trim().is_empty() {
        "(no context available)"
    } else {
        context
    };

    format!(
        r#"You are Sage, an AI assistant that answers questions using the provided context and tools.

IMPORTANT RULES:
1. To call a tool, your ENTIRE response must be ONLY the JSON object below. No explanation, no markdown fences, no text before or after.
2. When you have the final answer, respond with plain text only. No JSON.
3. Never request the same tool twice in a row. If a tool was just used, choose another tool or answer directly.
4. {language}
5. {redaction}

Tool call format (your entire response must be exactly this):
{{"tool": "tool_name", "arguments": {{"arg1": "value1"}}}}

Available tools:
{tools}

Context for this question:
{context}"#,
        language = LANGUAGE_CONTRACT,
        redaction = REDACTION_CONTRACT,
        tools = tool_listing,
        context = context_block,
    )
}

/// Appended to the running prompt after each executed tool call so the
/// next model turn sees the result.
pub(crate) fn tool_exchange(tool: &str, arguments: &Value, result: &str) -> String {
    format!(
        "\n\nTool used: {}\nArguments: {}\nResult: {}",
        tool, arguments, result
    )
}

/// Appended instead of executing when the model repeats the previous tool.
pub(crate) fn duplicate_warning(tool: &str) -> String {
    format!(
        "\n\nWARNING: tool '{}' was just used. Choose another tool or answer \
         directly with plain text.",
        tool
    )
}

/// The synthesis prompt: full transcript, numbered tool summary, and the
/// instruction to merge everything into one answer.
pub(crate) fn build_synthesis_prompt(
    transcript: &str,
    final_response: Option<&str>,
    records: &[ToolCallRecord],
) -> String {
    let mut summary = String::new();
    for (i, record) in records.iter().enumerate() {
        summary.push_str(&format!(
            "{}. {}: {}\n",
            i + 1,
            record.tool_name,
            record.result
        ));
    }

    let closing = final_response
        .map(|r| format!("\nThe assistant's last remark was:\n{}\n", r))
        .unwrap_or_default();

    format!(
        r#"You have gathered evidence with tools while answering the user's question.

Conversation and tool transcript:
{transcript}

Tool results, in order:
{summary}{closing}
Synthesize one coherent answer to the user's question from all of the evidence above. Do not mention the tools or this transcript. {language} {redaction}"#,
        transcript = transcript,
        summary = summary,
        closing = closing,
        language = LANGUAGE_CONTRACT,
        redaction = REDACTION_CONTRACT,
    )
}
