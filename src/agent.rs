//! Tool router and agent loop.
//!
//! Drives a bounded conversation with the chat model for one user message.
//! Each round the model either produces plain text or names exactly one
//! tool; tool results are fed back as `tool` turns and the loop continues
//! until the model ends a text reply with the termination sentinel or the
//! round budget runs out.
//!
//! The router is stateless across calls: every `ask()` starts from a fresh
//! turn list, and nothing a previous call did can leak into the next one.

use std::sync::Arc;

use crate::models::ConversationTurn;
use crate::provider::{ChatModel, ToolSpec};
use crate::tools::{tool_specs, ToolKind, Toolbox};

/// Literal token a final assistant reply must end with.
pub const TERMINATE_SENTINEL: &str = "TERMINATE";

/// Returned when the round budget expires without any assistant text.
pub const NO_RESPONSE_FALLBACK: &str =
    "(The assistant produced no textual response for this turn.)";

/// Standing instruction sent with every round.
const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant with access to tools. You can query an indexed \
collection of documents, evaluate arithmetic expressions, and search the web. \
If the user's question seems to require looking up information from the document \
collection, you MUST call the 'query_knowledge_base' function; do not answer such \
questions from your general knowledge. Use 'evaluate_expression' for calculations \
and 'web_search' for current events or information outside the documents. After \
receiving a function result, present it clearly to the user. If a function result \
indicates an error, relay that. For general conversation you can answer directly. \
After you have provided the complete answer to the user's current question, end \
your response with the exact word TERMINATE.";

pub struct Router {
    chat: Arc<dyn ChatModel>,
    toolbox: Toolbox,
    specs: Vec<ToolSpec>,
    max_rounds: usize,
}

impl Router {
    pub fn new(chat: Arc<dyn ChatModel>, toolbox: Toolbox, max_rounds: usize) -> Self {
        Self {
            chat,
            toolbox,
            specs: tool_specs(),
            max_rounds,
        }
    }

    /// Run the loop for one user message and return the full conversation.
    ///
    /// Never fails: model and tool errors become readable assistant turns,
    /// and the caller extracts the final answer with [`final_answer`].
    pub async fn ask(&self, message: &str) -> Vec<ConversationTurn> {
        let mut turns = vec![ConversationTurn::user(message)];

        for round in 0..self.max_rounds {
            let reply = match self.chat.complete(SYSTEM_PROMPT, &turns, &self.specs).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::warn!("model call failed in round {}: {e}", round + 1);
                    turns.push(ConversationTurn::assistant(
                        "Sorry, the language model request failed; please try again.",
                    ));
                    return turns;
                }
            };

            if let Some(call) = reply.tool_call {
                let Some(kind) = ToolKind::from_name(&call.name) else {
                    tracing::warn!("model requested unknown tool '{}'", call.name);
                    turns.push(ConversationTurn::assistant_tool_call(reply.content, call.clone()));
                    turns.push(ConversationTurn::assistant(format!(
                        "Error: the model requested an unknown tool '{}'; unable to complete \
                         this request.",
                        call.name
                    )));
                    return turns;
                };

                tracing::debug!("round {}: executing tool {}", round + 1, kind.name());
                let arguments = call.arguments.clone();
                turns.push(ConversationTurn::assistant_tool_call(reply.content, call));
                let output = self.toolbox.execute(kind, &arguments).await;
                turns.push(ConversationTurn::tool(kind.name(), output));
                continue;
            }

            let text = reply.content.unwrap_or_default();
            let trimmed = text.trim_end();
            if let Some(stripped) = trimmed.strip_suffix(TERMINATE_SENTINEL) {
                turns.push(ConversationTurn::assistant(stripped.trim_end()));
                return turns;
            }

            turns.push(ConversationTurn::assistant(text));
        }

        tracing::debug!("round budget ({}) exhausted", self.max_rounds);
        turns
    }
}

/// The displayed answer for one `ask()` conversation: the most recent
/// non-empty assistant text that is not a tool call, or a fixed fallback.
pub fn final_answer(turns: &[ConversationTurn]) -> &str {
    turns
        .iter()
        .rev()
        .filter(|turn| turn.role == crate::models::Role::Assistant && turn.tool_call.is_none())
        .find_map(|turn| match turn.content.as_deref() {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        })
        .unwrap_or(NO_RESPONSE_FALLBACK)
}
