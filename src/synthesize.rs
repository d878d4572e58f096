//! Answer synthesis: context + question in, grounded answer out.
//!
//! Builds a fixed prompt instructing the model to answer strictly from the
//! supplied context, decline when the context is insufficient, and cite
//! `(Filename, Page)` pairs at the end. Sampling temperature is configured
//! low; factuality over creativity.

use crate::error::{AssistantError, Result};
use crate::models::ConversationTurn;
use crate::provider::ChatModel;

const ANSWER_TEMPLATE: &str = "\
You are an AI assistant for answering questions based on the provided context.
Your task is to synthesize an answer from the retrieved document snippets.
If the context doesn't contain the answer, state that you cannot answer based on the provided information.
Do NOT use any external knowledge.
After providing the answer, list the sources you used from the context, including the Filename and Page number.

CONTEXT:
{context}

QUESTION:
{question}

ANSWER:
";

/// Fill the answer template.
pub fn build_prompt(question: &str, context: &str) -> String {
    ANSWER_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

/// Ask the model to answer `question` from `context` alone.
///
/// Returns the whitespace-trimmed model text, otherwise a generation error
/// with the original cause attached. Not retried here.
pub async fn synthesize(
    model: &dyn ChatModel,
    question: &str,
    context: &str,
) -> Result<String> {
    let prompt = build_prompt(question, context);
    let turns = [ConversationTurn::user(prompt)];

    let reply = model.complete("", &turns, &[]).await?;
    let answer = reply
        .content
        .ok_or_else(|| AssistantError::Generation("model returned no text".to_string()))?;

    Ok(answer.trim().to_string())
}
