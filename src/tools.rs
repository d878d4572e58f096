//! The assistant's toolset: a closed enumeration of tool identifiers and
//! the typed handlers behind them.
//!
//! Tool names coming back from the model are resolved through
//! [`ToolKind::from_name`]; anything outside the enumeration is rejected
//! deterministically. Every handler returns a plain string, including its
//! failures, so the agent loop can always feed the outcome back to the
//! model as a conversation turn.

use serde_json::Value;
use std::sync::Arc;

use crate::calc;
use crate::context::format_context;
use crate::error::Result;
use crate::models::RetrievalResult;
use crate::provider::{ChatModel, ToolSpec};
use crate::retrieve::Retriever;
use crate::synthesize::synthesize;
use crate::websearch::{self, TavilySearch};

/// The closed set of tools the model may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    QueryKnowledgeBase,
    EvaluateExpression,
    WebSearch,
}

impl ToolKind {
    /// Resolve a model-supplied tool name. Unknown names map to `None`.
    pub fn from_name(name: &str) -> Option<ToolKind> {
        match name {
            "query_knowledge_base" => Some(ToolKind::QueryKnowledgeBase),
            "evaluate_expression" => Some(ToolKind::EvaluateExpression),
            "web_search" => Some(ToolKind::WebSearch),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::QueryKnowledgeBase => "query_knowledge_base",
            ToolKind::EvaluateExpression => "evaluate_expression",
            ToolKind::WebSearch => "web_search",
        }
    }
}

/// Schema descriptions of every tool, sent to the model each round.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "query_knowledge_base".to_string(),
            description: "Queries the indexed document collection to answer questions about \
                          policies, products, reports and other ingested material. Returns the \
                          answer and source citations."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The user's question to be answered from the documents."
                    }
                },
                "required": ["query"]
            }),
        },
        ToolSpec {
            name: "evaluate_expression".to_string(),
            description: "Evaluates a basic arithmetic expression such as '2+2', \
                          '100 * 3.5 / 2', or '(5-3)*8'. Supports + - * / and parentheses only."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The arithmetic expression to evaluate."
                    }
                },
                "required": ["expression"]
            }),
        },
        ToolSpec {
            name: "web_search".to_string(),
            description: "Searches the web for up-to-date information, current events, or \
                          general knowledge not found in the document collection."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query."
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Typed collaborators behind the tool enumeration.
///
/// `retriever` is `None` when the collection has never been ingested, and
/// `web` is `None` when the search credential is absent; in both cases the
/// corresponding tool answers with a readable unavailability string.
pub struct Toolbox {
    retriever: Option<Retriever>,
    chat: Arc<dyn ChatModel>,
    web: Option<TavilySearch>,
    k: usize,
}

impl Toolbox {
    pub fn new(
        retriever: Option<Retriever>,
        chat: Arc<dyn ChatModel>,
        web: Option<TavilySearch>,
        k: usize,
    ) -> Self {
        Self {
            retriever,
            chat,
            web,
            k,
        }
    }

    /// Execute one tool call. Never fails: every error becomes a string.
    pub async fn execute(&self, kind: ToolKind, args: &Value) -> String {
        match kind {
            ToolKind::QueryKnowledgeBase => match string_arg(args, "query") {
                Some(query) => self.query_knowledge_base(&query).await,
                None => missing_arg("query"),
            },
            ToolKind::EvaluateExpression => match string_arg(args, "expression") {
                Some(expression) => calc::evaluate_expression(&expression),
                None => missing_arg("expression"),
            },
            ToolKind::WebSearch => match string_arg(args, "query") {
                Some(query) => self.web_search(&query).await,
                None => missing_arg("query"),
            },
        }
    }

    /// Retrieve, format, synthesize; combine answer and citations.
    async fn query_knowledge_base(&self, query: &str) -> String {
        let Some(retriever) = &self.retriever else {
            return "The knowledge base is unavailable: no document collection has been \
                    ingested yet."
                .to_string();
        };

        match self.run_rag(retriever, query).await {
            Ok(result) => {
                if result.context_chunks.is_empty() {
                    format!(
                        "Answer: {} (No specific source documents were strongly matched for \
                         this query.)",
                        result.answer
                    )
                } else {
                    let citations: Vec<String> = result
                        .context_chunks
                        .iter()
                        .map(|chunk| {
                            let page = chunk
                                .page
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "N/A".to_string());
                            format!("[Source: {}, Page: {}]", chunk.source, page)
                        })
                        .collect();
                    format!(
                        "Answer: {}\nCited Sources: {}",
                        result.answer,
                        citations.join("; ")
                    )
                }
            }
            Err(e) => {
                tracing::warn!("knowledge base query failed: {e}");
                format!("Sorry, an error occurred while querying the documents: {e}")
            }
        }
    }

    /// The RAG pipeline proper, shared with the direct `query` command.
    pub async fn run_rag(&self, retriever: &Retriever, query: &str) -> Result<RetrievalResult> {
        let chunks = retriever.retrieve(query, self.k).await?;
        let context = format_context(&chunks);
        let answer = synthesize(self.chat.as_ref(), query, &context).await?;
        Ok(RetrievalResult {
            question: query.to_string(),
            context_chunks: chunks,
            answer,
        })
    }

    async fn web_search(&self, query: &str) -> String {
        let Some(web) = &self.web else {
            return websearch::unavailable_message();
        };

        match web.search(query).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("web search failed: {e}");
                format!("Error performing web search: {e}")
            }
        }
    }
}

/// Pull a string argument out of the model-supplied JSON. A bare string
/// value is accepted as the argument itself (models sometimes send the raw
/// value instead of an object).
fn string_arg(args: &Value, key: &str) -> Option<String> {
    match args {
        Value::Object(map) => map.get(key).and_then(|v| v.as_str()).map(String::from),
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn missing_arg(key: &str) -> String {
    format!("Error: missing required argument '{key}'.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ModelReply;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubModel;

    #[async_trait]
    impl ChatModel for StubModel {
        fn model_name(&self) -> &str {
            "stub"
        }
        async fn complete(
            &self,
            _system: &str,
            _turns: &[crate::models::ConversationTurn],
            _tools: &[ToolSpec],
        ) -> Result<ModelReply> {
            Ok(ModelReply {
                content: Some("stub answer".to_string()),
                tool_call: None,
            })
        }
    }

    fn toolbox() -> Toolbox {
        Toolbox::new(None, Arc::new(StubModel), None, 3)
    }

    #[test]
    fn test_tool_kind_round_trip() {
        for kind in [
            ToolKind::QueryKnowledgeBase,
            ToolKind::EvaluateExpression,
            ToolKind::WebSearch,
        ] {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("run_shell"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn test_specs_match_enumeration() {
        let specs = tool_specs();
        assert_eq!(specs.len(), 3);
        for spec in &specs {
            assert!(ToolKind::from_name(&spec.name).is_some());
            assert!(spec.parameters["required"].is_array());
        }
    }

    #[tokio::test]
    async fn test_calculator_dispatch() {
        let out = toolbox()
            .execute(
                ToolKind::EvaluateExpression,
                &json!({ "expression": "2+2" }),
            )
            .await;
        assert!(out.contains('4'));
    }

    #[tokio::test]
    async fn test_missing_argument_is_error_string() {
        let out = toolbox()
            .execute(ToolKind::EvaluateExpression, &json!({}))
            .await;
        assert!(out.starts_with("Error: missing required argument"));
    }

    #[tokio::test]
    async fn test_bare_string_argument_accepted() {
        let out = toolbox()
            .execute(ToolKind::EvaluateExpression, &json!("3*3"))
            .await;
        assert!(out.contains('9'));
    }

    #[tokio::test]
    async fn test_knowledge_base_unavailable_without_index() {
        let out = toolbox()
            .execute(ToolKind::QueryKnowledgeBase, &json!({ "query": "policy?" }))
            .await;
        assert!(out.contains("knowledge base is unavailable"));
    }

    #[tokio::test]
    async fn test_web_search_unavailable_without_credential() {
        let out = toolbox()
            .execute(ToolKind::WebSearch, &json!({ "query": "news" }))
            .await;
        assert!(out.contains("unavailable"));
    }
}
