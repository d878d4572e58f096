//! Generative chat model adapter.
//!
//! [`ChatModel`] is the vendor-neutral seam the router and synthesizer talk
//! to: conversation turns and tool specs in, one reply out. The reply is
//! either plain text or a single tool call; the model names exactly one
//! tool per turn in this design.
//!
//! [`OpenAiChatModel`] implements the trait against an OpenAI-compatible
//! chat completions endpoint with function calling. The neutral turn shape
//! is converted to the vendor message shape here and nowhere else.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::{AssistantError, Result};
use crate::models::{ConversationTurn, Role, ToolInvocation};

/// A named, schema-described callable offered to the model.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// One model reply: plain text, a tool call, or (rarely) neither.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_call: Option<ToolInvocation>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send the conversation to the model and return its next reply.
    ///
    /// `system` is the standing instruction for the exchange; pass an empty
    /// string for bare prompt completion. `tools` may be empty.
    async fn complete(
        &self,
        system: &str,
        turns: &[ConversationTurn],
        tools: &[ToolSpec],
    ) -> Result<ModelReply>;
}

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChatModel {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    /// Build the adapter from configuration.
    ///
    /// Fails fast when `OPENAI_API_KEY` is absent; every request carries the
    /// configured timeout so a hung call cannot stall the agent loop forever.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AssistantError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssistantError::Generation(e.to_string()))?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    /// Convert neutral turns into the vendor's message array.
    fn build_messages(system: &str, turns: &[ConversationTurn]) -> Vec<Value> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        if !system.is_empty() {
            messages.push(json!({ "role": "system", "content": system }));
        }

        for turn in turns {
            match turn.role {
                Role::User => {
                    messages.push(json!({
                        "role": "user",
                        "content": turn.content.as_deref().unwrap_or(""),
                    }));
                }
                Role::Assistant => {
                    if let Some(call) = &turn.tool_call {
                        messages.push(json!({
                            "role": "assistant",
                            "content": turn.content.as_deref().unwrap_or(""),
                            "function_call": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            },
                        }));
                    } else {
                        messages.push(json!({
                            "role": "assistant",
                            "content": turn.content.as_deref().unwrap_or(""),
                        }));
                    }
                }
                Role::Tool => {
                    messages.push(json!({
                        "role": "function",
                        "name": turn.name,
                        "content": turn.content.as_deref().unwrap_or(""),
                    }));
                }
            }
        }
        messages
    }

    fn parse_reply(json: &Value) -> Result<ModelReply> {
        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| AssistantError::Generation("no choices in response".to_string()))?;

        let message = &choice["message"];
        let content = message["content"].as_str().map(String::from);

        let tool_call = message.get("function_call").and_then(|fc| {
            let name = fc["name"].as_str()?.to_string();
            let raw_args = fc["arguments"].as_str().unwrap_or("{}");
            // Malformed argument JSON is preserved verbatim so the tool can
            // report it back to the model instead of the loop dying here.
            let arguments = serde_json::from_str(raw_args)
                .unwrap_or_else(|_| Value::String(raw_args.to_string()));
            Some(ToolInvocation { name, arguments })
        });

        Ok(ModelReply { content, tool_call })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        turns: &[ConversationTurn],
        tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        let mut body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": Self::build_messages(system, turns),
        });

        if !tools.is_empty() {
            let functions: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    })
                })
                .collect();
            body["functions"] = Value::Array(functions);
        }

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Generation(format!("chat request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Generation(format!(
                "chat API error {status}: {text}"
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| AssistantError::Generation(e.to_string()))?;

        Self::parse_reply(&json)
    }
}
