//! Web search tool backed by the Tavily search API.
//!
//! Optional capability: when `TAVILY_API_KEY` is absent the tool degrades
//! to an explicit unavailability message instead of failing startup or the
//! agent loop. Results are summarized as a numbered list with snippets
//! truncated to keep tool output bounded.

use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::error::{AssistantError, Result};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Cap per-result snippet length in the summary.
const SNIPPET_CHARS: usize = 250;

pub struct TavilySearch {
    api_key: String,
    max_results: usize,
    client: reqwest::Client,
}

impl TavilySearch {
    /// Construct the client if the credential is present.
    ///
    /// `None` means the web search tool is unavailable for this process.
    pub fn from_env(config: &WebSearchConfig) -> Option<Self> {
        let api_key = std::env::var("TAVILY_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            api_key,
            max_results: config.max_results,
            client,
        })
    }

    /// Run a search and return a numbered plain-text summary.
    pub async fn search(&self, query: &str) -> Result<String> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
        });

        let resp = self
            .client
            .post(TAVILY_ENDPOINT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::SearchProvider(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AssistantError::SearchProvider(format!(
                "Tavily API error {status}: {text}"
            )));
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AssistantError::SearchProvider(e.to_string()))?;

        Ok(summarize_results(&json, self.max_results))
    }
}

/// Render the provider response as a numbered summary.
fn summarize_results(json: &serde_json::Value, max_results: usize) -> String {
    let results = json
        .get("results")
        .and_then(|r| r.as_array())
        .map(|r| r.as_slice())
        .unwrap_or_default();

    if results.is_empty() {
        return "No relevant results found from web search.".to_string();
    }

    let mut summary = String::from("Web Search Results:\n");
    for (i, result) in results.iter().take(max_results).enumerate() {
        let title = result
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("No Title");
        let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("#");
        let content = result
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or("No snippet available.");

        let snippet: String = content.chars().take(SNIPPET_CHARS).collect();
        let ellipsis = if content.chars().count() > SNIPPET_CHARS {
            "..."
        } else {
            ""
        };

        summary.push_str(&format!(
            "{}. [{}]({})\n   - Snippet: {}{}\n",
            i + 1,
            title,
            url,
            snippet,
            ellipsis
        ));
    }
    summary
}

/// Message shown when the tool is invoked without a configured provider.
pub fn unavailable_message() -> String {
    "Web search is unavailable: TAVILY_API_KEY is not set.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_numbered_results() {
        let json = serde_json::json!({
            "results": [
                { "title": "First", "url": "https://a.example", "content": "alpha snippet" },
                { "title": "Second", "url": "https://b.example", "content": "beta snippet" },
            ]
        });
        let out = summarize_results(&json, 3);
        assert!(out.starts_with("Web Search Results:"));
        assert!(out.contains("1. [First](https://a.example)"));
        assert!(out.contains("2. [Second](https://b.example)"));
        assert!(out.contains("alpha snippet"));
    }

    #[test]
    fn test_summarize_caps_result_count() {
        let results: Vec<serde_json::Value> = (0..10)
            .map(|i| serde_json::json!({ "title": format!("R{i}"), "url": "#", "content": "c" }))
            .collect();
        let json = serde_json::json!({ "results": results });
        let out = summarize_results(&json, 3);
        assert!(out.contains("3. [R2]"));
        assert!(!out.contains("4. [R3]"));
    }

    #[test]
    fn test_summarize_truncates_long_snippets() {
        let long = "y".repeat(1000);
        let json = serde_json::json!({
            "results": [{ "title": "Long", "url": "#", "content": long }]
        });
        let out = summarize_results(&json, 3);
        assert!(out.contains(&"y".repeat(SNIPPET_CHARS)));
        assert!(!out.contains(&"y".repeat(SNIPPET_CHARS + 1)));
        assert!(out.contains("..."));
    }

    #[test]
    fn test_summarize_empty_results() {
        let json = serde_json::json!({ "results": [] });
        assert!(summarize_results(&json, 3).contains("No relevant results"));
    }
}
