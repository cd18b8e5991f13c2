//! Web search tool — DuckDuckGo Instant Answer API.
//!
//! Results are the abstract (if any) followed by related topics, flattened
//! out of their category groups, capped at `max_results`.

use crate::http;
use async_trait::async_trait;
use parley_config::ToolsConfig;
use parley_core::error::ToolError;
use parley_core::tool::{ArgType, ArgumentSchema, Tool};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub struct WebSearchTool {
    base_url: String,
    region: String,
    max_results: usize,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(
        base_url: impl Into<String>,
        region: impl Into<String>,
        max_results: usize,
        timeout_secs: u64,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            region: region.into(),
            max_results,
            client: http::client("web_search", timeout_secs)?,
        })
    }

    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        Self::new(
            &config.search_url,
            &config.search_region,
            config.max_search_results,
            config.timeout_secs,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a single topic or a named group of topics.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

fn collect_results(answer: InstantAnswer, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        results.push(SearchResult {
            title: answer.heading,
            url: answer.abstract_url,
            snippet: answer.abstract_text,
        });
    }

    let mut stack: Vec<RelatedTopic> = answer.related_topics.into_iter().rev().collect();
    while let Some(topic) = stack.pop() {
        if results.len() >= limit {
            break;
        }
        match topic {
            RelatedTopic::Topic { text, first_url } => {
                // Topic text reads "Title - snippet"
                let title = text.split(" - ").next().unwrap_or(&text).to_string();
                results.push(SearchResult {
                    title,
                    url: first_url,
                    snippet: text,
                });
            }
            RelatedTopic::Group { topics } => stack.extend(topics.into_iter().rev()),
        }
    }

    results.truncate(limit);
    results
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns a list of relevant results with titles, URLs, and snippets."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new().required("query", ArgType::String, "The search query")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let url = format!("{}/", self.base_url);
        let params = [
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("kl", self.region.as_str()),
        ];

        let body = match http::get_json(&self.client, &url, &params).await {
            Ok(body) => body,
            Err(e) => {
                warn!(query = %query, error = %e, "Web search failed");
                return Ok(http::error_payload(e));
            }
        };

        let answer: InstantAnswer = match serde_json::from_value(body) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(query = %query, error = %e, "Unexpected search response shape");
                return Ok(http::error_payload(format!("unexpected search response: {e}")));
            }
        };

        Ok(serde_json::json!({
            "query": query,
            "results": collect_results(answer, self.max_results),
        }))
    }
}
