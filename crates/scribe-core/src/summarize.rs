//! Summarization port: one request/response call per regeneration.
//!
//! The service keeps no state between calls; continuity is carried by the
//! caller through `prior_notes`. Any OpenAI-compatible chat endpoint can sit
//! behind `SummaryPort`.

use crate::error::{ScribeError, ScribeResult};
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Notes layout handed to the service on every call. Overridable via the
/// config's `template_path`.
pub const DEFAULT_TEMPLATE: &str = "\
# Meeting Notes

## Key Points
- (main topics discussed so far)

## Decisions
- (decisions reached, with who made them when known)

## Action Items
- [ ] (owner: task)

Keep every section heading. Use plain markdown bullets. Leave a section
empty rather than inventing content.
";

/// Input for one summary regeneration.
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Body of the previous summary document ("current notes" context).
    pub prior_notes: String,
    /// Sliding-window transcript blob, oldest first.
    pub transcript: String,
}

/// Synchronous text-to-text summarization seam.
#[async_trait]
pub trait SummaryPort: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> ScribeResult<String>;
}

/// Assemble the tagged prompt carrying prior notes, the new transcript, and
/// the formatting template.
pub fn build_prompt(request: &SummaryRequest, template: &str) -> String {
    format!(
        "<direction>\n\
         Update the meeting notes from this transcript. Start from the current \
         notes and refine them with the new content; do not restart from scratch.\n\
         </direction>\n\
         <date>\n{}\n</date>\n\
         <current_notes>\n{}\n</current_notes>\n\
         <transcript>\n{}\n</transcript>\n\
         <format>\n{}\n</format>\n\
         <direction>\n\
         After writing, double-check that the response follows the template and \
         contains nothing outside it.\n\
         </direction>",
        Local::now().format("%m-%d-%Y"),
        request.prior_notes,
        request.transcript,
        template,
    )
}

// OpenAI-compatible request/response shapes
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Meeting-notes generation through an OpenAI-compatible chat endpoint
/// (OpenRouter by default).
pub struct OpenRouterSummarizer {
    api_key: String,
    model: String,
    template: String,
    client: reqwest::Client,
}

impl OpenRouterSummarizer {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_template(mut self, template: String) -> Self {
        self.template = template;
        self
    }
}

#[async_trait]
impl SummaryPort for OpenRouterSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> ScribeResult<String> {
        let system = "You write live meeting notes. Output only the notes \
                      document in the requested format, with no commentary.";

        let url = format!("{}/chat/completions", OPENROUTER_API_BASE);
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(request, &self.template),
                },
            ],
            // deterministic output: the notes should only change when the
            // transcript does
            temperature: Some(0.0),
            max_tokens: Some(2048),
        };

        let res = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScribeError::Summarize(format!("request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ScribeError::Summarize(format!(
                "summary API error {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| ScribeError::Summarize(format!("response parse failed: {}", e)))?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ScribeError::Summarize("empty completion".to_string()));
        }
        Ok(text)
    }
}

/// Fixed-response summarizer for tests; counts how often it was invoked.
#[derive(Debug, Default)]
pub struct PlaceholderSummarizer {
    response: String,
    calls: AtomicUsize,
}

impl PlaceholderSummarizer {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummaryPort for PlaceholderSummarizer {
    async fn summarize(&self, _request: &SummaryRequest) -> ScribeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_notes_transcript_and_template() {
        let request = SummaryRequest {
            prior_notes: "- old point".to_string(),
            transcript: "[ts] Speaker 1: Hello.".to_string(),
        };
        let prompt = build_prompt(&request, DEFAULT_TEMPLATE);

        assert!(prompt.contains("<current_notes>\n- old point\n</current_notes>"));
        assert!(prompt.contains("<transcript>\n[ts] Speaker 1: Hello.\n</transcript>"));
        assert!(prompt.contains("## Action Items"));
    }

    #[tokio::test]
    async fn placeholder_counts_calls() {
        let port = PlaceholderSummarizer::new("notes");
        let request = SummaryRequest {
            prior_notes: String::new(),
            transcript: "x".to_string(),
        };

        assert_eq!(port.summarize(&request).await.unwrap(), "notes");
        assert_eq!(port.summarize(&request).await.unwrap(), "notes");
        assert_eq!(port.calls(), 2);
    }
}
