use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::{Summarizer, SummaryRequest, SummaryResponse, SummaryRole};

pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No content in completion response")]
    EmptyResponse,
}

impl OpenAIClient {
    const PER_VIDEO_PROMPT: &str = include_str!("./prompts/per_video.txt");
    const CONSOLIDATED_PROMPT: &str = include_str!("./prompts/consolidated.txt");
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAIError> {
        let client = Client::builder().timeout(Self::REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn system_prompt(role: SummaryRole) -> &'static str {
        match role {
            SummaryRole::PerVideo => Self::PER_VIDEO_PROMPT,
            SummaryRole::Consolidated => Self::CONSOLIDATED_PROMPT,
        }
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        system_prompt: &str,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": model_name.into(),
            "messages": [
                {
                    "role": "system",
                    "content": system_prompt
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";
    type Error = OpenAIError;

    #[tracing::instrument(skip(self, request), fields(title = request.title, role = ?request.role))]
    async fn summarize(
        &self,
        request: &SummaryRequest<'_>,
    ) -> Result<SummaryResponse, Self::Error> {
        let content = truncate_to_token_limit(request.content, Self::CONTEXT_WINDOW_LIMIT);
        let user_content = render_user_message(request, &content);

        let response = self
            .send_completion_request(
                Self::SUMMARIZER_MODEL,
                Self::system_prompt(request.role),
                user_content,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or(OpenAIError::EmptyResponse)?;

        Ok(SummaryResponse { summary })
    }
}

fn render_user_message(request: &SummaryRequest<'_>, content: &str) -> String {
    match request.role {
        SummaryRole::PerVideo => format!(
            "Title: \"{}\"\nTopic: {}\n\nTranscript:\n---\n{content}\n---",
            request.title, request.topic
        ),
        SummaryRole::Consolidated => format!(
            "Batch: {}\nTopic: {}\n\nSummaries:\n---\n{content}\n---",
            request.title, request.topic
        ),
    }
}

/// Cuts `text` down to at most `limit` tokens so a long transcript still fits
/// the model context.
fn truncate_to_token_limit(text: &str, limit: usize) -> String {
    let bpe = match another_tiktoken_rs::cl100k_base() {
        Ok(bpe) => bpe,
        Err(e) => {
            tracing::warn!(error = ?e, "Tokenizer unavailable, sending content untruncated");
            return text.to_string();
        }
    };

    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= limit {
        return text.to_string();
    }

    tracing::warn!(tokens = tokens.len(), limit, "Content exceeds context window, truncating");
    match bpe.decode(tokens[..limit].to_vec()) {
        Ok(truncated) => truncated,
        Err(e) => {
            tracing::warn!(error = ?e, "Failed to decode truncated tokens, cutting by characters");
            let keep = text.chars().count() * limit / tokens.len();
            text.chars().take(keep).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        let text = "A short transcript about Rust.";
        assert_eq!(truncate_to_token_limit(text, 1_000), text);
    }

    #[test]
    fn test_long_text_is_truncated() {
        let text = "word ".repeat(5_000);
        let truncated = truncate_to_token_limit(&text, 100);
        assert!(truncated.len() < text.len());
        assert!(text.starts_with(&truncated));
    }

    #[test]
    fn test_user_message_per_role() {
        let request = SummaryRequest {
            content: "the transcript",
            title: "Intro to Tokio",
            topic: "Rust Channel",
            role: SummaryRole::PerVideo,
        };
        let msg = render_user_message(&request, request.content);
        assert!(msg.contains("Title: \"Intro to Tokio\""));
        assert!(msg.contains("Topic: Rust Channel"));
        assert!(msg.contains("the transcript"));

        let request = SummaryRequest {
            role: SummaryRole::Consolidated,
            ..request
        };
        let msg = render_user_message(&request, "all summaries");
        assert!(msg.starts_with("Batch: Intro to Tokio"));
        assert!(msg.contains("all summaries"));
    }

    #[test]
    fn test_system_prompt_differs_by_role() {
        assert_ne!(
            OpenAIClient::system_prompt(SummaryRole::PerVideo),
            OpenAIClient::system_prompt(SummaryRole::Consolidated)
        );
    }
}
