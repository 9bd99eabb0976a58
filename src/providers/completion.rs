//! LLM completion provider.
//!
//! [`OpenAiCompletions`] wraps the OpenAI chat completions endpoint for the
//! two jobs the lifecycle needs: distilling a conversation into a prompt
//! draft, and revising an existing template from feedback. Analysis replies
//! are requested as JSON and parsed tolerant of markdown code fences.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::core::config::CompletionConfig;
use crate::domains::library::conversation::ConversationMessage;
use crate::storage::UseCase;

/// The distilled form of a conversation, as produced by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationAnalysis {
    pub use_case: UseCase,
    pub summary: String,
    pub prompt_template: String,
    pub history: String,
}

/// Service interface for the LLM-backed lifecycle steps.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Distill a conversation into a categorized prompt draft.
    async fn analyze_conversation(
        &self,
        messages: &[ConversationMessage],
        task_description: Option<&str>,
    ) -> Result<ConversationAnalysis, ProviderError>;

    /// Produce a revised prompt template incorporating the feedback.
    async fn revise_template(
        &self,
        template: &str,
        feedback: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// OpenAI chat completions client.
#[derive(Clone)]
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Analysis reply as the model emits it, before category validation.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    use_case: String,
    summary: String,
    prompt_template: String,
    history: String,
}

impl OpenAiCompletions {
    /// Provider name used in error messages.
    pub const PROVIDER: &'static str = "OpenAI";

    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    const MAX_TOKENS: u32 = 2048;
    const TEMPERATURE: f32 = 0.7;

    /// Create a new client with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    /// Build a client from configuration.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials {
                provider: Self::PROVIDER,
            })?;
        Ok(Self::new(api_key).with_model(config.model.clone()))
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn request(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(Self::MAX_TOKENS),
            temperature: Some(Self::TEMPERATURE),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::request(Self::PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::request(
                Self::PROVIDER,
                format!("API returned status: {} - {}", status, body),
            ));
        }

        let response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::response(Self::PROVIDER, e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::response(Self::PROVIDER, "no choices in response"))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn analyze_conversation(
        &self,
        messages: &[ConversationMessage],
        task_description: Option<&str>,
    ) -> Result<ConversationAnalysis, ProviderError> {
        let system_prompt = "You are an AI assistant that turns coding conversations into \
            reusable prompt templates. Respond only with valid JSON.";

        let task_line = match task_description {
            Some(task) => format!("Task being performed: {}\n\n", task),
            None => String::new(),
        };

        let user_prompt = format!(
            r#"Analyze the following conversation and distill it into a reusable prompt.

{task_line}Conversation:
{transcript}

Respond in JSON format with these fields:
- use_case: one of "code-gen", "text-gen", "data-analysis", "creative", "general"
- summary: 2-4 sentences describing what the prompt accomplishes and when to use it
- prompt_template: a reusable markdown prompt template generalized from this conversation
- history: a brief account of how the task was approached and solved"#,
            task_line = task_line,
            transcript = render_transcript(messages),
        );

        let reply = self
            .request(vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ])
            .await?;

        parse_analysis(&reply)
    }

    async fn revise_template(
        &self,
        template: &str,
        feedback: &str,
        context: Option<&str>,
    ) -> Result<String, ProviderError> {
        let system_prompt = "You refine prompt templates based on user feedback. Respond with \
            the complete revised template in markdown, with no commentary before or after.";

        let context_block = match context {
            Some(ctx) => format!("\n\nHow the prompt was used:\n{}", ctx),
            None => String::new(),
        };

        let user_prompt = format!(
            "Current prompt template:\n\n{}\n\nFeedback:\n{}{}\n\n\
             Rewrite the template so it addresses the feedback while keeping what worked.",
            template, feedback, context_block,
        );

        let reply = self
            .request(vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ])
            .await?;

        let revised = strip_code_fence(&reply);
        if revised.is_empty() {
            return Err(ProviderError::response(
                Self::PROVIDER,
                "empty revised template",
            ));
        }
        Ok(revised.to_string())
    }
}

// ============================================================================
// Reply Parsing
// ============================================================================

fn render_transcript(messages: &[ConversationMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn parse_analysis(reply: &str) -> Result<ConversationAnalysis, ProviderError> {
    let json = extract_json_from_response(reply);
    let raw: RawAnalysis = serde_json::from_str(json).map_err(|e| {
        ProviderError::response(
            OpenAiCompletions::PROVIDER,
            format!("invalid analysis JSON: {}", e),
        )
    })?;

    Ok(ConversationAnalysis {
        use_case: UseCase::from_model_label(&raw.use_case),
        summary: raw.summary,
        prompt_template: raw.prompt_template,
        history: raw.history,
    })
}

/// Extracts JSON from an LLM reply, handling markdown code blocks.
fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks (without json marker)
    if let Some(start) = trimmed.find("```") {
        let content_start = start + 3;
        let after_marker = &trimmed[content_start..];
        let json_start = after_marker
            .find('{')
            .map_or(content_start, |pos| content_start + pos);
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle raw JSON (find first { to last })
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            return &trimmed[start..=end];
        }
    }

    trimmed
}

/// Strip a surrounding markdown code fence from a template reply, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return trimmed,
    };
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => trimmed,
    }
}

// ============================================================================
// Tests
// ============================================================================
