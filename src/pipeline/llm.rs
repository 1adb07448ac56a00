//! Content generation: one completion call, then sanitise the reply.
//!
//! The backend is reached through the [`TextGenerator`] seam so the pipeline
//! can run against any edgequake-llm provider in production and a scripted
//! stub in tests. All prompt text lives in [`crate::prompts`]; this module
//! only assembles the request, makes the call and interprets the reply.
//!
//! There is no retry loop: a backend failure surfaces as
//! [`ReportError::BackendError`] and an unusable reply as
//! [`ReportError::GenerationParse`], both terminal for the request.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::pipeline::sanitize::sanitize;
use crate::prompts::REPORT_SYSTEM_PROMPT;
use crate::report::{ReportRequest, StructuredReport};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// A single non-streaming text-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier the backend should use.
    pub model: String,
    /// System instruction (the report policy).
    pub system: String,
    /// The user's raw text.
    pub user: String,
    /// Output token budget.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Anything that can turn a [`CompletionRequest`] into raw reply text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one completion. Transport, auth and quota failures map to
    /// [`ReportError::BackendError`].
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// [`TextGenerator`] backed by an edgequake-llm provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ReportError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = build_options(request);

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ReportError::BackendError {
                message: format!("{e}"),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Build `CompletionOptions` from a completion request.
fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

/// Assemble the completion request for `request` under `config`.
pub fn build_request(request: &ReportRequest, config: &ReportConfig) -> CompletionRequest {
    CompletionRequest {
        model: config.model.clone(),
        system: config
            .system_prompt
            .clone()
            .unwrap_or_else(|| REPORT_SYSTEM_PROMPT.to_string()),
        user: request.text.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

/// Ask the backend for report content and recover a [`StructuredReport`].
///
/// On an unusable reply the raw text is logged at `error` level so the
/// failure can be diagnosed; the returned error only carries its length.
pub async fn generate_structured(
    generator: &dyn TextGenerator,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<StructuredReport, ReportError> {
    let completion = build_request(request, config);
    info!(
        "Requesting report content from {} (model={}, max_tokens={}, temperature={})",
        generator.name(),
        completion.model,
        completion.max_tokens,
        completion.temperature
    );

    let raw = generator.complete(&completion).await?;
    debug!("Model reply: {} bytes", raw.len());

    let Some(value) = sanitize(&raw) else {
        error!("Failed to parse JSON from model reply");
        error!("Raw output: {}", raw);
        return Err(ReportError::GenerationParse {
            reason: "no JSON object could be recovered".to_string(),
            raw_len: raw.len(),
        });
    };

    StructuredReport::from_value(value).inspect_err(|e| {
        error!("Model reply did not match the report schema: {}", e);
        error!("Raw output: {}", raw);
    })
}
