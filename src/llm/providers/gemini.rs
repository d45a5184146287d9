use crate::llm::provider::{CompletionOptions, CompletionResponse, LLMProvider, Message};
use crate::utils::error::ParrotyError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const PROVIDER: &str = "gemini";

/// Google Gemini `generateContent` provider.
///
/// # Examples
///
/// ```no_run
/// use parroty::llm::providers::gemini::GeminiProvider;
/// use std::time::Duration;
///
/// let provider = GeminiProvider::new(
///     "your-api-key".to_owned(),
///     "gemini-2.0-flash".to_owned(),
///     Duration::from_secs(120),
/// )?;
/// # Ok::<(), parroty::utils::error::ParrotyError>(())
/// ```
pub struct GeminiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

/// Response from `generateContent`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    status: Option<String>,
    message: String,
}

impl GeminiProvider {
    /// Creates a provider against the public Gemini endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is blank or the HTTP client cannot be
    /// created.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, ParrotyError> {
        Self::with_endpoint(api_key, model, GEMINI_API_URL.to_owned(), timeout)
    }

    /// Creates a provider against a custom base URL (proxies, test servers).
    pub fn with_endpoint(
        api_key: String,
        model: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, ParrotyError> {
        if api_key.trim().is_empty() {
            return Err(ParrotyError::missing_api_key(API_KEY_ENV));
        }
        if model.trim().is_empty() {
            return Err(ParrotyError::Config("Model name must not be empty".to_owned()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParrotyError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    /// Split off a leading system message; Gemini takes it as
    /// `systemInstruction` rather than as a turn.
    fn extract_system_prompt(messages: &[Message]) -> (Option<&str>, &[Message]) {
        match messages.split_first() {
            Some((first, rest)) if first.role == "system" => (Some(first.content.as_str()), rest),
            _ => (None, messages),
        }
    }

    fn build_request<'a>(
        messages: &'a [Message],
        options: &CompletionOptions,
    ) -> GenerateRequest<'a> {
        let (system_prompt, turns) = Self::extract_system_prompt(messages);

        let contents = turns
            .iter()
            .map(|m| Content {
                role: m.role.as_str(),
                parts: vec![Part { text: &m.content }],
            })
            .collect();

        let generation_config = (options.temperature.is_some() || options.max_tokens.is_some())
            .then_some(GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            });

        GenerateRequest {
            contents,
            system_instruction: system_prompt.map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
            generation_config,
        }
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(body: GenerateResponse) -> Result<CompletionResponse, ParrotyError> {
        let (prompt_tokens, completion_tokens) = body
            .usage_metadata
            .map_or((0, 0), |u| (u.prompt_token_count, u.candidates_token_count));

        let Some(candidate) = body.candidates.into_iter().next() else {
            let reason = body
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map_or_else(|| "no candidates".to_owned(), |r| format!("blocked: {r}"));
            return Err(ParrotyError::EmptyResponse {
                provider: PROVIDER.to_owned(),
                reason,
            });
        };

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ParrotyError::EmptyResponse {
                provider: PROVIDER.to_owned(),
                reason: candidate
                    .finish_reason
                    .unwrap_or_else(|| "unknown".to_owned()),
            });
        }

        Ok(CompletionResponse {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ParrotyError> {
        let request_body = Self::build_request(messages, options);

        tracing::debug!(model = %self.model, turns = request_body.contents.len(), "sending generateContent request");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;
        let status = response.status();

        // Handle rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);

            return Err(ParrotyError::RateLimited {
                provider: PROVIDER.to_owned(),
                retry_after,
            });
        }

        if status.is_server_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ParrotyError::NetworkError {
                message: format!("HTTP {status} from {PROVIDER}: {}", error_text.trim()),
                source: None,
            });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error) = serde_json::from_str::<GeminiError>(&error_text) {
                let message = match error.error.status {
                    Some(kind) => format!("{kind}: {}", error.error.message),
                    None => error.error.message,
                };
                return Err(ParrotyError::Provider {
                    provider: PROVIDER.to_owned(),
                    message,
                });
            }

            return Err(ParrotyError::Provider {
                provider: PROVIDER.to_owned(),
                message: format!("HTTP {status}: {error_text}"),
            });
        }

        let text = response.text().await?;
        let body: GenerateResponse = serde_json::from_str(&text)?;
        Self::extract_text(body)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}
