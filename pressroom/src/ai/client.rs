//! HTTP client for structured generation against the three AI providers.
//!
//! Every tool call goes through [`ProviderClient::generate_object`]: the
//! provider is asked to answer with a JSON object (OpenAI `response_format`,
//! Anthropic system instruction, Google `responseMimeType`), and the reply is
//! parsed into a `serde_json::Value` for the caller to validate against its
//! tool-specific shape.
//!
//! Base URLs come from configuration so tests can point at a mock server.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use crate::ai::ToolError;
use crate::api::models::provider_keys::Provider;
use crate::config::ProvidersConfig;

/// Anthropic requires a version header on every request
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One structured-generation request, provider-agnostic
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
}

/// The provider's parsed answer plus its reported token usage
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub json: serde_json::Value,
    pub tokens_used: Option<i64>,
}

/// Makes sure a url has a trailing slash.
///
/// This fixes a weird idiosyncracy in rusts 'join' method on urls, where joining URLs like
/// '/hello', 'world' gives you '/world', but '/hello/', 'world' gives you '/hello/world'.
/// Basically, call this before calling .join
fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}

#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    config: ProvidersConfig,
}

impl ProviderClient {
    pub fn new(config: ProvidersConfig) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self { http, config }
    }

    /// Call the provider's structured-generation endpoint and return the
    /// parsed JSON object.
    #[instrument(skip(self, api_key, request), fields(model = %request.model), err)]
    pub async fn generate_object(
        &self,
        provider: Provider,
        api_key: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<GenerationOutput, ToolError> {
        match provider {
            Provider::OpenAi => self.generate_openai(api_key, request).await,
            Provider::Anthropic => self.generate_anthropic(api_key, request).await,
            Provider::Google => self.generate_google(api_key, request).await,
        }
    }

    async fn generate_openai(&self, api_key: &str, request: &GenerationRequest<'_>) -> Result<GenerationOutput, ToolError> {
        let url = ensure_slash(&self.config.openai_base_url)
            .join("chat/completions")
            .map_err(|e| upstream(Provider::OpenAi, format!("construct URL: {e}")))?;
        debug!("OpenAI generation request to {}", url);

        let body = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
            "temperature": request.temperature,
            "top_p": request.top_p,
            "max_tokens": request.max_tokens,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream(Provider::OpenAi, e.to_string()))?;

        let body: OpenAiResponse = check_and_parse(Provider::OpenAi, response).await?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| malformed(Provider::OpenAi, "response carried no choices".to_string()))?;

        Ok(GenerationOutput {
            json: parse_object(Provider::OpenAi, content)?,
            tokens_used: body.usage.map(|u| u.total_tokens),
        })
    }

    async fn generate_anthropic(&self, api_key: &str, request: &GenerationRequest<'_>) -> Result<GenerationOutput, ToolError> {
        let url = ensure_slash(&self.config.anthropic_base_url)
            .join("messages")
            .map_err(|e| upstream(Provider::Anthropic, format!("construct URL: {e}")))?;
        debug!("Anthropic generation request to {}", url);

        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "top_p": request.top_p,
            "system": request.system_prompt,
            "messages": [
                {"role": "user", "content": request.user_prompt},
            ],
        });

        let response = self
            .http
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream(Provider::Anthropic, e.to_string()))?;

        let body: AnthropicResponse = check_and_parse(Provider::Anthropic, response).await?;

        let content = body
            .content
            .first()
            .map(|c| c.text.as_str())
            .ok_or_else(|| malformed(Provider::Anthropic, "response carried no content blocks".to_string()))?;

        let tokens_used = body.usage.map(|u| u.input_tokens + u.output_tokens);

        Ok(GenerationOutput {
            json: parse_object(Provider::Anthropic, content)?,
            tokens_used,
        })
    }

    async fn generate_google(&self, api_key: &str, request: &GenerationRequest<'_>) -> Result<GenerationOutput, ToolError> {
        let url = ensure_slash(&self.config.google_base_url)
            .join(&format!("models/{}:generateContent", request.model))
            .map_err(|e| upstream(Provider::Google, format!("construct URL: {e}")))?;
        debug!("Google generation request to {}", url);

        let body = json!({
            "system_instruction": {"parts": [{"text": request.system_prompt}]},
            "contents": [{"parts": [{"text": request.user_prompt}]}],
            "generationConfig": {
                "temperature": request.temperature,
                "topP": request.top_p,
                "maxOutputTokens": request.max_tokens,
                "responseMimeType": "application/json",
            },
        });

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream(Provider::Google, e.to_string()))?;

        let body: GoogleResponse = check_and_parse(Provider::Google, response).await?;

        let content = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| malformed(Provider::Google, "response carried no candidates".to_string()))?;

        Ok(GenerationOutput {
            json: parse_object(Provider::Google, content)?,
            tokens_used: body.usage_metadata.map(|u| u.total_token_count),
        })
    }
}

fn upstream(provider: Provider, message: String) -> ToolError {
    ToolError::Upstream { provider, message }
}

fn malformed(provider: Provider, message: String) -> ToolError {
    ToolError::MalformedOutput { provider, message }
}

/// Reject non-success statuses with the (truncated) body, then parse the JSON envelope
async fn check_and_parse<T: serde::de::DeserializeOwned>(provider: Provider, response: reqwest::Response) -> Result<T, ToolError> {
    let status = response.status();
    let body_text = response.text().await.map_err(|e| upstream(provider, e.to_string()))?;

    if !status.is_success() {
        let mut snippet = body_text;
        snippet.truncate(512);
        return Err(upstream(provider, format!("{status}: {snippet}")));
    }

    serde_json::from_str(&body_text).map_err(|e| malformed(provider, format!("error decoding response body: {e}")))
}

/// Parse the model's text answer as a JSON object
fn parse_object(provider: Provider, content: &str) -> Result<serde_json::Value, ToolError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| malformed(provider, format!("answer is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(malformed(provider, "answer is not a JSON object".to_string()));
    }
    Ok(value)
}

// --- Provider response envelopes (only the fields we read) ---

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    total_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: i64,
    output_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    candidates: Vec<GoogleCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GoogleUsage>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Debug, Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Debug, Deserialize)]
struct GooglePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> ProvidersConfig {
        ProvidersConfig {
            openai_base_url: Url::parse(base).unwrap(),
            anthropic_base_url: Url::parse(base).unwrap(),
            google_base_url: Url::parse(base).unwrap(),
            request_timeout: std::time::Duration::from_secs(5),
        }
    }

    fn request<'a>() -> GenerationRequest<'a> {
        GenerationRequest {
            model: "test-model",
            system_prompt: "You answer with JSON.",
            user_prompt: "Make a thread.",
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 512,
        }
    }

    #[tokio::test]
    async fn test_openai_structured_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "response_format": {"type": "json_object"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"threads\": [\"one\", \"two\"]}"}}],
                "usage": {"prompt_tokens": 40, "completion_tokens": 20, "total_tokens": 60},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let output = client.generate_object(Provider::OpenAi, "sk-test", &request()).await.unwrap();

        assert_eq!(output.json["threads"][1], "two");
        assert_eq!(output.tokens_used, Some(60));
    }

    #[tokio::test]
    async fn test_anthropic_structured_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "{\"summary\": \"short\", \"key_points\": []}"}],
                "usage": {"input_tokens": 30, "output_tokens": 12},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let output = client.generate_object(Provider::Anthropic, "sk-ant-test", &request()).await.unwrap();

        assert_eq!(output.json["summary"], "short");
        assert_eq!(output.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn test_google_structured_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "g-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "{\"verdict\": \"accurate\", \"confidence\": 0.9, \"claims\": []}"}]}}],
                "usageMetadata": {"totalTokenCount": 77},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let output = client.generate_object(Provider::Google, "g-test", &request()).await.unwrap();

        assert_eq!(output.json["verdict"], "accurate");
        assert_eq!(output.tokens_used, Some(77));
    }

    #[tokio::test]
    async fn test_upstream_error_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let err = client.generate_object(Provider::OpenAi, "sk-test", &request()).await.unwrap_err();

        match err {
            ToolError::Upstream { provider, message } => {
                assert_eq!(provider, Provider::OpenAi);
                assert!(message.contains("429"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_answer_is_malformed_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "sorry, I cannot do that"}}],
            })))
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let err = client.generate_object(Provider::OpenAi, "sk-test", &request()).await.unwrap_err();

        assert!(matches!(err, ToolError::MalformedOutput { .. }));
    }

    #[tokio::test]
    async fn test_json_array_answer_is_malformed_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "[1, 2, 3]"}],
            })))
            .mount(&server)
            .await;

        let client = ProviderClient::new(test_config(&server.uri()));
        let err = client.generate_object(Provider::Anthropic, "sk-ant", &request()).await.unwrap_err();

        assert!(matches!(err, ToolError::MalformedOutput { .. }));
    }
}
