//! Language model clients.

use super::embeddings::EMPTY_API_KEY;
use super::http::{build_client, json, nested_endpoint, send, BLOOMZ_AUTH_HEADER};
use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

/// Trait for text generation
///
/// Implementations:
/// - [`TextGenInferenceClient`]: HuggingFace Text Generation Inference
/// - [`AzureChatClient`]: Azure OpenAI chat deployments
/// - [`VllmClient`]: vLLM's OpenAI-compatible completions API
#[async_trait]
pub trait LanguageModel: Send + Sync + std::fmt::Debug {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Sampling temperature the client was built with
    fn temperature(&self) -> f64;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct TgiRequest<'a> {
    inputs: &'a str,
    parameters: TgiParameters,
}

#[derive(Serialize)]
struct TgiParameters {
    temperature: f64,
    repetition_penalty: f64,
    max_new_tokens: u32,
}

#[derive(Deserialize)]
struct TgiResponse {
    generated_text: String,
}

/// Client for a Text Generation Inference server
#[derive(Debug, Clone)]
pub struct TextGenInferenceClient {
    client: reqwest::Client,
    url: Url,
    api_key: Option<SecretString>,
    temperature: f64,
    repetition_penalty: f64,
    max_new_tokens: u32,
    streaming: bool,
}

impl TextGenInferenceClient {
    pub fn new(
        inference_server_url: &str,
        api_key: Option<SecretString>,
        temperature: f64,
        repetition_penalty: f64,
        max_new_tokens: u32,
        streaming: bool,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(false)?,
            url: nested_endpoint(inference_server_url, "generate")?,
            api_key,
            temperature,
            repetition_penalty,
            max_new_tokens,
            streaming,
        })
    }

    pub fn repetition_penalty(&self) -> f64 {
        self.repetition_penalty
    }

    pub fn max_new_tokens(&self) -> u32 {
        self.max_new_tokens
    }

    /// Whether callers asked for token streaming; `generate` always returns the full text
    pub fn streaming(&self) -> bool {
        self.streaming
    }
}

#[async_trait]
impl LanguageModel for TextGenInferenceClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(url = %self.url, max_new_tokens = self.max_new_tokens, "Calling TGI generate");

        let body = TgiRequest {
            inputs: prompt,
            parameters: TgiParameters {
                temperature: self.temperature,
                repetition_penalty: self.repetition_penalty,
                max_new_tokens: self.max_new_tokens,
            },
        };
        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = send(self.name(), request).await?;
        let parsed: TgiResponse = json(self.name(), response).await?;
        Ok(parsed.generated_text)
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn name(&self) -> &str {
        "huggingface_tgi"
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an Azure OpenAI chat deployment
#[derive(Debug, Clone)]
pub struct AzureChatClient {
    client: reqwest::Client,
    url: Url,
    model: Option<String>,
    api_key: Option<SecretString>,
    temperature: f64,
}

impl AzureChatClient {
    pub fn new(
        azure_endpoint: &str,
        deployment: &str,
        api_version: &str,
        model: Option<String>,
        api_key: Option<SecretString>,
        temperature: f64,
    ) -> Result<Self> {
        let mut url =
            nested_endpoint(azure_endpoint, &format!("openai/deployments/{}/chat/completions", deployment))?;
        url.query_pairs_mut().append_pair("api-version", api_version);

        Ok(Self { client: build_client(false)?, url, model, api_key, temperature })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
}

#[async_trait]
impl LanguageModel for AzureChatClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(url = %self.url, "Calling Azure OpenAI chat completions");

        let body = ChatRequest {
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
            model: self.model.as_deref(),
        };
        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key.expose_secret());
        }

        let response = send(self.name(), request).await?;
        let parsed: ChatResponse = json(self.name(), response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::upstream_status(self.name(), 200, "response has no message content"))
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn name(&self) -> &str {
        "azure_openai_chat"
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Client for vLLM's OpenAI-compatible completions endpoint
#[derive(Debug, Clone)]
pub struct VllmClient {
    client: reqwest::Client,
    url: Url,
    model: Option<String>,
    api_key: SecretString,
    authenticated: bool,
    max_tokens: u32,
    temperature: f64,
    model_kwargs: Map<String, Value>,
}

impl VllmClient {
    /// Without a key, requests carry the `EMPTY` bearer token vLLM expects.
    /// With a key, it is also sent in the Bloomz-style `Authentication` header
    /// for deployments fronted by the same gateway.
    pub fn new(
        api_base: &str,
        model: Option<String>,
        api_key: Option<SecretString>,
        max_tokens: u32,
        temperature: f64,
        model_kwargs: Map<String, Value>,
    ) -> Result<Self> {
        let authenticated = api_key.is_some();
        Ok(Self {
            client: build_client(false)?,
            url: nested_endpoint(api_base, "completions")?,
            model,
            api_key: api_key.unwrap_or_else(|| SecretString::new(EMPTY_API_KEY)),
            authenticated,
            max_tokens,
            temperature,
            model_kwargs,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn model_kwargs(&self) -> &Map<String, Value> {
        &self.model_kwargs
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = self.model_kwargs.clone();
        body.insert("prompt".to_string(), Value::from(prompt));
        body.insert("max_tokens".to_string(), Value::from(self.max_tokens));
        body.insert("temperature".to_string(), Value::from(self.temperature));
        if let Some(model) = &self.model {
            body.insert("model".to_string(), Value::from(model.as_str()));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl LanguageModel for VllmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(url = %self.url, max_tokens = self.max_tokens, "Calling vLLM completions");

        let mut request = self
            .client
            .post(self.url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt));
        if self.authenticated {
            request = request
                .header(BLOOMZ_AUTH_HEADER, format!("Bearer {}", self.api_key.expose_secret()));
        }

        let response = send(self.name(), request).await?;
        let parsed: CompletionResponse = json(self.name(), response).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| Error::upstream_status(self.name(), 200, "response has no choices"))
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn name(&self) -> &str {
        "vllm"
    }
}
