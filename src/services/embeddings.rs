//! Embedding model clients.

use super::http::{build_client, endpoint, json, nested_endpoint, send, with_bloomz_auth};
use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Inputs sent per request to Azure OpenAI embedding deployments
pub const AZURE_EMBEDDING_CHUNK_SIZE: usize = 16;

/// Placeholder key OpenAI-compatible servers accept when auth is disabled
pub(crate) const EMPTY_API_KEY: &str = "EMPTY";

/// Trait for turning text into vectors
///
/// Implementations:
/// - [`BloomzEmbeddings`]: self-hosted Bloomz `/embed` endpoint
/// - [`OpenAiCompatibleEmbeddings`]: Azure OpenAI deployments and vLLM servers
#[async_trait]
pub trait Embeddings: Send + Sync + std::fmt::Debug {
    /// Embed a batch of documents, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream_status(self.name(), 200, "no embedding returned for query"))
    }

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct BloomzEmbedRequest<'a> {
    text: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pooling: Option<&'a str>,
}

#[derive(Deserialize)]
struct BloomzEmbedResponse {
    embedding: Vec<Vec<f32>>,
}

/// Client for a Bloomz embedding server
#[derive(Debug, Clone)]
pub struct BloomzEmbeddings {
    client: reqwest::Client,
    url: Url,
    model: Option<String>,
    pooling: Option<String>,
    api_key: Option<SecretString>,
}

impl BloomzEmbeddings {
    pub fn new(
        api_base: &str,
        model: Option<String>,
        pooling: Option<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self> {
        Ok(Self { client: build_client(false)?, url: endpoint(api_base, "/embed")?, model, pooling, api_key })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn pooling(&self) -> Option<&str> {
        self.pooling.as_deref()
    }
}

#[async_trait]
impl Embeddings for BloomzEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(url = %self.url, count = texts.len(), "Requesting Bloomz embeddings");

        let body = BloomzEmbedRequest { text: texts, pooling: self.pooling.as_deref() };
        let request = with_bloomz_auth(self.client.post(self.url.clone()).json(&body), self.api_key.as_ref());
        let response = send(self.name(), request).await?;
        let parsed: BloomzEmbedResponse = json(self.name(), response).await?;
        Ok(parsed.embedding)
    }

    fn name(&self) -> &str {
        "bloomz_embeddings"
    }
}

#[derive(Debug, Clone)]
enum OpenAiAuth {
    /// Azure `api-key` header
    ApiKey(SecretString),
    /// `Authorization: Bearer` header
    Bearer(SecretString),
}

#[derive(Serialize)]
struct OpenAiEmbedRequest<'a> {
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Client for the OpenAI `/embeddings` API, as served by Azure OpenAI or vLLM
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleEmbeddings {
    client: reqwest::Client,
    url: Url,
    model: Option<String>,
    auth: Option<OpenAiAuth>,
    chunk_size: usize,
    name: &'static str,
}

impl OpenAiCompatibleEmbeddings {
    /// Azure OpenAI deployment: `{api_base}/openai/deployments/{deployment}/embeddings?api-version=...`
    pub fn azure(
        api_base: &str,
        deployment: &str,
        api_version: &str,
        model: Option<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self> {
        let mut url = nested_endpoint(api_base, &format!("openai/deployments/{}/embeddings", deployment))?;
        url.query_pairs_mut().append_pair("api-version", api_version);

        Ok(Self {
            client: build_client(false)?,
            url,
            model,
            auth: api_key.map(OpenAiAuth::ApiKey),
            chunk_size: AZURE_EMBEDDING_CHUNK_SIZE,
            name: "azure_openai_embeddings",
        })
    }

    /// vLLM server: `{api_base}/embeddings`, bearer `EMPTY` when no key is configured
    pub fn vllm(api_base: &str, model: String, api_key: Option<SecretString>) -> Result<Self> {
        let key = api_key.unwrap_or_else(|| SecretString::new(EMPTY_API_KEY));
        Ok(Self {
            client: build_client(false)?,
            url: nested_endpoint(api_base, "embeddings")?,
            model: Some(model),
            auth: Some(OpenAiAuth::Bearer(key)),
            chunk_size: usize::MAX,
            name: "vllm_embeddings",
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Maximum inputs per request
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = OpenAiEmbedRequest { input: chunk, model: self.model.as_deref() };
        let mut request = self.client.post(self.url.clone()).json(&body);
        request = match &self.auth {
            Some(OpenAiAuth::ApiKey(key)) => request.header("api-key", key.expose_secret()),
            Some(OpenAiAuth::Bearer(key)) => request.bearer_auth(key.expose_secret()),
            None => request,
        };

        let response = send(self.name, request).await?;
        let mut parsed: OpenAiEmbedResponse = json(self.name, response).await?;
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embeddings for OpenAiCompatibleEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(url = %self.url, count = texts.len(), chunk_size = self.chunk_size, "Requesting embeddings");

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.chunk_size.max(1)) {
            embeddings.extend(self.embed_chunk(chunk).await?);
        }
        Ok(embeddings)
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_bloomz_embed_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .and(header("Authentication", "Bearer token"))
            .and(body_json(serde_json::json!({"text": ["hello", "world"], "pooling": "mean"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [[0.1, 0.2], [0.3, 0.4]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = BloomzEmbeddings::new(
            &server.uri(),
            None,
            Some("mean".to_string()),
            Some(SecretString::new("token")),
        )
        .unwrap();

        let vectors =
            client.embed_documents(&["hello".to_string(), "world".to_string()]).await.unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_bloomz_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = BloomzEmbeddings::new(&server.uri(), None, None, None).unwrap();
        let err = client.embed_query("hello").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamStatus { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_azure_batches_in_chunks_of_sixteen() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/ada/embeddings"))
            .and(query_param("api-version", "2023-05-15"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0], "index": 0}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = OpenAiCompatibleEmbeddings::azure(
            &server.uri(),
            "ada",
            "2023-05-15",
            None,
            Some(SecretString::new("azure-key")),
        )
        .unwrap();

        let texts: Vec<String> = (0..17).map(|i| format!("text {}", i)).collect();
        let vectors = client.embed_documents(&texts).await.unwrap();
        assert_eq!(vectors.len(), 2);
    }

    #[tokio::test]
    async fn test_vllm_uses_empty_key_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("Authorization", "Bearer EMPTY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.5], "index": 1}, {"embedding": [0.25], "index": 0}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiCompatibleEmbeddings::vllm(
            &format!("{}/v1", server.uri()),
            "intfloat/e5-large".to_string(),
            None,
        )
        .unwrap();

        let vectors = client.embed_documents(&["a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(vectors, vec![vec![0.25], vec![0.5]]);
    }
}
