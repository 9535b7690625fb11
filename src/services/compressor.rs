//! Contextual compression: rerank and trim retrieved documents.

use super::documents::Document;
use super::http::{build_client, endpoint, json, send, with_bloomz_auth};
use crate::errors::Result;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

/// Trait for reducing a retrieved document set to the most relevant subset
#[async_trait]
pub trait DocumentCompressor: Send + Sync + std::fmt::Debug {
    async fn compress_documents(&self, documents: Vec<Document>, query: &str) -> Result<Vec<Document>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    contexts: Vec<ScoreContext<'a>>,
}

#[derive(Serialize)]
struct ScoreContext<'a> {
    query: &'a str,
    context: &'a str,
}

#[derive(Deserialize)]
struct ScoreResponse {
    response: Vec<Vec<LabelScore>>,
}

/// One classifier label and its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Reranker backed by a Bloomz `/score` endpoint
#[derive(Debug, Clone)]
pub struct BloomzRerank {
    client: reqwest::Client,
    url: Url,
    min_score: f64,
    max_documents: usize,
    label: String,
    api_key: Option<SecretString>,
}

impl BloomzRerank {
    pub fn new(
        endpoint_url: &str,
        min_score: f64,
        max_documents: usize,
        label: impl Into<String>,
        api_key: Option<SecretString>,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(false)?,
            url: endpoint(endpoint_url, "/score")?,
            min_score,
            max_documents,
            label: label.into(),
            api_key,
        })
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn max_documents(&self) -> usize {
        self.max_documents
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Keep documents whose `label` score reaches `min_score`, best first,
    /// at most `max_documents` of them.
    pub fn rank(&self, documents: Vec<Document>, scores: Vec<Vec<LabelScore>>) -> Vec<Document> {
        let mut kept: Vec<(f64, Document)> = Vec::new();

        for (index, (document, doc_scores)) in documents.into_iter().zip(scores).enumerate() {
            let Some(score) = doc_scores.iter().find(|s| s.label == self.label).map(|s| s.score) else {
                warn!(index = index, label = %self.label, "Scoring response has no entry for label");
                continue;
            };
            if score >= self.min_score {
                kept.push((score, document.with_metadata("retriever_score", score)));
            }
        }

        kept.sort_by(|a, b| b.0.total_cmp(&a.0));
        kept.into_iter().take(self.max_documents).map(|(_, document)| document).collect()
    }
}

#[async_trait]
impl DocumentCompressor for BloomzRerank {
    async fn compress_documents(&self, documents: Vec<Document>, query: &str) -> Result<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        debug!(url = %self.url, count = documents.len(), "Scoring documents");

        let body = ScoreRequest {
            contexts: documents
                .iter()
                .map(|d| ScoreContext { query, context: &d.page_content })
                .collect(),
        };
        let request = with_bloomz_auth(self.client.post(self.url.clone()).json(&body), self.api_key.as_ref());
        let response = send(self.name(), request).await?;
        let parsed: ScoreResponse = json(self.name(), response).await?;

        Ok(self.rank(documents, parsed.response))
    }

    fn name(&self) -> &str {
        "bloomz_rerank"
    }
}
