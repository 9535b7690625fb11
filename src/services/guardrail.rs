//! Guardrail parsers that score generated text for toxicity.

use super::compressor::LabelScore;
use super::http::{build_client, endpoint, json, send, with_bloomz_auth};
use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Result of running generated text through a guardrail
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GuardrailOutput {
    pub content: String,
    #[serde(default)]
    pub output_toxicity: bool,
    /// Labels that exceeded the threshold
    #[serde(default)]
    pub output_toxicity_reason: Vec<String>,
}

/// Trait for guardrail output parsers
#[async_trait]
pub trait GuardrailParser: Send + Sync + std::fmt::Debug {
    async fn parse(&self, text: &str) -> Result<GuardrailOutput>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct GuardrailRequest<'a> {
    text: [&'a str; 1],
}

#[derive(Deserialize)]
struct GuardrailResponse {
    response: Vec<Vec<LabelScore>>,
}

/// Parser backed by a Bloomz `/guardrail` endpoint
#[derive(Debug, Clone)]
pub struct BloomzGuardrailParser {
    client: reqwest::Client,
    url: Url,
    max_score: f64,
    api_key: Option<SecretString>,
}

impl BloomzGuardrailParser {
    pub fn new(endpoint_url: &str, max_score: f64, api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            client: build_client(false)?,
            url: endpoint(endpoint_url, "/guardrail")?,
            max_score,
            api_key,
        })
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Flag every detection scoring strictly above `max_score`
    pub fn evaluate(&self, text: &str, detections: &[LabelScore]) -> GuardrailOutput {
        let reasons: Vec<String> = detections
            .iter()
            .filter(|d| d.score > self.max_score)
            .map(|d| d.label.clone())
            .collect();

        GuardrailOutput {
            content: text.to_string(),
            output_toxicity: !reasons.is_empty(),
            output_toxicity_reason: reasons,
        }
    }

    /// Output for the part of `next` not already covered by `prev`, for
    /// incremental parsing of a streamed answer.
    pub fn diff(prev: Option<&GuardrailOutput>, next: &GuardrailOutput) -> GuardrailOutput {
        let mut output = next.clone();
        if let Some(prev) = prev {
            output.content = next.content.chars().skip(prev.content.chars().count()).collect();
        }
        output
    }
}

#[async_trait]
impl GuardrailParser for BloomzGuardrailParser {
    async fn parse(&self, text: &str) -> Result<GuardrailOutput> {
        debug!(url = %self.url, max_score = self.max_score, "Checking text against guardrail");

        let body = GuardrailRequest { text: [text] };
        let request = with_bloomz_auth(self.client.post(self.url.clone()).json(&body), self.api_key.as_ref());
        let response = send(self.name(), request).await?;
        let parsed: GuardrailResponse = json(self.name(), response).await?;

        let detections = parsed
            .response
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream_status(self.name(), 200, "response has no results"))?;

        let output = self.evaluate(text, &detections);
        if output.output_toxicity {
            info!(reasons = ?output.output_toxicity_reason, "Guardrail flagged generated text");
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "bloomz_guardrail"
    }
}
