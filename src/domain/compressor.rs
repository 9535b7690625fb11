//! Contextual compressor (reranker) settings.

use super::{check_discriminator, parse_validated};
use crate::errors::{CapabilityKind, Result};
use crate::secrets::SecretReference;
use serde::{Deserialize, Serialize};
use validator::Validate;

provider_enum! {
    CompressorProvider: CapabilityKind::Compressor => {
        Bloomz => "BloomzRerank",
    }
}

fn default_max_documents() -> usize {
    50
}

fn default_label() -> String {
    "entailment".to_string()
}

/// Bloomz scoring endpoint used as a reranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BloomzCompressorSettings {
    /// Scoring model endpoint
    #[validate(url(message = "endpoint must be a valid URL"))]
    pub endpoint: String,

    /// Minimum score for a document to be kept
    pub min_score: f64,

    /// Cap on returned documents, keeps the generation prompt within budget
    #[serde(default = "default_max_documents")]
    #[validate(range(min = 1, message = "max_documents must be at least 1"))]
    pub max_documents: usize,

    /// Classifier label whose score ranks documents
    #[serde(default = "default_label")]
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: String,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,
}

/// Compressor settings, discriminated by `provider`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum CompressorSettings {
    #[serde(rename = "BloomzRerank")]
    Bloomz(BloomzCompressorSettings),
}

impl CompressorSettings {
    /// Parse and validate settings from a raw configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_discriminator::<CompressorProvider>(&value, "provider")?;
        parse_validated(value)
    }

    pub fn provider(&self) -> CompressorProvider {
        match self {
            Self::Bloomz(_) => CompressorProvider::Bloomz,
        }
    }
}

impl Validate for CompressorSettings {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::Bloomz(s) => s.validate(),
        }
    }
}
