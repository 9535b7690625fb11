//! Embedding model settings.

use super::{check_discriminator, parse_validated};
use crate::errors::{CapabilityKind, Result};
use crate::secrets::SecretReference;
use serde::{Deserialize, Serialize};
use validator::Validate;

provider_enum! {
    /// Embedding model providers
    EmbeddingProvider: CapabilityKind::Embedding => {
        Bloomz => "BloomzEmbeddings",
        AzureOpenAi => "AzureOpenAI",
        Vllm => "Vllm",
    }
}

fn default_space_type() -> String {
    "l2".to_string()
}

/// Self-hosted Bloomz embedding endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BloomzEmbeddingSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,

    /// Pooling method (`first`, `mean`, `last`)
    #[serde(default)]
    pub pooling: Option<String>,

    /// Distance used when searching these vectors (`l2`, `cosine`, ...)
    #[serde(default = "default_space_type")]
    pub space_type: String,
}

/// Azure OpenAI embedding deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AzureOpenAiEmbeddingSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    #[validate(length(min = 1, message = "api_version must not be empty"))]
    pub api_version: String,

    #[validate(length(min = 1, message = "deployment must not be empty"))]
    pub deployment: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,

    #[serde(default)]
    pub pooling: Option<String>,

    #[serde(default = "default_space_type")]
    pub space_type: String,
}

/// OpenAI-compatible vLLM embedding server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VllmEmbeddingSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,

    #[serde(default)]
    pub pooling: Option<String>,

    #[serde(default = "default_space_type")]
    pub space_type: String,
}

/// Embedding settings, discriminated by `provider`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum EmbeddingSettings {
    #[serde(rename = "BloomzEmbeddings")]
    Bloomz(BloomzEmbeddingSettings),
    #[serde(rename = "AzureOpenAI")]
    AzureOpenAi(AzureOpenAiEmbeddingSettings),
    #[serde(rename = "Vllm")]
    Vllm(VllmEmbeddingSettings),
}

impl EmbeddingSettings {
    /// Parse and validate settings from a raw configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_discriminator::<EmbeddingProvider>(&value, "provider")?;
        parse_validated(value)
    }

    pub fn provider(&self) -> EmbeddingProvider {
        match self {
            Self::Bloomz(_) => EmbeddingProvider::Bloomz,
            Self::AzureOpenAi(_) => EmbeddingProvider::AzureOpenAi,
            Self::Vllm(_) => EmbeddingProvider::Vllm,
        }
    }

    /// Vector space the model embeds into; vector stores search with it
    pub fn space_type(&self) -> &str {
        match self {
            Self::Bloomz(s) => &s.space_type,
            Self::AzureOpenAi(s) => &s.space_type,
            Self::Vllm(s) => &s.space_type,
        }
    }
}

impl Validate for EmbeddingSettings {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::Bloomz(s) => s.validate(),
            Self::AzureOpenAi(s) => s.validate(),
            Self::Vllm(s) => s.validate(),
        }
    }
}
