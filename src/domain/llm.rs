//! Large language model settings.

use super::{check_discriminator, parse_validated};
use crate::errors::{CapabilityKind, Result};
use crate::secrets::SecretReference;
use serde::{Deserialize, Serialize};
use validator::Validate;

provider_enum! {
    /// LLM providers
    LlmProvider: CapabilityKind::Llm => {
        /// HuggingFace Text Generation Inference
        Tgi => "HuggingFaceTextGenInference",
        AzureOpenAi => "AzureOpenAI",
        Vllm => "Vllm",
    }
}

fn default_temperature() -> f64 {
    0.5
}

fn default_repetition_penalty() -> f64 {
    1.0
}

fn default_max_new_tokens() -> u32 {
    256
}

/// HuggingFace Text Generation Inference server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TgiSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0 and 2"))]
    pub temperature: f64,

    #[serde(default = "default_repetition_penalty")]
    #[validate(range(min = 0.0, message = "repetition_penalty must not be negative"))]
    pub repetition_penalty: f64,

    #[serde(default = "default_max_new_tokens")]
    #[validate(range(min = 1, message = "max_new_tokens must be at least 1"))]
    pub max_new_tokens: u32,

    #[serde(default)]
    pub streaming: bool,
}

/// Azure OpenAI chat deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AzureOpenAiLlmSettings {
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

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0 and 2"))]
    pub temperature: f64,
}

/// OpenAI-compatible vLLM completion server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VllmSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0 and 2"))]
    pub temperature: f64,

    #[serde(default = "default_max_new_tokens")]
    #[validate(range(min = 1, message = "max_new_tokens must be at least 1"))]
    pub max_new_tokens: u32,

    /// Extra fields merged into every completion request
    #[serde(default)]
    pub additional_model_kwargs: serde_json::Map<String, serde_json::Value>,
}

/// LLM settings, discriminated by `provider`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum LlmSettings {
    #[serde(rename = "HuggingFaceTextGenInference")]
    Tgi(TgiSettings),
    #[serde(rename = "AzureOpenAI")]
    AzureOpenAi(AzureOpenAiLlmSettings),
    #[serde(rename = "Vllm")]
    Vllm(VllmSettings),
}

impl LlmSettings {
    /// Parse and validate settings from a raw configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_discriminator::<LlmProvider>(&value, "provider")?;
        parse_validated(value)
    }

    pub fn provider(&self) -> LlmProvider {
        match self {
            Self::Tgi(_) => LlmProvider::Tgi,
            Self::AzureOpenAi(_) => LlmProvider::AzureOpenAi,
            Self::Vllm(_) => LlmProvider::Vllm,
        }
    }

    pub fn temperature(&self) -> f64 {
        match self {
            Self::Tgi(s) => s.temperature,
            Self::AzureOpenAi(s) => s.temperature,
            Self::Vllm(s) => s.temperature,
        }
    }
}

impl Validate for LlmSettings {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::Tgi(s) => s.validate(),
            Self::AzureOpenAi(s) => s.validate(),
            Self::Vllm(s) => s.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tgi(temperature: serde_json::Value) -> serde_json::Value {
        json!({
            "provider": "HuggingFaceTextGenInference",
            "api_base": "http://tgi:8080",
            "temperature": temperature
        })
    }

    #[test]
    fn test_temperature_bounds_are_inclusive() {
        assert!(LlmSettings::from_value(tgi(json!(0))).is_ok());
        assert!(LlmSettings::from_value(tgi(json!(2.0))).is_ok());

        let err = LlmSettings::from_value(tgi(json!(3.0))).unwrap_err();
        assert_eq!(err.field(), Some("temperature"));

        let err = LlmSettings::from_value(tgi(json!(-0.1))).unwrap_err();
        assert_eq!(err.field(), Some("temperature"));
    }

    #[test]
    fn test_tgi_defaults() {
        let settings = LlmSettings::from_value(json!({
            "provider": "HuggingFaceTextGenInference",
            "api_base": "http://tgi:8080"
        }))
        .unwrap();

        assert_eq!(settings.temperature(), 0.5);
        let LlmSettings::Tgi(tgi) = settings else {
            panic!("Expected TGI settings");
        };
        assert_eq!(tgi.repetition_penalty, 1.0);
        assert_eq!(tgi.max_new_tokens, 256);
        assert!(!tgi.streaming);
    }

    #[test]
    fn test_vllm_kwargs_default_to_empty() {
        let settings = LlmSettings::from_value(json!({
            "provider": "Vllm",
            "api_base": "http://vllm:8000",
            "model": "Qwen/Qwen2-7B-Instruct"
        }))
        .unwrap();

        let LlmSettings::Vllm(vllm) = settings else {
            panic!("Expected vLLM settings");
        };
        assert!(vllm.additional_model_kwargs.is_empty());
        assert_eq!(vllm.max_new_tokens, 256);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = LlmSettings::from_value(json!({"provider": "Unknown", "api_base": "http://x"}))
            .unwrap_err();
        assert_eq!(err.field(), Some("provider"));
    }

    #[test]
    fn test_all_providers_roundtrip() {
        for provider in LlmProvider::ALL {
            assert_eq!(provider.as_str().parse::<LlmProvider>().unwrap(), *provider);
        }
    }
}
