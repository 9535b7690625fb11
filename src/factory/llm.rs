//! Language model factories.

use super::resolve_secret;
use crate::domain::{AzureOpenAiLlmSettings, LlmProvider, LlmSettings, TgiSettings, VllmSettings};
use crate::errors::Result;
use crate::secrets::SecretResolver;
use crate::services::{AzureChatClient, LanguageModel, TextGenInferenceClient, VllmClient};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`LanguageModel`] client from provider settings
#[async_trait]
pub trait LlmFactory: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> LlmProvider;

    fn as_any(&self) -> &dyn Any;

    async fn get_model(&self) -> Result<Box<dyn LanguageModel>>;
}

/// HuggingFace Text Generation Inference
#[derive(Debug, Clone)]
pub struct TgiFactory {
    settings: TgiSettings,
    resolver: Arc<SecretResolver>,
}

impl TgiFactory {
    pub fn new(settings: TgiSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &TgiSettings {
        &self.settings
    }
}

#[async_trait]
impl LlmFactory for TgiFactory {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Tgi
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn LanguageModel>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(TextGenInferenceClient::new(
            &self.settings.api_base,
            api_key,
            self.settings.temperature,
            self.settings.repetition_penalty,
            self.settings.max_new_tokens,
            self.settings.streaming,
        )?))
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiLlmFactory {
    settings: AzureOpenAiLlmSettings,
    resolver: Arc<SecretResolver>,
}

impl AzureOpenAiLlmFactory {
    pub fn new(settings: AzureOpenAiLlmSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &AzureOpenAiLlmSettings {
        &self.settings
    }
}

#[async_trait]
impl LlmFactory for AzureOpenAiLlmFactory {
    fn provider(&self) -> LlmProvider {
        LlmProvider::AzureOpenAi
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn LanguageModel>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(AzureChatClient::new(
            &self.settings.api_base,
            &self.settings.deployment,
            &self.settings.api_version,
            self.settings.model.clone(),
            api_key,
            self.settings.temperature,
        )?))
    }
}

#[derive(Debug, Clone)]
pub struct VllmFactory {
    settings: VllmSettings,
    resolver: Arc<SecretResolver>,
}

impl VllmFactory {
    pub fn new(settings: VllmSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &VllmSettings {
        &self.settings
    }
}

#[async_trait]
impl LlmFactory for VllmFactory {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Vllm
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn LanguageModel>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(VllmClient::new(
            &self.settings.api_base,
            self.settings.model.clone(),
            api_key,
            self.settings.max_new_tokens,
            self.settings.temperature,
            self.settings.additional_model_kwargs.clone(),
        )?))
    }
}

/// Pick the LLM factory matching `settings.provider`
pub fn get_llm_factory(settings: LlmSettings, resolver: Arc<SecretResolver>) -> Box<dyn LlmFactory> {
    debug!(provider = %settings.provider(), "Selecting LLM factory");
    match settings {
        LlmSettings::Tgi(s) => Box::new(TgiFactory::new(s, resolver)),
        LlmSettings::AzureOpenAi(s) => Box::new(AzureOpenAiLlmFactory::new(s, resolver)),
        LlmSettings::Vllm(s) => Box::new(VllmFactory::new(s, resolver)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_tgi_model_keeps_temperature() {
        let settings = LlmSettings::from_value(json!({
            "provider": "HuggingFaceTextGenInference",
            "api_base": "http://tgi:8080",
            "temperature": 1.2
        }))
        .unwrap();

        let factory = get_llm_factory(settings, Arc::new(SecretResolver::default()));
        let model = factory.get_model().await.unwrap();
        assert_eq!(model.name(), "huggingface_tgi");
        assert_eq!(model.temperature(), 1.2);
    }

    #[tokio::test]
    async fn test_factory_does_not_mutate_settings() {
        let settings = LlmSettings::from_value(json!({
            "provider": "Vllm",
            "api_base": "http://vllm:8000/v1",
            "api_key": {"type": "Raw", "value": "k"},
            "additional_model_kwargs": {"top_p": 0.9}
        }))
        .unwrap();
        let LlmSettings::Vllm(expected) = settings.clone() else {
            panic!("Expected vLLM settings");
        };

        let factory = get_llm_factory(settings, Arc::new(SecretResolver::default()));
        factory.get_model().await.unwrap();
        factory.get_model().await.unwrap();

        let vllm = factory.as_any().downcast_ref::<VllmFactory>().unwrap();
        assert_eq!(vllm.settings(), &expected);
    }
}
