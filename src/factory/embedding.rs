//! Embedding model factories.

use super::resolve_secret;
use crate::domain::{
    AzureOpenAiEmbeddingSettings, BloomzEmbeddingSettings, EmbeddingProvider, EmbeddingSettings,
    VllmEmbeddingSettings,
};
use crate::errors::Result;
use crate::secrets::SecretResolver;
use crate::services::{BloomzEmbeddings, Embeddings, OpenAiCompatibleEmbeddings};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Builds an [`Embeddings`] client from provider settings
#[async_trait]
pub trait EmbeddingFactory: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> EmbeddingProvider;

    fn as_any(&self) -> &dyn Any;

    async fn get_model(&self) -> Result<Box<dyn Embeddings>>;
}

#[derive(Debug, Clone)]
pub struct BloomzEmbeddingFactory {
    settings: BloomzEmbeddingSettings,
    resolver: Arc<SecretResolver>,
}

impl BloomzEmbeddingFactory {
    pub fn new(settings: BloomzEmbeddingSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &BloomzEmbeddingSettings {
        &self.settings
    }
}

#[async_trait]
impl EmbeddingFactory for BloomzEmbeddingFactory {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::Bloomz
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn Embeddings>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(BloomzEmbeddings::new(
            &self.settings.api_base,
            self.settings.model.clone(),
            self.settings.pooling.clone(),
            api_key,
        )?))
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiEmbeddingFactory {
    settings: AzureOpenAiEmbeddingSettings,
    resolver: Arc<SecretResolver>,
}

impl AzureOpenAiEmbeddingFactory {
    pub fn new(settings: AzureOpenAiEmbeddingSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &AzureOpenAiEmbeddingSettings {
        &self.settings
    }
}

#[async_trait]
impl EmbeddingFactory for AzureOpenAiEmbeddingFactory {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::AzureOpenAi
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn Embeddings>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(OpenAiCompatibleEmbeddings::azure(
            &self.settings.api_base,
            &self.settings.deployment,
            &self.settings.api_version,
            self.settings.model.clone(),
            api_key,
        )?))
    }
}

#[derive(Debug, Clone)]
pub struct VllmEmbeddingFactory {
    settings: VllmEmbeddingSettings,
    resolver: Arc<SecretResolver>,
}

impl VllmEmbeddingFactory {
    pub fn new(settings: VllmEmbeddingSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &VllmEmbeddingSettings {
        &self.settings
    }
}

#[async_trait]
impl EmbeddingFactory for VllmEmbeddingFactory {
    fn provider(&self) -> EmbeddingProvider {
        EmbeddingProvider::Vllm
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_model(&self) -> Result<Box<dyn Embeddings>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(OpenAiCompatibleEmbeddings::vllm(
            &self.settings.api_base,
            self.settings.model.clone(),
            api_key,
        )?))
    }
}

/// Pick the embedding factory matching `settings.provider`
pub fn get_embedding_factory(
    settings: EmbeddingSettings,
    resolver: Arc<SecretResolver>,
) -> Box<dyn EmbeddingFactory> {
    debug!(provider = %settings.provider(), "Selecting embedding factory");
    match settings {
        EmbeddingSettings::Bloomz(s) => Box::new(BloomzEmbeddingFactory::new(s, resolver)),
        EmbeddingSettings::AzureOpenAi(s) => Box::new(AzureOpenAiEmbeddingFactory::new(s, resolver)),
        EmbeddingSettings::Vllm(s) => Box::new(VllmEmbeddingFactory::new(s, resolver)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_bloomz_factory_builds_client() {
        let settings = EmbeddingSettings::from_value(json!({
            "provider": "BloomzEmbeddings",
            "api_base": "http://bloomz",
            "api_key": {"type": "Raw", "value": "token"}
        }))
        .unwrap();

        let factory = get_embedding_factory(settings, Arc::new(SecretResolver::default()));
        assert_eq!(factory.provider(), EmbeddingProvider::Bloomz);

        let model = factory.get_model().await.unwrap();
        assert_eq!(model.name(), "bloomz_embeddings");
    }

    #[tokio::test]
    async fn test_unresolvable_key_fails_build() {
        let settings = EmbeddingSettings::from_value(json!({
            "provider": "Vllm",
            "api_base": "http://vllm:8000/v1",
            "model": "e5",
            "api_key": {"type": "KubeSecret", "secret_name": "vllm-key"}
        }))
        .unwrap();

        let factory = get_embedding_factory(settings, Arc::new(SecretResolver::default()));
        let err = factory.get_model().await.unwrap_err();
        assert!(matches!(err, crate::errors::Error::UnsupportedOperation { .. }));
    }
}
