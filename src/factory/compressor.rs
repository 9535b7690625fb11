//! Document compressor factories.

use super::resolve_secret;
use crate::domain::{BloomzCompressorSettings, CompressorProvider, CompressorSettings};
use crate::errors::Result;
use crate::secrets::SecretResolver;
use crate::services::{BloomzRerank, DocumentCompressor};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`DocumentCompressor`] from provider settings
#[async_trait]
pub trait CompressorFactory: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> CompressorProvider;

    fn as_any(&self) -> &dyn Any;

    async fn get_compressor(&self) -> Result<Box<dyn DocumentCompressor>>;
}

#[derive(Debug, Clone)]
pub struct BloomzCompressorFactory {
    settings: BloomzCompressorSettings,
    resolver: Arc<SecretResolver>,
}

impl BloomzCompressorFactory {
    pub fn new(settings: BloomzCompressorSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &BloomzCompressorSettings {
        &self.settings
    }
}

#[async_trait]
impl CompressorFactory for BloomzCompressorFactory {
    fn provider(&self) -> CompressorProvider {
        CompressorProvider::Bloomz
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_compressor(&self) -> Result<Box<dyn DocumentCompressor>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(BloomzRerank::new(
            &self.settings.endpoint,
            self.settings.min_score,
            self.settings.max_documents,
            self.settings.label.clone(),
            api_key,
        )?))
    }
}

/// Pick the compressor factory matching `settings.provider`
pub fn get_compressor_factory(
    settings: CompressorSettings,
    resolver: Arc<SecretResolver>,
) -> Box<dyn CompressorFactory> {
    debug!(provider = %settings.provider(), "Selecting compressor factory");
    match settings {
        CompressorSettings::Bloomz(s) => Box::new(BloomzCompressorFactory::new(s, resolver)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_compressor_from_settings() {
        let settings = CompressorSettings::from_value(json!({
            "provider": "BloomzRerank",
            "endpoint": "http://rerank:8000",
            "min_score": 0.6
        }))
        .unwrap();

        let factory = get_compressor_factory(settings, Arc::new(SecretResolver::default()));
        assert_eq!(factory.provider(), CompressorProvider::Bloomz);

        let compressor = factory.get_compressor().await.unwrap();
        assert_eq!(compressor.name(), "bloomz_rerank");
        assert!(compressor.compress_documents(Vec::new(), "query").await.unwrap().is_empty());
    }
}
