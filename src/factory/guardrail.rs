//! Guardrail parser factories.

use super::resolve_secret;
use crate::domain::{BloomzGuardrailSettings, GuardrailProvider, GuardrailSettings};
use crate::errors::Result;
use crate::secrets::SecretResolver;
use crate::services::{BloomzGuardrailParser, GuardrailParser};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Builds a [`GuardrailParser`] from provider settings
#[async_trait]
pub trait GuardrailFactory: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> GuardrailProvider;

    fn as_any(&self) -> &dyn Any;

    async fn get_parser(&self) -> Result<Box<dyn GuardrailParser>>;
}

#[derive(Debug, Clone)]
pub struct BloomzGuardrailFactory {
    settings: BloomzGuardrailSettings,
    resolver: Arc<SecretResolver>,
}

impl BloomzGuardrailFactory {
    pub fn new(settings: BloomzGuardrailSettings, resolver: Arc<SecretResolver>) -> Self {
        Self { settings, resolver }
    }

    pub fn settings(&self) -> &BloomzGuardrailSettings {
        &self.settings
    }
}

#[async_trait]
impl GuardrailFactory for BloomzGuardrailFactory {
    fn provider(&self) -> GuardrailProvider {
        GuardrailProvider::Bloomz
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_parser(&self) -> Result<Box<dyn GuardrailParser>> {
        let api_key = resolve_secret(&self.resolver, self.settings.api_key.as_ref()).await?;
        Ok(Box::new(BloomzGuardrailParser::new(
            &self.settings.api_base,
            self.settings.max_score,
            api_key,
        )?))
    }
}

/// Pick the guardrail factory matching `settings.provider`
pub fn get_guardrail_factory(
    settings: GuardrailSettings,
    resolver: Arc<SecretResolver>,
) -> Box<dyn GuardrailFactory> {
    debug!(provider = %settings.provider(), "Selecting guardrail factory");
    match settings {
        GuardrailSettings::Bloomz(s) => Box::new(BloomzGuardrailFactory::new(s, resolver)),
    }
}
