//! # Configuration Settings
//!
//! Defines the configuration structure for an application using the provider
//! layer: one optional settings section per capability kind, plus secret
//! resolution and logging.

use crate::domain::{
    CompressorSettings, EmbeddingSettings, GuardrailSettings, LlmSettings, VectorDbSettings,
};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Environment variable naming the GCP project that holds managed secrets
pub const GCP_PROJECT_ID_ENV: &str = "GCP_PROJECT_ID";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    pub vector_db: Option<VectorDbSettings>,
    pub embedding: Option<EmbeddingSettings>,
    pub llm: Option<LlmSettings>,
    pub guardrail: Option<GuardrailSettings>,
    pub compressor: Option<CompressorSettings>,

    /// Secret resolution configuration
    #[serde(default)]
    pub secrets: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppSettings {
    /// Build settings from a raw configuration map.
    ///
    /// Every present section is parsed and validated; a failure names the
    /// section and field (`embedding.api_base`).
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::validation(format!(
                    "configuration root must be a map, got {}",
                    other
                )))
            }
        };

        let settings = Self {
            vector_db: section(&mut map, "vector_db", VectorDbSettings::from_value)?,
            embedding: section(&mut map, "embedding", EmbeddingSettings::from_value)?,
            llm: section(&mut map, "llm", LlmSettings::from_value)?,
            guardrail: section(&mut map, "guardrail", GuardrailSettings::from_value)?,
            compressor: section(&mut map, "compressor", CompressorSettings::from_value)?,
            secrets: section(&mut map, "secrets", parse_plain::<ResolverConfig>)?
                .unwrap_or_default(),
            logging: section(&mut map, "logging", parse_plain::<LoggingConfig>)?
                .unwrap_or_default(),
        };

        Ok(settings)
    }

    /// Validate the sections that are present
    pub fn validate(&self) -> Result<()> {
        if let Some(vector_db) = &self.vector_db {
            Validate::validate(vector_db).map_err(|e| prefixed("vector_db", e.into()))?;
        }
        if let Some(embedding) = &self.embedding {
            Validate::validate(embedding).map_err(|e| prefixed("embedding", e.into()))?;
        }
        if let Some(llm) = &self.llm {
            Validate::validate(llm).map_err(|e| prefixed("llm", e.into()))?;
        }
        if let Some(guardrail) = &self.guardrail {
            Validate::validate(guardrail).map_err(|e| prefixed("guardrail", e.into()))?;
        }
        if let Some(compressor) = &self.compressor {
            Validate::validate(compressor).map_err(|e| prefixed("compressor", e.into()))?;
        }
        Validate::validate(&self.logging).map_err(|e| prefixed("logging", e.into()))?;
        Ok(())
    }

    /// Fill unset values from the process environment
    pub(crate) fn apply_env_fallbacks(&mut self) {
        if self.secrets.gcp_project_id.is_none() {
            self.secrets.gcp_project_id = ResolverConfig::from_env().gcp_project_id;
        }
    }
}

/// Secret resolution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, Default)]
pub struct ResolverConfig {
    /// GCP project holding managed secrets; other discovery sources apply when unset
    #[serde(default)]
    pub gcp_project_id: Option<String>,
}

impl ResolverConfig {
    /// Read `GCP_PROJECT_ID` from the environment
    pub fn from_env() -> Self {
        Self {
            gcp_project_id: std::env::var(GCP_PROJECT_ID_ENV)
                .ok()
                .filter(|id| !id.trim().is_empty()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    /// Enable JSON structured logging
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn section<T>(
    map: &mut Map<String, Value>,
    name: &'static str,
    parse: impl FnOnce(Value) -> Result<T>,
) -> Result<Option<T>> {
    match map.remove(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse(value).map(Some).map_err(|e| prefixed(name, e)),
    }
}

fn parse_plain<T>(value: Value) -> Result<T>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value)
        .map_err(|e| Error::Validation { message: e.to_string(), field: None })?;
    parsed.validate()?;
    Ok(parsed)
}

/// Qualify a validation error's field with its section name
fn prefixed(section: &str, error: Error) -> Error {
    match error {
        Error::Validation { message, field } => Error::Validation {
            message: format!("{}: {}", section, message),
            field: Some(match field {
                Some(field) => format!("{}.{}", section, field),
                None => section.to_string(),
            }),
        },
        other => other,
    }
}
