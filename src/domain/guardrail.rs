//! Guardrail (toxicity scoring) settings.

use super::{check_discriminator, parse_validated};
use crate::errors::{CapabilityKind, Result};
use crate::secrets::SecretReference;
use serde::{Deserialize, Serialize};
use validator::Validate;

provider_enum! {
    GuardrailProvider: CapabilityKind::Guardrail => {
        Bloomz => "BloomzGuardrail",
    }
}

fn default_max_score() -> f64 {
    0.3
}

/// Bloomz guardrail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BloomzGuardrailSettings {
    #[validate(url(message = "api_base must be a valid URL"))]
    pub api_base: String,

    /// Highest acceptable toxicity score; anything above is flagged
    #[serde(default = "default_max_score")]
    pub max_score: f64,

    #[serde(default)]
    #[validate(nested)]
    pub api_key: Option<SecretReference>,
}

/// Guardrail settings, discriminated by `provider`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum GuardrailSettings {
    #[serde(rename = "BloomzGuardrail")]
    Bloomz(BloomzGuardrailSettings),
}

impl GuardrailSettings {
    /// Parse and validate settings from a raw configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_discriminator::<GuardrailProvider>(&value, "provider")?;
        parse_validated(value)
    }

    pub fn provider(&self) -> GuardrailProvider {
        match self {
            Self::Bloomz(_) => GuardrailProvider::Bloomz,
        }
    }
}

impl Validate for GuardrailSettings {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::Bloomz(s) => s.validate(),
        }
    }
}
