//! Secret references carried inside provider settings.
//!
//! A reference names where a credential lives instead of holding it. The
//! wire form is tagged on `type`:
//!
//! ```json
//! { "type": "Raw", "value": "145d-ff455g-e4r5gf" }
//! { "type": "AwsSecretsManager", "secret_name": "PROD/App/openaiapi_key" }
//! { "type": "KubeSecret", "secret_name": "openaiapi_key" }
//! { "type": "GcpSecretManager", "secret_name": "openai-api-key" }
//! ```

use super::types::SecretString;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Discriminator of a [`SecretReference`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretKind {
    Raw,
    AwsSecretsManager,
    #[serde(rename = "KubeSecret", alias = "KubernetesSecret")]
    KubernetesSecret,
    GcpSecretManager,
}

impl SecretKind {
    /// Every kind, in declaration order
    pub const ALL: [SecretKind; 4] =
        [Self::Raw, Self::AwsSecretsManager, Self::KubernetesSecret, Self::GcpSecretManager];

    /// Wire representation of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "Raw",
            Self::AwsSecretsManager => "AwsSecretsManager",
            Self::KubernetesSecret => "KubeSecret",
            Self::GcpSecretManager => "GcpSecretManager",
        }
    }
}

impl FromStr for SecretKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Raw" => Ok(Self::Raw),
            "AwsSecretsManager" => Ok(Self::AwsSecretsManager),
            "KubeSecret" | "KubernetesSecret" => Ok(Self::KubernetesSecret),
            "GcpSecretManager" => Ok(Self::GcpSecretManager),
            _ => Err(Error::validation_field(format!("Unknown secret type: {}", s), "type")),
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secret held inline in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RawSecret {
    #[validate(custom(function = "validate_secret_not_empty"))]
    pub value: SecretString,
}

/// Secret stored in an external store under a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NamedSecret {
    #[validate(length(min = 1, message = "secret_name must not be empty"))]
    pub secret_name: String,
}

/// Indirect reference to a credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecretReference {
    /// The secret itself, inline
    Raw(RawSecret),
    /// A secret name in AWS Secrets Manager
    AwsSecretsManager(NamedSecret),
    /// A Kubernetes secret name
    #[serde(rename = "KubeSecret", alias = "KubernetesSecret")]
    KubernetesSecret(NamedSecret),
    /// A secret name in GCP Secret Manager
    GcpSecretManager(NamedSecret),
}

impl SecretReference {
    /// Inline secret
    pub fn raw(value: impl Into<String>) -> Self {
        Self::Raw(RawSecret { value: SecretString::new(value) })
    }

    /// AWS Secrets Manager reference
    pub fn aws(secret_name: impl Into<String>) -> Self {
        Self::AwsSecretsManager(NamedSecret { secret_name: secret_name.into() })
    }

    /// Kubernetes secret reference
    pub fn kubernetes(secret_name: impl Into<String>) -> Self {
        Self::KubernetesSecret(NamedSecret { secret_name: secret_name.into() })
    }

    /// GCP Secret Manager reference
    pub fn gcp(secret_name: impl Into<String>) -> Self {
        Self::GcpSecretManager(NamedSecret { secret_name: secret_name.into() })
    }

    /// Parse and validate a reference from configuration data
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        crate::domain::check_discriminator::<SecretKind>(&value, "type")?;
        crate::domain::parse_validated(value)
    }

    /// The discriminator of this reference
    pub fn kind(&self) -> SecretKind {
        match self {
            Self::Raw(_) => SecretKind::Raw,
            Self::AwsSecretsManager(_) => SecretKind::AwsSecretsManager,
            Self::KubernetesSecret(_) => SecretKind::KubernetesSecret,
            Self::GcpSecretManager(_) => SecretKind::GcpSecretManager,
        }
    }

    /// Name in the external store; `None` for inline secrets
    pub fn secret_name(&self) -> Option<&str> {
        match self {
            Self::Raw(_) => None,
            Self::AwsSecretsManager(named)
            | Self::KubernetesSecret(named)
            | Self::GcpSecretManager(named) => Some(&named.secret_name),
        }
    }
}

impl Validate for SecretReference {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::Raw(raw) => raw.validate(),
            Self::AwsSecretsManager(named)
            | Self::KubernetesSecret(named)
            | Self::GcpSecretManager(named) => named.validate(),
        }
    }
}

fn validate_secret_not_empty(
    value: &SecretString,
) -> std::result::Result<(), validator::ValidationError> {
    if value.is_empty() {
        let mut error = validator::ValidationError::new("length");
        error.message = Some("value must not be empty".into());
        return Err(error);
    }
    Ok(())
}
