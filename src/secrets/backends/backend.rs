//! Secret store trait and types
//!
//! Defines the interface the resolver uses to fetch named secrets from an
//! external manager.

use crate::errors::{Error, Result};
use crate::secrets::SecretValue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of secret store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretBackendType {
    /// AWS Secrets Manager
    AwsSecretsManager,
    /// GCP Secret Manager
    GcpSecretManager,
}

impl SecretBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwsSecretsManager => "aws_secrets_manager",
            Self::GcpSecretManager => "gcp_secret_manager",
        }
    }
}

impl FromStr for SecretBackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aws_secrets_manager" => Ok(Self::AwsSecretsManager),
            "gcp_secret_manager" => Ok(Self::GcpSecretManager),
            _ => Err(Error::validation(format!("Unknown secret backend type: {}", s))),
        }
    }
}

impl fmt::Display for SecretBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for secret stores
///
/// Implementations must be Send + Sync for use in async contexts.
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// Fetch a secret by name
    ///
    /// Returns `Ok(None)` when the secret exists but carries no payload.
    /// Store failures are returned as [`Error::SecretBackend`] with the
    /// store's own error as the source.
    async fn get_secret(&self, secret_name: &str) -> Result<Option<SecretValue>>;

    /// Get the store type identifier
    fn backend_type(&self) -> SecretBackendType;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_roundtrip() {
        for bt in [SecretBackendType::AwsSecretsManager, SecretBackendType::GcpSecretManager] {
            let s = bt.as_str();
            let parsed: SecretBackendType = s.parse().unwrap();
            assert_eq!(bt, parsed);
        }
    }

    #[test]
    fn test_backend_type_display() {
        assert_eq!(SecretBackendType::AwsSecretsManager.to_string(), "aws_secrets_manager");
        assert_eq!(SecretBackendType::GcpSecretManager.to_string(), "gcp_secret_manager");
    }

    #[test]
    fn test_backend_type_serialization() {
        let json = serde_json::to_string(&SecretBackendType::GcpSecretManager).unwrap();
        assert_eq!(json, "\"gcp_secret_manager\"");

        let parsed: SecretBackendType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, SecretBackendType::GcpSecretManager);
    }

    #[test]
    fn test_unknown_backend_type() {
        assert!("vault".parse::<SecretBackendType>().is_err());
    }
}
