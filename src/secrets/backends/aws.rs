//! AWS Secrets Manager store
//!
//! Fetches `SecretString` payloads with `GetSecretValue`. Credentials and
//! region come from the standard AWS provider chain (`AWS_REGION`,
//! `AWS_PROFILE`, instance metadata, ...).

#[cfg(feature = "aws")]
use super::backend::{SecretBackendType, SecretStore};
#[cfg(feature = "aws")]
use crate::errors::{Error, Result};
#[cfg(feature = "aws")]
use crate::secrets::SecretValue;
#[cfg(feature = "aws")]
use async_trait::async_trait;
#[cfg(feature = "aws")]
use tracing::{debug, error};

/// AWS Secrets Manager client
#[cfg(feature = "aws")]
#[derive(Debug, Clone)]
pub struct AwsSecretsManagerClient {
    client: aws_sdk_secretsmanager::Client,
}

#[cfg(feature = "aws")]
impl AwsSecretsManagerClient {
    /// Build a client from the ambient AWS configuration
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self { client: aws_sdk_secretsmanager::Client::new(&config) }
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl SecretStore for AwsSecretsManagerClient {
    async fn get_secret(&self, secret_name: &str) -> Result<Option<SecretValue>> {
        debug!(secret_name = %secret_name, "Fetching secret from AWS Secrets Manager");

        let output =
            self.client.get_secret_value().secret_id(secret_name).send().await.map_err(|e| {
                error!(
                    secret_name = %secret_name,
                    error = %e,
                    "Failed to fetch secret from AWS Secrets Manager"
                );
                Error::secret_backend(self.backend_type().as_str(), secret_name, e)
            })?;

        // Binary-only and empty secrets have no text payload
        Ok(output
            .secret_string()
            .filter(|payload| !payload.is_empty())
            .map(SecretValue::from_payload))
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::AwsSecretsManager
    }
}
