//! Secret resolution
//!
//! Turns a [`SecretReference`] into a value. Raw references resolve
//! immediately; AWS and GCP references go to a registered store or, when
//! the matching cargo feature is enabled, to a client built for the call.
//! Nothing is cached and every managed lookup is exactly one fetch.

use super::backends::{resolve_project_id, SecretBackendType, SecretStore};
use super::{SecretReference, SecretValue};
use crate::config::ResolverConfig;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves secret references against the configured stores
pub struct SecretResolver {
    config: ResolverConfig,
    stores: HashMap<SecretBackendType, Arc<dyn SecretStore>>,
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("config", &self.config)
            .field("stores", &self.stores.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SecretResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl SecretResolver {
    /// Create a resolver with no registered stores
    pub fn new(config: ResolverConfig) -> Self {
        Self { config, stores: HashMap::new() }
    }

    /// Create a resolver configured from the environment (`GCP_PROJECT_ID`)
    pub fn from_env() -> Self {
        Self::new(ResolverConfig::from_env())
    }

    /// Register a store; it replaces any store of the same type
    pub fn register(&mut self, store: Arc<dyn SecretStore>) {
        let backend_type = store.backend_type();
        info!(backend_type = %backend_type, "Registering secret store");
        self.stores.insert(backend_type, store);
    }

    /// Builder form of [`SecretResolver::register`]
    pub fn with_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.register(store);
        self
    }

    pub fn has_store(&self, backend_type: SecretBackendType) -> bool {
        self.stores.contains_key(&backend_type)
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a reference to its value.
    ///
    /// `Ok(None)` means the store holds the secret but it has no payload.
    pub async fn resolve(&self, reference: &SecretReference) -> Result<Option<SecretValue>> {
        debug!(
            kind = %reference.kind(),
            secret_name = reference.secret_name().unwrap_or("-"),
            "Resolving secret"
        );

        let value = match reference {
            SecretReference::Raw(raw) => return Ok(Some(SecretValue::Text(raw.value.clone()))),
            SecretReference::KubernetesSecret(secret) => {
                return Err(Error::unsupported_operation(format!(
                    "resolving Kubernetes secret '{}'",
                    secret.secret_name
                )))
            }
            SecretReference::AwsSecretsManager(secret) => self.fetch_aws(&secret.secret_name).await?,
            SecretReference::GcpSecretManager(secret) => self.fetch_gcp(&secret.secret_name).await?,
        };

        if value.is_none() {
            warn!(
                kind = %reference.kind(),
                secret_name = reference.secret_name().unwrap_or("-"),
                "Secret has no payload"
            );
        }
        Ok(value)
    }

    /// Resolve an optional reference to the plaintext a client needs.
    pub async fn resolve_plaintext(
        &self,
        reference: Option<&SecretReference>,
    ) -> Result<Option<String>> {
        let Some(reference) = reference else {
            return Ok(None);
        };
        Ok(self.resolve(reference).await?.map(|value| value.into_plaintext().into_inner()))
    }

    async fn fetch_aws(&self, secret_name: &str) -> Result<Option<SecretValue>> {
        if let Some(store) = self.stores.get(&SecretBackendType::AwsSecretsManager) {
            return store.get_secret(secret_name).await;
        }
        default_aws_fetch(secret_name).await
    }

    async fn fetch_gcp(&self, secret_name: &str) -> Result<Option<SecretValue>> {
        if let Some(store) = self.stores.get(&SecretBackendType::GcpSecretManager) {
            return store.get_secret(secret_name).await;
        }
        let project_id = resolve_project_id(self.config.gcp_project_id.as_deref())?;
        default_gcp_fetch(&project_id, secret_name).await
    }
}

#[cfg(feature = "aws")]
async fn default_aws_fetch(secret_name: &str) -> Result<Option<SecretValue>> {
    let client = super::backends::AwsSecretsManagerClient::from_env().await;
    client.get_secret(secret_name).await
}

#[cfg(not(feature = "aws"))]
async fn default_aws_fetch(secret_name: &str) -> Result<Option<SecretValue>> {
    Err(Error::unsupported_operation(format!(
        "resolving AWS secret '{}' (built without the `aws` feature and no store registered)",
        secret_name
    )))
}

#[cfg(feature = "gcp")]
async fn default_gcp_fetch(project_id: &str, secret_name: &str) -> Result<Option<SecretValue>> {
    let client = super::backends::GcpSecretManagerClient::new(project_id).await?;
    client.get_secret(secret_name).await
}

#[cfg(not(feature = "gcp"))]
async fn default_gcp_fetch(project_id: &str, secret_name: &str) -> Result<Option<SecretValue>> {
    Err(Error::unsupported_operation(format!(
        "resolving GCP secret '{}' in project '{}' (built without the `gcp` feature and no store registered)",
        secret_name, project_id
    )))
}
