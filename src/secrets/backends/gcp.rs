//! GCP Secret Manager store
//!
//! Fetches secret payloads from Google Cloud Secret Manager.
//!
//! ## Project id
//!
//! [`resolve_project_id`] picks, in order:
//! - the explicitly configured id (`GCP_PROJECT_ID`)
//! - `GOOGLE_CLOUD_PROJECT` or `GCLOUD_PROJECT`
//! - `project_id` / `quota_project_id` of the file named by
//!   `GOOGLE_APPLICATION_CREDENTIALS`
//!
//! ## Reference Format
//!
//! - Short form: `my-secret` (configured project, latest version)
//! - Versioned: `my-secret@v3` or `my-secret@latest`
//! - Full path: `projects/my-project/secrets/my-secret/versions/latest`

use crate::errors::{Error, Result};
use serde::Deserialize;

#[cfg(feature = "gcp")]
use super::backend::{SecretBackendType, SecretStore};
#[cfg(feature = "gcp")]
use crate::secrets::SecretValue;
#[cfg(feature = "gcp")]
use async_trait::async_trait;
#[cfg(feature = "gcp")]
use tracing::{debug, error, info};

#[cfg(feature = "gcp")]
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};

/// Fields of a credentials file that can carry a project id
#[derive(Debug, Deserialize)]
struct CredentialsProject {
    project_id: Option<String>,
    quota_project_id: Option<String>,
}

/// Determine the GCP project to read secrets from.
///
/// Fails with [`Error::Config`] before any network call when no source
/// provides a project id.
pub fn resolve_project_id(explicit: Option<&str>) -> Result<String> {
    if let Some(project_id) = explicit.filter(|id| !id.trim().is_empty()) {
        return Ok(project_id.to_string());
    }

    for var in ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Some(project_id) = std::env::var(var).ok().filter(|id| !id.trim().is_empty()) {
            return Ok(project_id);
        }
    }

    if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::config_with_source(
                format!("Failed to read GCP credentials file '{}'", path),
                Box::new(e),
            )
        })?;
        let credentials: CredentialsProject = serde_json::from_str(&contents).map_err(|e| {
            Error::config_with_source(
                format!("Invalid GCP credentials file '{}'", path),
                Box::new(e),
            )
        })?;
        if let Some(project_id) = credentials.project_id.or(credentials.quota_project_id) {
            return Ok(project_id);
        }
    }

    Err(Error::config(
        "GCP project id not found. Set GCP_PROJECT_ID or GOOGLE_CLOUD_PROJECT, or point \
         GOOGLE_APPLICATION_CREDENTIALS at a file with a project_id",
    ))
}

/// Build the full secret version resource name
///
/// - `my-secret` -> `projects/{project}/secrets/my-secret/versions/latest`
/// - `my-secret@v3` -> `projects/{project}/secrets/my-secret/versions/3`
/// - `projects/...` -> used as-is
pub fn build_resource_name(project_id: &str, reference: &str) -> String {
    if reference.starts_with("projects/") {
        return reference.to_string();
    }

    let (secret_name, version) = match reference.rsplit_once('@') {
        Some((name, ver)) => (name, ver.strip_prefix('v').unwrap_or(ver)),
        None => (reference, "latest"),
    };

    format!("projects/{}/secrets/{}/versions/{}", project_id, secret_name, version)
}

/// GCP Secret Manager client
///
/// Authenticates with the service account key named by
/// `GOOGLE_APPLICATION_CREDENTIALS`.
#[cfg(feature = "gcp")]
pub struct GcpSecretManagerClient {
    hub: SecretManager<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    >,
    project_id: String,
}

#[cfg(feature = "gcp")]
impl std::fmt::Debug for GcpSecretManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSecretManagerClient")
            .field("project_id", &self.project_id)
            .field("hub", &"[SecretManager]")
            .finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpSecretManagerClient {
    /// Create a client for the given project
    pub async fn new(project_id: impl Into<String>) -> Result<Self> {
        let project_id = project_id.into();

        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            Error::config_with_source("Failed to load native TLS roots", Box::new(e))
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        let credentials_path = std::env::var("GOOGLE_APPLICATION_CREDENTIALS").map_err(|_| {
            Error::config(
                "GOOGLE_APPLICATION_CREDENTIALS must name a service account key to read GCP secrets",
            )
        })?;
        let key = yup_oauth2::read_service_account_key(&credentials_path).await.map_err(|e| {
            Error::config_with_source(
                format!("Failed to read GCP credentials from '{}'", credentials_path),
                Box::new(e),
            )
        })?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key).build().await.map_err(
            |e| Error::config_with_source("Failed to build GCP authenticator", Box::new(e)),
        )?;

        let hub = SecretManager::new(client, auth);

        info!(project_id = %project_id, "Initialized GCP Secret Manager client");

        Ok(Self { hub, project_id })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[cfg(feature = "gcp")]
#[async_trait]
impl SecretStore for GcpSecretManagerClient {
    async fn get_secret(&self, secret_name: &str) -> Result<Option<SecretValue>> {
        let resource_name = build_resource_name(&self.project_id, secret_name);

        debug!(
            secret_name = %secret_name,
            resource_name = %resource_name,
            "Fetching secret from GCP Secret Manager"
        );

        let (_, response) =
            self.hub.projects().secrets_versions_access(&resource_name).doit().await.map_err(
                |e| {
                    error!(
                        secret_name = %secret_name,
                        resource_name = %resource_name,
                        error = %e,
                        "Failed to fetch secret from GCP Secret Manager"
                    );
                    Error::secret_backend(self.backend_type().as_str(), secret_name, e)
                },
            )?;

        let data = response.payload.and_then(|payload| payload.data).unwrap_or_default();
        if data.is_empty() {
            return Ok(None);
        }

        let payload = String::from_utf8(data).map_err(|e| {
            Error::secret_backend(self.backend_type().as_str(), secret_name, e)
        })?;

        Ok(Some(SecretValue::from_payload(&payload)))
    }

    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::GcpSecretManager
    }
}
