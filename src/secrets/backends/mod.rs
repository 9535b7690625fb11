//! External secret stores
//!
//! Settings only ever hold REFERENCES to secrets; the stores here fetch the
//! values on demand when a factory builds a client.
//!
//! ## Supported Backends
//!
//! - **AWS Secrets Manager**: (Optional `aws` feature)
//! - **GCP Secret Manager**: (Optional `gcp` feature)

pub mod aws;
pub mod backend;
pub mod gcp;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManagerClient;
pub use backend::{SecretBackendType, SecretStore};
#[cfg(feature = "gcp")]
pub use gcp::GcpSecretManagerClient;
pub use gcp::{build_resource_name, resolve_project_id};
