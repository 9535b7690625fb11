//! Secret references and their resolution.
//!
//! Provider settings never carry credentials directly. Each credential field
//! is a [`SecretReference`] saying where the value lives:
//!
//! - **Raw**: the value itself, for development
//! - **AwsSecretsManager**: a secret name in AWS Secrets Manager
//! - **KubeSecret**: a Kubernetes secret name (accepted by the schema, not resolvable)
//! - **GcpSecretManager**: a secret name in GCP Secret Manager
//!
//! The [`SecretResolver`] turns references into [`SecretValue`]s when a
//! factory builds a client. Managed-store payloads that parse as JSON come
//! back structured; everything else comes back as redacted text.
//!
//! # Example
//!
//! ```rust,ignore
//! use genai_providers::secrets::{SecretReference, SecretResolver};
//!
//! let resolver = SecretResolver::from_env();
//! let reference = SecretReference::aws("PROD/App/openaiapi_key");
//! let api_key = resolver.resolve_plaintext(Some(&reference)).await?;
//! ```

pub mod backends;
pub mod reference;
pub mod resolver;
pub mod types;

pub use backends::{SecretBackendType, SecretStore};
pub use reference::{NamedSecret, RawSecret, SecretKind, SecretReference};
pub use resolver::SecretResolver;
pub use types::{SecretString, SecretValue};
