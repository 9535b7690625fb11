//! Vector database settings.

use super::{check_discriminator, parse_validated};
use crate::errors::{CapabilityKind, Result};
use crate::secrets::SecretReference;
use serde::{Deserialize, Serialize};
use validator::Validate;

provider_enum! {
    /// Vector stores a [`VectorDbSettings`] can point at
    VectorDbProvider: CapabilityKind::VectorDb => {
        OpenSearch => "OPENSEARCH",
        PgVector => "PGVECTOR",
    }
}

fn default_sslmode() -> String {
    "require".to_string()
}

/// OpenSearch cluster settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OpenSearchSettings {
    /// Cluster URL
    #[validate(url(message = "db_url must be a valid URL"))]
    pub db_url: String,

    /// Index name
    #[serde(default)]
    pub index: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub username: Option<SecretReference>,

    #[serde(default)]
    #[validate(nested)]
    pub password: Option<SecretReference>,

    pub use_ssl: bool,

    pub verify_certs: bool,
}

/// PostgreSQL + pgvector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PgVectorSettings {
    /// Database host, optionally `host:port`
    #[validate(length(min = 1, message = "db_url must not be empty"))]
    pub db_url: String,

    /// Name of the application owning the collection, stored in its metadata
    #[validate(length(min = 1, message = "namespace must not be empty"))]
    pub namespace: String,

    /// Collection name
    #[serde(default)]
    pub index: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub username: Option<SecretReference>,

    #[serde(default)]
    #[validate(nested)]
    pub password: Option<SecretReference>,

    #[serde(default)]
    pub db_name: Option<String>,

    /// libpq sslmode (`disable`, `prefer`, `require`, ...)
    #[serde(default = "default_sslmode")]
    #[validate(length(min = 1, message = "sslmode must not be empty"))]
    pub sslmode: String,
}

/// Vector database settings, discriminated by `provider`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum VectorDbSettings {
    #[serde(rename = "OPENSEARCH")]
    OpenSearch(OpenSearchSettings),
    #[serde(rename = "PGVECTOR")]
    PgVector(PgVectorSettings),
}

impl VectorDbSettings {
    /// Parse and validate settings from a raw configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_discriminator::<VectorDbProvider>(&value, "provider")?;
        parse_validated(value)
    }

    pub fn provider(&self) -> VectorDbProvider {
        match self {
            Self::OpenSearch(_) => VectorDbProvider::OpenSearch,
            Self::PgVector(_) => VectorDbProvider::PgVector,
        }
    }

    /// Index or collection name, if configured
    pub fn index(&self) -> Option<&str> {
        match self {
            Self::OpenSearch(s) => s.index.as_deref(),
            Self::PgVector(s) => s.index.as_deref(),
        }
    }
}

impl Validate for VectorDbSettings {
    fn validate(&self) -> std::result::Result<(), validator::ValidationErrors> {
        match self {
            Self::OpenSearch(s) => s.validate(),
            Self::PgVector(s) => s.validate(),
        }
    }
}
