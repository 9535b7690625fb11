//! # Error Types
//!
//! Error taxonomy for settings validation, secret resolution and capability
//! client construction, built on `thiserror`.

use std::fmt;

/// Custom result type for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error preserved verbatim from an external SDK
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the provider layer
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration failed schema validation
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A secret kind or backend exists in the schema but cannot be served
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// A provider tag that is not a member of its capability kind
    #[error("Unsupported {kind} provider: '{provider}'")]
    UnsupportedProvider { kind: &'static str, provider: String },

    /// Environment preconditions are not met
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A secret store reported a failure; the store's own error is the source
    #[error("Secret backend error ({backend}) for '{secret_name}': {source}")]
    SecretBackend {
        backend: &'static str,
        secret_name: String,
        #[source]
        source: BoxError,
    },

    /// HTTP transport errors from capability clients
    #[error("HTTP error: {context}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// A capability endpoint answered with a non-success status
    #[error("{service} responded with status {status}: {body}")]
    UpstreamStatus {
        service: String,
        status: u16,
        body: String,
    },

    /// Database errors from the pgvector store
    #[error("Database error: {context}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Serialization/deserialization errors outside of settings validation
    #[error("Serialization error: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation<S: Into<String>>(operation: S) -> Self {
        Self::UnsupportedOperation { operation: operation.into() }
    }

    /// Create an unsupported provider error
    pub fn unsupported_provider<S: Into<String>>(kind: &'static str, provider: S) -> Self {
        Self::UnsupportedProvider { kind, provider: provider.into() }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(message: S, source: BoxError) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Wrap a secret store failure without translating it
    pub fn secret_backend<N, E>(backend: &'static str, secret_name: N, source: E) -> Self
    where
        N: Into<String>,
        E: Into<BoxError>,
    {
        Self::SecretBackend { backend, secret_name: secret_name.into(), source: source.into() }
    }

    /// Create an HTTP error with context
    pub fn http<S: Into<String>>(context: S, source: reqwest::Error) -> Self {
        Self::Http { context: context.into(), source }
    }

    /// Create an upstream status error
    pub fn upstream_status<S: Into<String>, B: Into<String>>(service: S, status: u16, body: B) -> Self {
        Self::UpstreamStatus { service: service.into(), status, body: body.into() }
    }

    /// Field named by a validation error, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is worth retrying by the caller
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Database { source, .. } => {
                matches!(source, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
            }
            _ => false,
        }
    }
}

/// Capability kinds, used to label errors and log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    VectorDb,
    Embedding,
    Llm,
    Guardrail,
    Compressor,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorDb => "vector database",
            Self::Embedding => "embedding",
            Self::Llm => "LLM",
            Self::Guardrail => "guardrail",
            Self::Compressor => "compressor",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { context: "JSON serialization failed".to_string(), source: error }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::http("HTTP request failed", error)
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { context: "Database operation failed".to_string(), source: error }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(error: ::config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut flattened = Vec::new();
        flatten_validation_errors("", &errors, &mut flattened);

        let field = flattened.first().map(|(field, _)| field.clone());
        let message = flattened
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message: format!("Validation failed: {}", message), field }
    }
}

/// Walk nested validator errors into `(dotted.field, message)` pairs.
fn flatten_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, String)>,
) {
    use validator::ValidationErrorsKind;

    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string())
                    })
                    .collect();
                out.push((path, messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => flatten_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = Error::validation_field("must not be empty", "secret_name");
        assert!(matches!(error, Error::Validation { .. }));
        assert_eq!(error.field(), Some("secret_name"));
        assert_eq!(error.to_string(), "Validation error: must not be empty");
    }

    #[test]
    fn test_unsupported_provider_display() {
        let error = Error::unsupported_provider(CapabilityKind::Llm.as_str(), "Unknown");
        assert_eq!(error.to_string(), "Unsupported LLM provider: 'Unknown'");
    }

    #[test]
    fn test_secret_backend_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = Error::secret_backend("gcp_secret_manager", "db-password", source);

        let inner = std::error::Error::source(&error).expect("source is kept");
        let io = inner.downcast_ref::<std::io::Error>().expect("original type is kept");
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
        assert!(error.to_string().contains("db-password"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(Error::upstream_status("bloomz", 503, "busy").is_retryable());
        assert!(Error::upstream_status("bloomz", 429, "slow down").is_retryable());
        assert!(!Error::upstream_status("bloomz", 400, "bad").is_retryable());
        assert!(!Error::validation("test").is_retryable());
        assert!(!Error::unsupported_operation("kube").is_retryable());
    }

    #[test]
    fn test_error_conversions() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Serialization { .. }));
    }

    #[test]
    fn test_capability_kind_display() {
        assert_eq!(CapabilityKind::VectorDb.to_string(), "vector database");
        assert_eq!(CapabilityKind::Compressor.to_string(), "compressor");
    }
}
