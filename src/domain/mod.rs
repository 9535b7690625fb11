//! Provider settings for every capability kind.
//!
//! Each kind is a serde enum tagged on `provider`, one variant per provider,
//! with a `validator`-checked struct behind every variant. Raw configuration
//! maps go through `from_value`, which checks the discriminator first, then
//! the variant's fields, bounds and defaults, and reports the offending field
//! in [`Error::Validation`].

use crate::errors::{Error, Result};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use validator::Validate;

/// Declares a provider enum with its wire tags.
///
/// Generates `ALL`, `as_str`, `FromStr` (unknown tags become
/// [`Error::UnsupportedProvider`]), `Display` and serde impls.
macro_rules! provider_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $kind:expr => {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            /// Every provider of this kind
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire tag of this provider
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::Error;

            fn from_str(s: &str) -> $crate::errors::Result<Self> {
                match s {
                    $($tag => Ok($name::$variant),)+
                    other => Err($crate::errors::Error::unsupported_provider($kind.as_str(), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod compressor;
pub mod embedding;
pub mod guardrail;
pub mod llm;
pub mod vector_db;

pub use compressor::{BloomzCompressorSettings, CompressorProvider, CompressorSettings};
pub use embedding::{
    AzureOpenAiEmbeddingSettings, BloomzEmbeddingSettings, EmbeddingProvider, EmbeddingSettings,
    VllmEmbeddingSettings,
};
pub use guardrail::{BloomzGuardrailSettings, GuardrailProvider, GuardrailSettings};
pub use llm::{AzureOpenAiLlmSettings, LlmProvider, LlmSettings, TgiSettings, VllmSettings};
pub use vector_db::{OpenSearchSettings, PgVectorSettings, VectorDbProvider, VectorDbSettings};

/// Check the discriminator of a raw settings map before anything else.
///
/// A missing, non-string or unknown tag is a validation failure on `tag`.
pub(crate) fn check_discriminator<P>(value: &serde_json::Value, tag: &'static str) -> Result<P>
where
    P: FromStr<Err = Error>,
{
    let raw = value
        .get(tag)
        .ok_or_else(|| Error::validation_field(format!("missing field `{}`", tag), tag))?;
    let raw = raw
        .as_str()
        .ok_or_else(|| Error::validation_field(format!("`{}` must be a string", tag), tag))?;
    raw.parse::<P>().map_err(|e| match e {
        Error::Validation { message, .. } => Error::validation_field(message, tag),
        other => Error::validation_field(other.to_string(), tag),
    })
}

/// Deserialize a value and run its `validator` rules.
pub(crate) fn parse_validated<T>(value: serde_json::Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value).map_err(deserialization_error)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Map a serde failure to a validation error, naming the field when serde does.
fn deserialization_error(error: serde_json::Error) -> Error {
    let message = error.to_string();
    let field = if let Some(rest) = message.strip_prefix("missing field `") {
        rest.split('`').next().map(str::to_string)
    } else if message.starts_with("unknown variant") {
        // Provider tags are checked up front, so the only tagged enums left
        // to fail here are nested secret references.
        Some("type".to_string())
    } else {
        None
    };

    Error::Validation { message, field }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialization_error_names_missing_field() {
        let err = serde_json::from_value::<vector_db::OpenSearchSettings>(json!({}))
            .map_err(deserialization_error)
            .unwrap_err();
        assert_eq!(err.field(), Some("db_url"));
    }

    #[test]
    fn test_check_discriminator() {
        let provider: LlmProvider =
            check_discriminator(&json!({"provider": "Vllm"}), "provider").unwrap();
        assert_eq!(provider, LlmProvider::Vllm);

        let err = check_discriminator::<LlmProvider>(&json!({}), "provider").unwrap_err();
        assert_eq!(err.field(), Some("provider"));

        let err =
            check_discriminator::<LlmProvider>(&json!({"provider": 3}), "provider").unwrap_err();
        assert_eq!(err.field(), Some("provider"));

        let err = check_discriminator::<LlmProvider>(&json!({"provider": "Unknown"}), "provider")
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(err.to_string().contains("Unknown"));
    }
}
