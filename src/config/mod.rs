//! # Configuration Management
//!
//! Loads [`AppSettings`] with the `config` crate: an optional settings file
//! (TOML, YAML or JSON) layered under `GENAI__`-prefixed environment
//! variables, after `.env` has been read by `dotenvy`.
//!
//! Nested keys use a double underscore:
//!
//! ```text
//! GENAI__EMBEDDING__PROVIDER=BloomzEmbeddings
//! GENAI__EMBEDDING__API_BASE=http://bloomz:8080
//! GENAI__EMBEDDING__API_KEY__TYPE=GcpSecretManager
//! GENAI__EMBEDDING__API_KEY__SECRET_NAME=bloomz-api-key
//! ```

pub mod settings;

pub use settings::{AppSettings, LoggingConfig, ResolverConfig, GCP_PROJECT_ID_ENV};

use crate::errors::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Settings file read by [`load`] when `GENAI_CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "config/genai";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "GENAI";

/// Load settings from the default locations
///
/// The file named by `GENAI_CONFIG_FILE` must exist when the variable is set;
/// otherwise `config/genai.*` is read if present.
pub fn load() -> Result<AppSettings> {
    report_dotenv(dotenvy::dotenv());

    match std::env::var("GENAI_CONFIG_FILE") {
        Ok(path) => load_from(Some(Path::new(&path))),
        Err(_) => load_from(None),
    }
}

/// A missing `.env` is normal; anything else leaves the environment partial.
fn report_dotenv<T>(result: dotenvy::Result<T>) {
    if let Err(e) = result {
        if !e.not_found() {
            warn!(error = %e, "Failed to load .env file");
        }
    }
}

/// Load settings from an explicit file, which must exist, plus the environment
pub fn load_from(path: Option<&Path>) -> Result<AppSettings> {
    let file = match path {
        Some(path) => ::config::File::from(path).required(true),
        None => ::config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let raw = ::config::Config::builder()
        .add_source(file)
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
        )
        .build()?
        .try_deserialize::<serde_json::Value>()?;

    let mut settings = AppSettings::from_value(raw)?;
    settings.apply_env_fallbacks();

    debug!(
        vector_db = settings.vector_db.as_ref().map(|s| s.provider().as_str()),
        embedding = settings.embedding.as_ref().map(|s| s.provider().as_str()),
        llm = settings.llm.as_ref().map(|s| s.provider().as_str()),
        guardrail = settings.guardrail.as_ref().map(|s| s.provider().as_str()),
        compressor = settings.compressor.as_ref().map(|s| s.provider().as_str()),
        "Loaded provider settings"
    );

    Ok(settings)
}
