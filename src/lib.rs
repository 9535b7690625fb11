//! # genai-providers
//!
//! Configuration-driven factories for the providers a retrieval-augmented
//! generation service talks to: embedding models, LLMs, vector databases,
//! guardrails and document compressors.
//!
//! ## Architecture
//!
//! ```text
//! config file + env → AppSettings (validated, tagged on `provider`)
//!        ↓
//! get_<kind>_factory(settings, resolver) → concrete factory
//!        ↓
//! factory resolves SecretReferences → builds the client (Embeddings, VectorStore, ...)
//! ```
//!
//! Credentials in settings are [`SecretReference`]s: inline values, AWS
//! Secrets Manager, GCP Secret Manager or Kubernetes secret names. They are
//! resolved by a [`SecretResolver`] each time a factory builds a client.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use genai_providers::{config, get_vector_db_factory, init_tracing, Error, Result, SecretResolver};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = config::load()?;
//!     init_tracing(&settings.logging)?;
//!
//!     let (Some(db), Some(em)) = (settings.vector_db, settings.embedding) else {
//!         return Err(Error::config("vector_db and embedding sections are required"));
//!     };
//!     let resolver = Arc::new(SecretResolver::new(settings.secrets));
//!     let factory = get_vector_db_factory(db, em, resolver);
//!     let store = factory.get_vector_store().await?;
//!     let documents = store.similarity_search("How do I reset my password?", 4).await?;
//!     println!("{} documents", documents.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod factory;
pub mod observability;
pub mod secrets;
pub mod services;

// Re-export commonly used types and traits
pub use config::AppSettings;
pub use domain::{
    CompressorSettings, EmbeddingSettings, GuardrailSettings, LlmSettings, VectorDbSettings,
};
pub use errors::{CapabilityKind, Error, Result};
pub use factory::{
    get_compressor_factory, get_embedding_factory, get_guardrail_factory, get_llm_factory,
    get_vector_db_factory, CompressorFactory, EmbeddingFactory, GuardrailFactory, LlmFactory,
    VectorDbFactory,
};
pub use observability::init_tracing;
pub use secrets::{SecretReference, SecretResolver, SecretString, SecretValue};
pub use services::{
    Document, DocumentCompressor, Embeddings, GuardrailOutput, GuardrailParser, LanguageModel,
    VectorStore,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
