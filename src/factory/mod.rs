//! Capability factories
//!
//! One factory trait per capability kind, one concrete factory per provider,
//! and a dispatcher per kind that picks the factory from validated settings.
//! Factories hold their settings plus a shared [`SecretResolver`] and resolve
//! secret references every time they build a client.

pub mod compressor;
pub mod embedding;
pub mod guardrail;
pub mod llm;
pub mod vector_db;

pub use compressor::{get_compressor_factory, BloomzCompressorFactory, CompressorFactory};
pub use embedding::{
    get_embedding_factory, AzureOpenAiEmbeddingFactory, BloomzEmbeddingFactory, EmbeddingFactory,
    VllmEmbeddingFactory,
};
pub use guardrail::{get_guardrail_factory, BloomzGuardrailFactory, GuardrailFactory};
pub use llm::{get_llm_factory, AzureOpenAiLlmFactory, LlmFactory, TgiFactory, VllmFactory};
pub use vector_db::{
    get_vector_db_factory, OpenSearchFactory, PgVectorFactory, VectorDbFactory,
    DEFAULT_PGVECTOR_COLLECTION,
};

use crate::errors::Result;
use crate::secrets::{SecretReference, SecretResolver, SecretString};

/// Resolve an optional secret reference into a redacted string for a client
pub(crate) async fn resolve_secret(
    resolver: &SecretResolver,
    reference: Option<&SecretReference>,
) -> Result<Option<SecretString>> {
    Ok(resolver.resolve_plaintext(reference).await?.map(SecretString::new))
}
