//! Provider clients
//!
//! Each capability kind has a trait here plus the concrete HTTP or
//! database-backed clients that the factories construct.

pub mod compressor;
pub mod documents;
pub mod embeddings;
pub mod guardrail;
pub(crate) mod http;
pub mod llm;
pub mod vector_store;

pub use compressor::{BloomzRerank, DocumentCompressor, LabelScore};
pub use documents::Document;
pub use embeddings::{BloomzEmbeddings, Embeddings, OpenAiCompatibleEmbeddings, AZURE_EMBEDDING_CHUNK_SIZE};
pub use guardrail::{BloomzGuardrailParser, GuardrailOutput, GuardrailParser};
pub use llm::{AzureChatClient, LanguageModel, TextGenInferenceClient, VllmClient};
pub use vector_store::{
    DistanceStrategy, OpenSearchVectorStore, PgVectorConnection, PgVectorStore, VectorStore,
};
