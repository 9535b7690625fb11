//! Vector store factories.
//!
//! A vector store needs an embedding client for its queries, so these
//! factories carry the embedding settings too and build that client through
//! [`get_embedding_factory`].

use super::embedding::get_embedding_factory;
use super::resolve_secret;
use crate::domain::{
    EmbeddingSettings, OpenSearchSettings, PgVectorSettings, VectorDbProvider, VectorDbSettings,
};
use crate::errors::Result;
use crate::secrets::SecretResolver;
use crate::services::{
    DistanceStrategy, Embeddings, OpenSearchVectorStore, PgVectorConnection, PgVectorStore, VectorStore,
};
use async_trait::async_trait;
use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collection used when a pgvector setting names no index
pub const DEFAULT_PGVECTOR_COLLECTION: &str = "langchain";

/// Builds a [`VectorStore`] from provider and embedding settings
#[async_trait]
pub trait VectorDbFactory: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> VectorDbProvider;

    fn as_any(&self) -> &dyn Any;

    async fn get_vector_store(&self) -> Result<Box<dyn VectorStore>>;
}

async fn embedding_model(
    settings: &EmbeddingSettings,
    resolver: &Arc<SecretResolver>,
) -> Result<Box<dyn Embeddings>> {
    get_embedding_factory(settings.clone(), Arc::clone(resolver)).get_model().await
}

#[derive(Debug, Clone)]
pub struct OpenSearchFactory {
    settings: OpenSearchSettings,
    embedding: EmbeddingSettings,
    resolver: Arc<SecretResolver>,
}

impl OpenSearchFactory {
    pub fn new(
        settings: OpenSearchSettings,
        embedding: EmbeddingSettings,
        resolver: Arc<SecretResolver>,
    ) -> Self {
        Self { settings, embedding, resolver }
    }

    pub fn settings(&self) -> &OpenSearchSettings {
        &self.settings
    }

    pub fn embedding_settings(&self) -> &EmbeddingSettings {
        &self.embedding
    }
}

#[async_trait]
impl VectorDbFactory for OpenSearchFactory {
    fn provider(&self) -> VectorDbProvider {
        VectorDbProvider::OpenSearch
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_vector_store(&self) -> Result<Box<dyn VectorStore>> {
        let username = self.resolver.resolve_plaintext(self.settings.username.as_ref()).await?;
        let password = resolve_secret(&self.resolver, self.settings.password.as_ref()).await?;

        let http_auth = match (username, password) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => {
                warn!(db_url = %self.settings.db_url, "OpenSearch credentials incomplete, connecting without auth");
                None
            }
        };

        let embeddings = embedding_model(&self.embedding, &self.resolver).await?;
        Ok(Box::new(OpenSearchVectorStore::new(
            &self.settings.db_url,
            self.settings.index.clone(),
            http_auth,
            self.settings.use_ssl,
            self.settings.verify_certs,
            embeddings,
        )?))
    }
}

#[derive(Debug, Clone)]
pub struct PgVectorFactory {
    settings: PgVectorSettings,
    embedding: EmbeddingSettings,
    resolver: Arc<SecretResolver>,
}

impl PgVectorFactory {
    pub fn new(
        settings: PgVectorSettings,
        embedding: EmbeddingSettings,
        resolver: Arc<SecretResolver>,
    ) -> Self {
        Self { settings, embedding, resolver }
    }

    pub fn settings(&self) -> &PgVectorSettings {
        &self.settings
    }

    pub fn embedding_settings(&self) -> &EmbeddingSettings {
        &self.embedding
    }
}

#[async_trait]
impl VectorDbFactory for PgVectorFactory {
    fn provider(&self) -> VectorDbProvider {
        VectorDbProvider::PgVector
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn get_vector_store(&self) -> Result<Box<dyn VectorStore>> {
        let distance_strategy = DistanceStrategy::from_str(self.embedding.space_type())?;

        let connection = PgVectorConnection {
            db_url: self.settings.db_url.clone(),
            db_name: self.settings.db_name.clone(),
            username: self.resolver.resolve_plaintext(self.settings.username.as_ref()).await?,
            password: resolve_secret(&self.resolver, self.settings.password.as_ref()).await?,
            sslmode: self.settings.sslmode.clone(),
        };

        let embeddings = embedding_model(&self.embedding, &self.resolver).await?;
        Ok(Box::new(PgVectorStore::new(
            &connection,
            self.settings.index.as_deref().unwrap_or(DEFAULT_PGVECTOR_COLLECTION),
            &self.settings.namespace,
            distance_strategy,
            embeddings,
        )?))
    }
}

/// Pick the vector store factory matching `db_settings.provider`
pub fn get_vector_db_factory(
    db_settings: VectorDbSettings,
    em_settings: EmbeddingSettings,
    resolver: Arc<SecretResolver>,
) -> Box<dyn VectorDbFactory> {
    debug!(
        provider = %db_settings.provider(),
        embedding_provider = %em_settings.provider(),
        "Selecting vector store factory"
    );
    match db_settings {
        VectorDbSettings::OpenSearch(s) => Box::new(OpenSearchFactory::new(s, em_settings, resolver)),
        VectorDbSettings::PgVector(s) => Box::new(PgVectorFactory::new(s, em_settings, resolver)),
    }
}
