//! Vector store clients.
//!
//! Both stores embed the query with the [`Embeddings`] client they were built
//! with, then run a k-nearest-neighbour search.

use super::documents::Document;
use super::embeddings::Embeddings;
use super::http::{build_client, json, nested_endpoint, send};
use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// Trait for similarity search over stored documents
///
/// Implementations:
/// - [`OpenSearchVectorStore`]: OpenSearch k-NN index
/// - [`PgVectorStore`]: PostgreSQL with the pgvector extension
#[async_trait]
pub trait VectorStore: Send + Sync + std::fmt::Debug {
    /// Return the `k` documents closest to `query`
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>>;

    /// Embedding client used for queries
    fn embeddings(&self) -> &dyn Embeddings;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Distance function used to compare vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceStrategy {
    Euclidean,
    Cosine,
    InnerProduct,
}

impl DistanceStrategy {
    /// pgvector operator for this distance
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Euclidean => "<->",
            Self::Cosine => "<=>",
            Self::InnerProduct => "<#>",
        }
    }
}

impl FromStr for DistanceStrategy {
    type Err = Error;

    /// Accepts both pgvector (`l2`, `cosine`, `inner`) and OpenSearch
    /// (`cosinesimil`, `innerproduct`) space names.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l2" | "euclidean" => Ok(Self::Euclidean),
            "cosine" | "cosinesimil" => Ok(Self::Cosine),
            "inner" | "innerproduct" | "max_inner_product" => Ok(Self::InnerProduct),
            other => Err(Error::validation_field(
                format!("Unsupported space type '{}'", other),
                "space_type",
            )),
        }
    }
}

const OPENSEARCH_VECTOR_FIELD: &str = "vector_field";
const OPENSEARCH_TEXT_FIELD: &str = "text";
const OPENSEARCH_METADATA_FIELD: &str = "metadata";

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Map<String, Value>,
}

/// OpenSearch k-NN search over a single index
#[derive(Debug)]
pub struct OpenSearchVectorStore {
    client: reqwest::Client,
    base: Url,
    index: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    embeddings: Box<dyn Embeddings>,
}

impl OpenSearchVectorStore {
    /// `use_ssl` forces https on the cluster URL; `verify_certs = false`
    /// accepts self-signed certificates.
    pub fn new(
        opensearch_url: &str,
        index: Option<String>,
        http_auth: Option<(String, SecretString)>,
        use_ssl: bool,
        verify_certs: bool,
        embeddings: Box<dyn Embeddings>,
    ) -> Result<Self> {
        let mut base = Url::parse(opensearch_url).map_err(|e| {
            Error::config_with_source(format!("Invalid OpenSearch URL '{}'", opensearch_url), Box::new(e))
        })?;
        if use_ssl && base.scheme() == "http" && base.set_scheme("https").is_err() {
            return Err(Error::config(format!("Cannot switch '{}' to https", opensearch_url)));
        }

        let (username, password) = match http_auth {
            Some((username, password)) => (Some(username), Some(password)),
            None => (None, None),
        };

        Ok(Self {
            client: build_client(!verify_certs)?,
            base,
            index,
            username,
            password,
            embeddings,
        })
    }

    pub fn url(&self) -> &Url {
        &self.base
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

#[async_trait]
impl VectorStore for OpenSearchVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let index = self.index.as_deref().ok_or_else(|| {
            Error::validation_field("an index is required to search OpenSearch", "index")
        })?;

        let vector = self.embeddings.embed_query(query).await?;
        let url = nested_endpoint(self.base.as_str(), &format!("{}/_search", index))?;
        debug!(url = %url, k = k, "Running OpenSearch k-NN search");

        let body = json!({
            "size": k,
            "query": {"knn": {OPENSEARCH_VECTOR_FIELD: {"vector": vector, "k": k}}}
        });
        let mut request = self.client.post(url).json(&body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref().map(|p| p.expose_secret()));
        }

        let response = send(self.name(), request).await?;
        let parsed: SearchResponse = json(self.name(), response).await?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let mut source = hit.source;
                let page_content = match source.remove(OPENSEARCH_TEXT_FIELD) {
                    Some(Value::String(text)) => text,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                let metadata = match source.remove(OPENSEARCH_METADATA_FIELD) {
                    Some(Value::Object(metadata)) => metadata,
                    _ => Map::new(),
                };
                let mut document = Document { page_content, metadata };
                if let Some(score) = hit.score {
                    document = document.with_metadata("retriever_score", score);
                }
                document
            })
            .collect())
    }

    fn embeddings(&self) -> &dyn Embeddings {
        self.embeddings.as_ref()
    }

    fn name(&self) -> &str {
        "opensearch"
    }
}

/// Connection parameters for [`PgVectorStore`]
#[derive(Debug, Clone)]
pub struct PgVectorConnection {
    /// `host` or `host:port`
    pub db_url: String,
    pub db_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub sslmode: String,
}

impl PgVectorConnection {
    fn connect_options(&self) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::new();

        options = match self.db_url.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| {
                    Error::validation_field(format!("Invalid port in db_url '{}'", self.db_url), "db_url")
                })?;
                options.host(host).port(port)
            }
            None => options.host(&self.db_url),
        };
        if let Some(db_name) = &self.db_name {
            options = options.database(db_name);
        }
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        let ssl_mode = PgSslMode::from_str(&self.sslmode).map_err(|_| {
            Error::validation_field(format!("Unsupported sslmode '{}'", self.sslmode), "sslmode")
        })?;
        Ok(options.ssl_mode(ssl_mode))
    }
}

/// pgvector store laid out as LangChain's `langchain_pg_collection` /
/// `langchain_pg_embedding` tables
#[derive(Debug)]
pub struct PgVectorStore {
    pool: PgPool,
    collection_name: String,
    collection_metadata: Value,
    distance_strategy: DistanceStrategy,
    embeddings: Box<dyn Embeddings>,
}

impl PgVectorStore {
    /// Build the store with a lazy pool; no connection is opened until the
    /// first search.
    pub fn new(
        connection: &PgVectorConnection,
        collection_name: impl Into<String>,
        namespace: &str,
        distance_strategy: DistanceStrategy,
        embeddings: Box<dyn Embeddings>,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new().connect_lazy_with(connection.connect_options()?);

        Ok(Self {
            pool,
            collection_name: collection_name.into(),
            collection_metadata: json!({"namespace": namespace}),
            distance_strategy,
            embeddings,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Metadata stored with the collection (`{"namespace": ...}`)
    pub fn collection_metadata(&self) -> &Value {
        &self.collection_metadata
    }

    pub fn distance_strategy(&self) -> DistanceStrategy {
        self.distance_strategy
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn search_sql(&self) -> String {
        format!(
            "SELECT e.document, e.cmetadata, (e.embedding {} $1::vector)::float8 AS distance \
             FROM langchain_pg_embedding e \
             JOIN langchain_pg_collection c ON e.collection_id = c.uuid \
             WHERE c.name = $2 \
             ORDER BY distance ASC \
             LIMIT $3",
            self.distance_strategy.operator()
        )
    }
}

/// pgvector text literal, `[0.1,0.2]`
fn vector_literal(vector: &[f32]) -> String {
    let values: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let vector = self.embeddings.embed_query(query).await?;
        debug!(collection = %self.collection_name, k = k, "Running pgvector similarity search");

        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let rows = sqlx::query(&self.search_sql())
            .bind(vector_literal(&vector))
            .bind(&self.collection_name)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::Database {
                context: format!("similarity search on collection '{}'", self.collection_name),
                source: e,
            })?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let page_content: Option<String> = row.try_get("document")?;
            let metadata: Option<Value> = row.try_get("cmetadata")?;
            let distance: f64 = row.try_get("distance")?;

            let metadata = match metadata {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            documents.push(
                Document { page_content: page_content.unwrap_or_default(), metadata }
                    .with_metadata("retriever_score", distance),
            );
        }
        Ok(documents)
    }

    fn embeddings(&self) -> &dyn Embeddings {
        self.embeddings.as_ref()
    }

    fn name(&self) -> &str {
        "pgvector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embeddings::BloomzEmbeddings;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bloomz(uri: &str) -> Box<dyn Embeddings> {
        Box::new(BloomzEmbeddings::new(uri, None, None, None).unwrap())
    }

    #[test]
    fn test_distance_strategy_from_space_type() {
        assert_eq!("l2".parse::<DistanceStrategy>().unwrap(), DistanceStrategy::Euclidean);
        assert_eq!("cosinesimil".parse::<DistanceStrategy>().unwrap(), DistanceStrategy::Cosine);
        assert_eq!("inner".parse::<DistanceStrategy>().unwrap(), DistanceStrategy::InnerProduct);

        let err = "hamming".parse::<DistanceStrategy>().unwrap_err();
        assert_eq!(err.field(), Some("space_type"));
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0]), "[0.5,-1]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[test]
    fn test_opensearch_use_ssl_upgrades_scheme() {
        let store = OpenSearchVectorStore::new(
            "http://localhost:9200",
            Some("docs".to_string()),
            None,
            true,
            false,
            bloomz("http://bloomz"),
        )
        .unwrap();
        assert_eq!(store.url().scheme(), "https");
    }

    #[tokio::test]
    async fn test_opensearch_search_requires_index() {
        let store =
            OpenSearchVectorStore::new("http://localhost", None, None, false, false, bloomz("http://bloomz"))
                .unwrap();
        let err = store.similarity_search("query", 4).await.unwrap_err();
        assert_eq!(err.field(), Some("index"));
    }

    #[tokio::test]
    async fn test_opensearch_similarity_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [[0.1, 0.2]]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/docs/_search"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": {"hits": [
                    {"_score": 0.9, "_source": {"text": "first", "metadata": {"source": "a.pdf"}}},
                    {"_score": 0.4, "_source": {"text": "second"}}
                ]}
            })))
            .mount(&server)
            .await;

        let store = OpenSearchVectorStore::new(
            &server.uri(),
            Some("docs".to_string()),
            Some(("admin".to_string(), SecretString::new("admin"))),
            false,
            true,
            bloomz(&server.uri()),
        )
        .unwrap();

        let documents = store.similarity_search("what?", 2).await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].page_content, "first");
        assert_eq!(documents[0].metadata["source"], json!("a.pdf"));
        assert_eq!(documents[0].retriever_score(), Some(0.9));
    }

    #[tokio::test]
    async fn test_pgvector_construction_is_lazy() {
        let connection = PgVectorConnection {
            db_url: "localhost:5432".to_string(),
            db_name: Some("vectors".to_string()),
            username: Some("postgres".to_string()),
            password: Some(SecretString::new("postgres")),
            sslmode: "disable".to_string(),
        };
        let store = PgVectorStore::new(
            &connection,
            "docs",
            "my-app",
            DistanceStrategy::Cosine,
            bloomz("http://bloomz"),
        )
        .unwrap();

        assert_eq!(store.collection_metadata(), &json!({"namespace": "my-app"}));
        assert!(store.search_sql().contains("<=>"));
        assert_eq!(store.pool().size(), 0);
    }

    #[test]
    fn test_pgvector_rejects_bad_connection_values() {
        let mut connection = PgVectorConnection {
            db_url: "localhost:notaport".to_string(),
            db_name: None,
            username: None,
            password: None,
            sslmode: "require".to_string(),
        };
        assert_eq!(connection.connect_options().unwrap_err().field(), Some("db_url"));

        connection.db_url = "localhost".to_string();
        connection.sslmode = "sometimes".to_string();
        assert_eq!(connection.connect_options().unwrap_err().field(), Some("sslmode"));
    }
}
