//! End-to-end tests: raw settings through dispatch to working clients

mod common;

use common::CountingStore;
use genai_providers::secrets::SecretBackendType;
use genai_providers::{
    get_guardrail_factory, get_vector_db_factory, AppSettings, Document, EmbeddingSettings,
    GuardrailSettings, SecretResolver, VectorDbSettings,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_opensearch_store_builds_without_network() {
    let db = VectorDbSettings::from_value(json!({
        "provider": "OPENSEARCH",
        "db_url": "http://localhost",
        "use_ssl": false,
        "verify_certs": false
    }))
    .unwrap();
    let em = EmbeddingSettings::from_value(json!({
        "provider": "BloomzEmbeddings",
        "api_base": "http://bloomz"
    }))
    .unwrap();

    let factory = get_vector_db_factory(db, em, Arc::new(SecretResolver::default()));
    let store = factory.get_vector_store().await.unwrap();

    assert_eq!(store.name(), "opensearch");
    assert_eq!(store.embeddings().name(), "bloomz_embeddings");
}

async fn guardrail_server(score: f64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/guardrail"))
        .and(body_json(json!({"text": ["generated answer"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [[{"label": "toxic", "score": score}]]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_guardrail_default_threshold() {
    for (score, flagged) in [(0.31, true), (0.3, false), (0.05, false)] {
        let server = guardrail_server(score).await;
        let settings = GuardrailSettings::from_value(json!({
            "provider": "BloomzGuardrail",
            "api_base": server.uri()
        }))
        .unwrap();

        let parser = get_guardrail_factory(settings, Arc::new(SecretResolver::default()))
            .get_parser()
            .await
            .unwrap();
        let output = parser.parse("generated answer").await.unwrap();

        assert_eq!(output.output_toxicity, flagged, "score {score}");
        assert_eq!(output.content, "generated answer");
    }
}

#[tokio::test]
async fn test_raw_api_key_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/guardrail"))
        .and(header("Authentication", "Bearer a1b2c3d4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [[{"label": "toxic", "score": 0.01}]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = GuardrailSettings::from_value(json!({
        "provider": "BloomzGuardrail",
        "api_base": server.uri(),
        "api_key": {"type": "Raw", "value": "a1b2c3d4"}
    }))
    .unwrap();

    let parser = get_guardrail_factory(settings, Arc::new(SecretResolver::default()))
        .get_parser()
        .await
        .unwrap();
    assert!(!parser.parse("hello").await.unwrap().output_toxicity);
}

#[tokio::test]
async fn test_opensearch_search_with_managed_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [[0.1, 0.2, 0.3]]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/faq/_search"))
        .and(basic_auth("admin", "hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {"hits": [
                {"_score": 0.92, "_source": {"text": "Reset it from settings.", "metadata": {"source": "faq.md"}}}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store_backend = CountingStore::new(SecretBackendType::GcpSecretManager)
        .with_secret("opensearch-password", "hunter2")
        .shared();
    let resolver = Arc::new(SecretResolver::default().with_store(store_backend.clone()));

    let settings = AppSettings::from_value(json!({
        "vector_db": {
            "provider": "OPENSEARCH",
            "db_url": server.uri(),
            "index": "faq",
            "username": {"type": "Raw", "value": "admin"},
            "password": {"type": "GcpSecretManager", "secret_name": "opensearch-password"},
            "use_ssl": false,
            "verify_certs": true
        },
        "embedding": {"provider": "BloomzEmbeddings", "api_base": server.uri()}
    }))
    .unwrap();

    let factory = get_vector_db_factory(
        settings.vector_db.unwrap(),
        settings.embedding.unwrap(),
        resolver,
    );
    let store = factory.get_vector_store().await.unwrap();
    let documents: Vec<Document> = store.similarity_search("password reset", 4).await.unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].page_content, "Reset it from settings.");
    assert_eq!(documents[0].metadata["source"], json!("faq.md"));
    assert_eq!(documents[0].retriever_score(), Some(0.92));
    assert_eq!(store_backend.calls(), 1);
}
