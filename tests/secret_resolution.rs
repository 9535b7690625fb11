//! Integration tests for secret reference resolution

mod common;

use common::CountingStore;
use genai_providers::config::ResolverConfig;
use genai_providers::secrets::SecretBackendType;
use genai_providers::{Error, SecretReference, SecretResolver};
use serde_json::json;
use std::env;
use std::sync::Mutex;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const GCP_ENV_VARS: [&str; 3] =
    ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT", "GOOGLE_APPLICATION_CREDENTIALS"];

#[tokio::test]
async fn test_raw_reference_is_idempotent() {
    let resolver = SecretResolver::default();
    let reference = SecretReference::from_value(json!({"type": "Raw", "value": "a1b2c3d4"})).unwrap();

    let first = resolver.resolve_plaintext(Some(&reference)).await.unwrap();
    let second = resolver.resolve_plaintext(Some(&reference)).await.unwrap();
    assert_eq!(first.as_deref(), Some("a1b2c3d4"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_kubernetes_reference_is_unsupported() {
    let resolver = SecretResolver::default();
    let reference =
        SecretReference::from_value(json!({"type": "KubeSecret", "secret_name": "bloomz-key"})).unwrap();

    let err = resolver.resolve(&reference).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_aws_json_payload_fetched_once() {
    let store = CountingStore::new(SecretBackendType::AwsSecretsManager)
        .with_secret("PROD/App/db", r#"{"username": "admin", "password": "hunter2"}"#)
        .shared();
    let resolver = SecretResolver::default().with_store(store.clone());

    let value = resolver.resolve(&SecretReference::aws("PROD/App/db")).await.unwrap().unwrap();

    assert_eq!(value.lookup("password"), Some(&json!("hunter2")));
    assert!(value.as_text().is_none());
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_absent_secret_surfaces_store_error() {
    let store = CountingStore::new(SecretBackendType::GcpSecretManager).shared();
    let resolver = SecretResolver::default().with_store(store.clone());

    let err = resolver.resolve(&SecretReference::gcp("absent")).await.unwrap_err();

    match &err {
        Error::SecretBackend { backend, secret_name, .. } => {
            assert_eq!(*backend, SecretBackendType::GcpSecretManager.as_str());
            assert_eq!(secret_name, "absent");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let source = std::error::Error::source(&err).expect("store error is kept as source");
    let io = source.downcast_ref::<std::io::Error>().expect("store error type is kept");
    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_secret_without_payload_resolves_to_none() {
    let store = CountingStore::new(SecretBackendType::GcpSecretManager)
        .with_empty_secret("empty")
        .shared();
    let resolver = SecretResolver::default().with_store(store.clone());

    let value = resolver.resolve_plaintext(Some(&SecretReference::gcp("empty"))).await.unwrap();
    assert!(value.is_none());
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_numeric_payloads_reach_clients_verbatim() {
    let store = CountingStore::new(SecretBackendType::AwsSecretsManager)
        .with_secret("long", "12345678901234567890123")
        .with_secret("exponent", "1e5")
        .with_secret("trailing-zero", "1.50")
        .shared();
    let resolver = SecretResolver::default().with_store(store);

    for (name, expected) in
        [("long", "12345678901234567890123"), ("exponent", "1e5"), ("trailing-zero", "1.50")]
    {
        let value = resolver.resolve_plaintext(Some(&SecretReference::aws(name))).await.unwrap();
        assert_eq!(value.as_deref(), Some(expected));
    }
}

#[tokio::test]
async fn test_stores_are_keyed_by_backend() {
    let aws = CountingStore::new(SecretBackendType::AwsSecretsManager)
        .with_secret("key", "from-aws")
        .shared();
    let gcp = CountingStore::new(SecretBackendType::GcpSecretManager)
        .with_secret("key", "from-gcp")
        .shared();
    let resolver = SecretResolver::default().with_store(aws.clone()).with_store(gcp.clone());

    assert!(resolver.has_store(SecretBackendType::AwsSecretsManager));
    assert!(resolver.has_store(SecretBackendType::GcpSecretManager));

    let value = resolver.resolve_plaintext(Some(&SecretReference::gcp("key"))).await.unwrap();
    assert_eq!(value.as_deref(), Some("from-gcp"));
    assert_eq!(aws.calls(), 0);
    assert_eq!(gcp.calls(), 1);
}

#[test]
fn test_gcp_without_project_is_configuration_error() {
    let _guard = ENV_MUTEX.lock().unwrap();

    let originals: Vec<(&str, Option<String>)> =
        GCP_ENV_VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
    for name in GCP_ENV_VARS {
        env::remove_var(name);
    }

    let resolver = SecretResolver::new(ResolverConfig::default());
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(resolver.resolve(&SecretReference::gcp("bloomz-key")));

    for (name, value) in originals {
        match value {
            Some(value) => env::set_var(name, value),
            None => env::remove_var(name),
        }
    }

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Config { .. }), "unexpected error: {err:?}");
}

#[test]
fn test_resolved_values_are_redacted_in_debug() {
    let reference = SecretReference::raw("a1b2c3d4");
    assert!(!format!("{reference:?}").contains("a1b2c3d4"));
}
