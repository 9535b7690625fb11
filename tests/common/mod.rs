//! Common test utilities for all integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use genai_providers::secrets::{SecretBackendType, SecretStore, SecretValue};
use genai_providers::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory secret store that counts fetches
#[derive(Debug)]
pub struct CountingStore {
    backend_type: SecretBackendType,
    // `None` marks a secret that exists but carries no payload
    secrets: HashMap<String, Option<String>>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(backend_type: SecretBackendType) -> Self {
        Self { backend_type, secrets: HashMap::new(), calls: AtomicUsize::new(0) }
    }

    pub fn with_secret(mut self, name: &str, payload: &str) -> Self {
        self.secrets.insert(name.to_string(), Some(payload.to_string()));
        self
    }

    pub fn with_empty_secret(mut self, name: &str) -> Self {
        self.secrets.insert(name.to_string(), None);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn get_secret(&self, secret_name: &str) -> Result<Option<SecretValue>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.secrets.get(secret_name) {
            Some(payload) => Ok(payload.as_deref().map(SecretValue::from_payload)),
            None => Err(Error::secret_backend(
                self.backend_type.as_str(),
                secret_name,
                std::io::Error::new(std::io::ErrorKind::NotFound, "secret not found"),
            )),
        }
    }

    fn backend_type(&self) -> SecretBackendType {
        self.backend_type
    }
}
