//! Retrieved document type shared by vector stores and compressors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A piece of retrieved text with its metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self { page_content: page_content.into(), metadata: Map::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Score recorded by a retriever or reranker, if any
    pub fn retriever_score(&self) -> Option<f64> {
        self.metadata.get("retriever_score").and_then(Value::as_f64)
    }
}
