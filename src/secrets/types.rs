//! Secure types for handling resolved credentials.
//!
//! [`SecretString`] keeps plaintext out of logs and serialized output;
//! [`SecretValue`] is what a secret store hands back once a payload has been
//! fetched and run through JSON auto-detection.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// - Debug output shows `SecretString([REDACTED])`
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"`, never the actual value
/// - Deserialization accepts the actual value (configuration payloads)
/// - Memory is zeroed when dropped
///
/// The value is only reachable through [`SecretString::expose_secret`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Consumes the SecretString and returns the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A resolved secret.
///
/// Stores return JSON objects and arrays as structured values and everything
/// else as text, so callers can pick fields out of a JSON credential bundle.
/// Scalars stay text: re-rendering a parsed number would change the
/// credential (`"12345678901234567890123"` does not survive `f64`).
#[derive(Clone, PartialEq)]
pub enum SecretValue {
    /// Plain text payload
    Text(SecretString),
    /// Payload that parsed as a JSON object or array, with its original text
    Json { value: serde_json::Value, raw: SecretString },
}

impl SecretValue {
    /// Build a value from a raw store payload, detecting JSON.
    ///
    /// A JSON string payload (`"\"abc\""`) is unquoted.
    pub fn from_payload(payload: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                Self::Json { value, raw: SecretString::new(payload) }
            }
            Ok(serde_json::Value::String(s)) => Self::Text(SecretString::new(s)),
            _ => Self::Text(SecretString::new(payload)),
        }
    }

    /// Text content, if this is a text secret.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(secret) => Some(secret.expose_secret()),
            Self::Json { .. } => None,
        }
    }

    /// Structured content, if the payload parsed as a JSON object or array.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json { value, .. } => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Follow a dotted key path (`"db.credentials.password"`) through a JSON secret.
    ///
    /// Returns `None` for text secrets or when any segment is missing.
    pub fn lookup(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = self.as_json()?;
        for key in path.split('.') {
            current = match current {
                serde_json::Value::Object(map) => map.get(key)?,
                serde_json::Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Plaintext handed to client constructors: the payload exactly as stored.
    pub fn into_plaintext(self) -> SecretString {
        match self {
            Self::Text(secret) => secret,
            Self::Json { raw, .. } => raw,
        }
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(_) => write!(f, "SecretValue::Text([REDACTED])"),
            Self::Json { .. } => write!(f, "SecretValue::Json([REDACTED])"),
        }
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        Self::Text(SecretString::new(s))
    }
}
