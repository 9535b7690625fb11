//! # Error Handling
//!
//! Every fallible operation in the crate returns [`Result`]. Secret store
//! failures are wrapped, never translated: the SDK error stays reachable
//! through [`std::error::Error::source`].

pub mod types;

pub use types::{BoxError, CapabilityKind, Error, Result};
