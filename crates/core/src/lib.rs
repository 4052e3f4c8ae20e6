//! # metakube-core
//!
//! Shared building blocks for provider-metakube: the file and parse error
//! type, the `Result` alias with its extension traits, and helpers that load
//! YAML/TOML/JSON documents from disk.
//!
//! All errors are explicit and typed - no panics allowed.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod document;
pub mod error;
pub mod result;

pub use error::Error;
pub use result::{GenericResultExt, Result};
