#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # metakube-client
//!
//! Client side of the MetaKube Projects API.
//!
//! ## Features
//!
//! - [`ProjectsApi`]: the CRUD surface the reconciler talks to
//! - [`HttpProjectsClient`]: `reqwest` implementation over a pooled transport
//! - [`InMemoryProjectsApi`]: in-process implementation for tests and dry runs
//! - [`ConfigResolver`]: resolves a provider config reference to endpoint and credentials
//! - [`ClientFactory`]: builds one authenticated client per reconciliation pass
//!
//! ## Example
//!
//! ```ignore
//! use metakube_client::{ClientFactory, ConfigResolver, FileConfigResolver, HttpClientFactory};
//!
//! let resolver = FileConfigResolver::new("/etc/provider-metakube");
//! let config = resolver.resolve(&ProviderConfigReference::new("default")).await?;
//! let client = HttpClientFactory::new()?.new_client(config)?;
//! let project = client.get_project("p-123").await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod memory;
pub mod models;

pub use api::ProjectsApi;
pub use client::HttpProjectsClient;
pub use config::ClientConfig;
pub use credentials::{
    ConfigResolver, FileConfigResolver, ProviderConfigReference, StaticConfigResolver,
};
pub use error::{ApiError, ApiResult, ResolveError};
pub use factory::{ClientFactory, HttpClientFactory};
pub use memory::{ApiOperation, InMemoryClientFactory, InMemoryProjectsApi};
pub use models::{CreateProjectBody, Project};
