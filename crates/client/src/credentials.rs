//! Resolution of provider config references into endpoint + credentials.
//!
//! A record names the provider config it wants (`spec.providerConfigRef`);
//! a [`ConfigResolver`] turns that name into a [`ClientConfig`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::{ClientConfig, default_timeout};
use crate::error::ResolveError;

/// Reference from a record to the provider config it should use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderConfigReference {
    pub name: String,
}

impl ProviderConfigReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ProviderConfigReference {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Resolves a provider config reference to a ready-to-use client config.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Resolve the referenced provider config.
    async fn resolve(&self, reference: &ProviderConfigReference)
    -> Result<ClientConfig, ResolveError>;
}

/// Resolver over a fixed set of configs held in memory.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigResolver {
    configs: HashMap<String, ClientConfig>,
}

impl StaticConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a config under `name`.
    #[must_use]
    pub fn with_config(mut self, name: impl Into<String>, config: ClientConfig) -> Self {
        self.configs.insert(name.into(), config);
        self
    }
}

#[async_trait]
impl ConfigResolver for StaticConfigResolver {
    async fn resolve(
        &self,
        reference: &ProviderConfigReference,
    ) -> Result<ClientConfig, ResolveError> {
        self.configs
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| ResolveError::not_found(&reference.name))
    }
}

/// On-disk shape of a provider config.
///
/// ```toml
/// endpoint = "https://metakube.syseleven.de"
/// token_env = "METAKUBE_TOKEN"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Deserialize)]
struct ProviderConfigFile {
    endpoint: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_env: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Resolver reading `<dir>/<name>.toml` (or `<dir>/<name>.json`).
///
/// Files are read on the blocking pool.
#[derive(Debug, Clone)]
pub struct FileConfigResolver {
    dir: PathBuf,
}

impl FileConfigResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load(&self, name: &str) -> Result<ProviderConfigFile, ResolveError> {
        // Names are plain identifiers, never paths.
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(ResolveError::malformed(name, "invalid provider config name"));
        }

        let toml_path = self.dir.join(format!("{name}.toml"));
        match metakube_core::document::read_toml(&toml_path) {
            Ok(file) => return Ok(file),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(ResolveError::malformed(name, e.to_string())),
        }

        let json_path = self.dir.join(format!("{name}.json"));
        metakube_core::document::read_json(&json_path).map_err(|e| {
            if e.is_not_found() {
                ResolveError::not_found(name)
            } else {
                ResolveError::malformed(name, e.to_string())
            }
        })
    }

    /// Directory configs are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ConfigResolver for FileConfigResolver {
    async fn resolve(
        &self,
        reference: &ProviderConfigReference,
    ) -> Result<ClientConfig, ResolveError> {
        let name = reference.name.as_str();
        let loader = self.clone();
        let owned = reference.name.clone();
        let file = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .map_err(|e| ResolveError::malformed(name, format!("config loader failed: {e}")))??;
        debug!(name, dir = %self.dir.display(), "Loaded provider config");
        into_client_config(name, file)
    }
}

fn into_client_config(name: &str, file: ProviderConfigFile) -> Result<ClientConfig, ResolveError> {
    let endpoint: Url = file
        .endpoint
        .parse()
        .map_err(|e| ResolveError::malformed(name, format!("invalid endpoint: {e}")))?;

    let token = match (file.token, file.token_env) {
        (Some(token), _) => token,
        (None, Some(var)) => std::env::var(&var).map_err(|_| {
            ResolveError::malformed(name, format!("environment variable '{var}' is not set"))
        })?,
        (None, None) => {
            return Err(ResolveError::malformed(name, "either token or token_env is required"));
        }
    };

    if token.trim().is_empty() {
        return Err(ResolveError::malformed(name, "token is empty"));
    }

    let timeout = file
        .timeout_secs
        .map_or_else(default_timeout, Duration::from_secs);

    Ok(ClientConfig::new(endpoint, token).timeout(timeout))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_static_resolver_hit_and_miss() {
        let config = ClientConfig::new("https://api.example.com".parse().unwrap(), "t");
        let resolver = StaticConfigResolver::new().with_config("default", config.clone());

        let hit = resolver.resolve(&ProviderConfigReference::default()).await;
        let miss = resolver.resolve(&ProviderConfigReference::new("other")).await;

        assert_eq!(hit, Ok(config));
        assert_eq!(miss, Err(ResolveError::not_found("other")));
    }

    #[tokio::test]
    async fn test_file_resolver_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "default.toml",
            "endpoint = \"https://metakube.example.com\"\ntoken = \"abc\"\ntimeout_secs = 5\n",
        );
        let resolver = FileConfigResolver::new(dir.path());

        let config = resolver
            .resolve(&ProviderConfigReference::default())
            .await
            .unwrap();

        assert_eq!(config.endpoint.as_str(), "https://metakube.example.com/");
        assert_eq!(config.token, "abc");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_file_resolver_concurrent_reads_on_single_thread() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.toml",
            "endpoint = \"https://a.example.com\"\ntoken = \"ta\"\n",
        );
        write(
            dir.path(),
            "b.toml",
            "endpoint = \"https://b.example.com\"\ntoken = \"tb\"\n",
        );
        let resolver = FileConfigResolver::new(dir.path());

        let ref_a = ProviderConfigReference::new("a");
        let ref_b = ProviderConfigReference::new("b");
        let (a, b) = tokio::join!(resolver.resolve(&ref_a), resolver.resolve(&ref_b),);

        assert_eq!(a.unwrap().endpoint.as_str(), "https://a.example.com/");
        assert_eq!(b.unwrap().endpoint.as_str(), "https://b.example.com/");
    }

    #[tokio::test]
    async fn test_file_resolver_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "staging.json",
            r#"{"endpoint": "https://staging.example.com", "token": "xyz"}"#,
        );
        let resolver = FileConfigResolver::new(dir.path());

        let config = resolver
            .resolve(&ProviderConfigReference::new("staging"))
            .await
            .unwrap();

        assert_eq!(config.token, "xyz");
        assert_eq!(config.timeout, default_timeout());
    }

    #[tokio::test]
    async fn test_file_resolver_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver.resolve(&ProviderConfigReference::default()).await;

        assert_eq!(result, Err(ResolveError::not_found("default")));
    }

    #[tokio::test]
    async fn test_file_resolver_unparsable_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "default.toml", "endpoint = [\n");
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver.resolve(&ProviderConfigReference::default()).await;

        assert!(matches!(result, Err(ResolveError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_file_resolver_requires_token() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "default.toml", "endpoint = \"https://a.example.com\"\n");
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver.resolve(&ProviderConfigReference::default()).await;

        match result {
            Err(ResolveError::Malformed { reason, .. }) => assert!(reason.contains("token")),
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_resolver_unset_token_env_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "default.toml",
            "endpoint = \"https://a.example.com\"\ntoken_env = \"PROVIDER_METAKUBE_TEST_UNSET_TOKEN\"\n",
        );
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver.resolve(&ProviderConfigReference::default()).await;

        match result {
            Err(ResolveError::Malformed { reason, .. }) => {
                assert!(reason.contains("PROVIDER_METAKUBE_TEST_UNSET_TOKEN"));
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_file_resolver_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver
            .resolve(&ProviderConfigReference::new("../secrets"))
            .await;

        assert!(matches!(result, Err(ResolveError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_file_resolver_invalid_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "default.toml", "endpoint = \"not a url\"\ntoken = \"t\"\n");
        let resolver = FileConfigResolver::new(dir.path());

        let result = resolver.resolve(&ProviderConfigReference::default()).await;

        match result {
            Err(ResolveError::Malformed { reason, .. }) => assert!(reason.contains("endpoint")),
            other => panic!("expected malformed, got {other:?}"),
        }
    }
}
