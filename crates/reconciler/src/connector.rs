//! Connection factory: resolves credentials and builds a per-pass client.

use std::fmt;
use std::sync::Arc;

use metakube_client::{ClientFactory, ConfigResolver};
use tracing::{debug, instrument};

use crate::context::PassContext;
use crate::error::{Error, Result, Stage};
use crate::external::External;
use crate::types::Project;

/// Produces a connected [`External`] for each reconciliation pass.
///
/// Nothing is cached between passes; every call resolves the provider config
/// again so rotated credentials are picked up.
pub struct Connector<F> {
    resolver: Arc<dyn ConfigResolver>,
    factory: F,
}

impl<F> fmt::Debug for Connector<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector").finish_non_exhaustive()
    }
}

impl<F: ClientFactory> Connector<F> {
    pub fn new(resolver: Arc<dyn ConfigResolver>, factory: F) -> Self {
        Self { resolver, factory }
    }

    /// Get the client factory.
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Connect for one pass over `cr`.
    ///
    /// # Errors
    ///
    /// - [`Error::WrongRecordKind`] if `cr` is not a Project
    /// - [`Error::ConfigResolution`] if the provider config cannot be resolved
    /// - [`Error::Connection`] if no client can be built from it
    /// - [`Error::Cancelled`] / [`Error::DeadlineExceeded`] from `ctx`
    #[instrument(skip_all, fields(project = %cr.name(), provider_config = %cr.spec.provider_config_ref.name))]
    pub async fn connect(&self, cr: &Project, ctx: &PassContext) -> Result<External<F::Api>> {
        cr.ensure_kind()?;

        let config = ctx
            .guard(
                Stage::Connect,
                self.resolver.resolve(&cr.spec.provider_config_ref),
            )
            .await??;
        debug!(endpoint = %config.endpoint, "Resolved provider config");

        let client = self
            .factory
            .new_client(config)
            .map_err(|e| Error::connection(e.to_string()))?;

        Ok(External::new(client, ctx.clone()))
    }
}
