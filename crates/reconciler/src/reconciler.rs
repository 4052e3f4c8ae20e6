//! Reconciler implementation.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use metakube_client::{ClientFactory, ConfigResolver};
use tracing::{debug, info, instrument, warn};

use crate::conditions::Condition;
use crate::connector::Connector;
use crate::context::PassContext;
use crate::error::{Error, Result};
use crate::types::{Project, ReconcileAction, ReconcileResult};

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Maximum passes running at once in [`Reconciler::reconcile_all`].
    pub max_concurrent: usize,
    /// Upper bound on the duration of one pass.
    pub pass_timeout: Option<Duration>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            pass_timeout: None,
        }
    }
}

/// Crossplane-style reconciler for Project records.
///
/// Each pass connects, observes and then takes at most one corrective action.
/// The reconciler itself performs no retries; callers re-run passes.
#[derive(Debug)]
pub struct Reconciler<F> {
    connector: Connector<F>,
    config: ReconcilerConfig,
}

impl<F: ClientFactory> Reconciler<F> {
    /// Create a new reconciler.
    pub const fn new(connector: Connector<F>, config: ReconcilerConfig) -> Self {
        Self { connector, config }
    }

    /// Run one reconciliation pass over `cr`.
    ///
    /// The `Synced` condition of `cr` records the outcome either way.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    #[instrument(skip_all, fields(project = %cr.name()))]
    pub async fn reconcile(&self, cr: &mut Project, ctx: &PassContext) -> Result<ReconcileResult> {
        let ctx = match self.config.pass_timeout {
            Some(timeout) => ctx.bounded_by(timeout),
            None => ctx.clone(),
        };

        let outcome = self.pass(cr, &ctx).await;

        match &outcome {
            Ok(result) if result.converged() => {
                debug!("Project converged");
                cr.status.set_condition(Condition::reconcile_success());
            }
            Ok(result) => {
                info!(action = result.action.description(), "Reconciliation complete");
                cr.status.set_condition(Condition::reconcile_success());
            }
            Err(e) => {
                warn!(error = %e, "Reconciliation failed");
                cr.status.set_condition(Condition::reconcile_error(e.to_string()));
            }
        }

        outcome
    }

    /// Reconcile many records, at most `max_concurrent` at a time.
    ///
    /// Results come back in input order, paired with the record name.
    pub async fn reconcile_all(
        &self,
        records: &mut [Project],
        ctx: &PassContext,
    ) -> Vec<(String, Result<ReconcileResult>)> {
        info!(
            records = records.len(),
            max_concurrent = self.config.max_concurrent,
            "Starting reconciliation"
        );

        stream::iter(records.iter_mut())
            .map(|cr| async move {
                let result = self.reconcile(cr, ctx).await;
                (cr.name().to_string(), result)
            })
            .buffered(self.config.max_concurrent.max(1))
            .collect()
            .await
    }

    async fn pass(&self, cr: &mut Project, ctx: &PassContext) -> Result<ReconcileResult> {
        let external = self.connector.connect(cr, ctx).await?;
        let observation = external.observe(cr).await?;

        let action = ReconcileAction::decide(cr.metadata.deletion_requested, &observation);
        debug!(action = action.description(), "Decided action");

        match action {
            ReconcileAction::Create => {
                external.create(cr).await?;
            }
            ReconcileAction::Update => external.update(cr).await?,
            ReconcileAction::Delete => external.delete(cr).await?,
            ReconcileAction::None => {}
        }

        Ok(ReconcileResult {
            action,
            observation,
            external_name: cr.external_name().map(str::to_owned),
            deleted: cr.metadata.deletion_requested && !observation.resource_exists,
        })
    }

    /// Get the connector.
    pub const fn connector(&self) -> &Connector<F> {
        &self.connector
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

/// Builder for Reconciler.
pub struct ReconcilerBuilder<F> {
    factory: F,
    resolver: Option<Arc<dyn ConfigResolver>>,
    config: ReconcilerConfig,
}

impl<F: ClientFactory> ReconcilerBuilder<F> {
    /// Create a new builder around a client factory.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            resolver: None,
            config: ReconcilerConfig::default(),
        }
    }

    /// Set the provider config resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ConfigResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set max concurrent passes.
    #[must_use]
    pub const fn max_concurrent(mut self, max: usize) -> Self {
        self.config.max_concurrent = max;
        self
    }

    /// Bound every pass by `timeout`.
    #[must_use]
    pub const fn pass_timeout(mut self, timeout: Duration) -> Self {
        self.config.pass_timeout = Some(timeout);
        self
    }

    /// Build the reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] without a resolver or with a zero
    /// concurrency limit.
    pub fn build(self) -> Result<Reconciler<F>> {
        let resolver = self
            .resolver
            .ok_or_else(|| Error::invalid_config("Config resolver is required"))?;

        if self.config.max_concurrent == 0 {
            return Err(Error::invalid_config("max_concurrent must be at least 1"));
        }

        Ok(Reconciler::new(
            Connector::new(resolver, self.factory),
            self.config,
        ))
    }
}
