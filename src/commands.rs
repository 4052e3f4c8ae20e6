//! CLI command handlers.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metakube_client::{ClientFactory, ConfigResolver, FileConfigResolver, HttpClientFactory};
use metakube_core::document;
use metakube_reconciler::{
    Connector, ExternalObservation, PassContext, Project, ProjectObservation, ReconcileResult,
    ReconcilerBuilder, ResourceEnvelope,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::Commands;

/// Output of the `observe` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveOutput {
    pub name: String,
    pub external_name: Option<String>,
    pub observation: ExternalObservation,
    pub at_provider: ProjectObservation,
}

/// Execute a CLI command.
pub async fn execute_command(command: Commands, cancel: CancellationToken) -> Result<()> {
    let ctx = PassContext::new().with_cancellation(cancel);

    match command {
        Commands::Observe {
            record,
            config_dir,
            write,
        } => {
            let output = cmd_observe(
                &record,
                file_resolver(&config_dir),
                http_factory()?,
                write,
                &ctx,
            )
            .await?;
            print_json(&output)
        }

        Commands::Reconcile {
            record,
            config_dir,
            timeout,
        } => {
            let result = cmd_reconcile(
                &record,
                file_resolver(&config_dir),
                http_factory()?,
                timeout.map(Duration::from_secs),
                &ctx,
            )
            .await?;
            print_json(&result)
        }
    }
}

fn file_resolver(dir: &Path) -> Arc<dyn ConfigResolver> {
    Arc::new(FileConfigResolver::new(dir))
}

fn http_factory() -> Result<HttpClientFactory> {
    HttpClientFactory::new().context("Failed to build HTTP transport")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Load a Project record from a YAML file.
fn load_record(path: &Path) -> Result<Project> {
    let envelope: ResourceEnvelope = document::read_yaml(path)
        .with_context(|| format!("Failed to load record {}", path.display()))?;
    Project::try_from(envelope).with_context(|| format!("Invalid record {}", path.display()))
}

fn save_record(path: &Path, cr: &Project) -> Result<()> {
    document::write_yaml(path, cr)
        .with_context(|| format!("Failed to write record {}", path.display()))
}

/// Connect and observe only.
async fn cmd_observe<F: ClientFactory>(
    record: &Path,
    resolver: Arc<dyn ConfigResolver>,
    factory: F,
    write: bool,
    ctx: &PassContext,
) -> Result<ObserveOutput> {
    let mut cr = load_record(record)?;
    info!(project = %cr.name(), "Observing project");

    let connector = Connector::new(resolver, factory);
    let external = connector.connect(&cr, ctx).await?;
    let observation = external.observe(&mut cr).await?;

    if write {
        save_record(record, &cr)?;
    }

    Ok(ObserveOutput {
        name: cr.name().to_string(),
        external_name: cr.external_name().map(str::to_owned),
        observation,
        at_provider: cr.status.at_provider,
    })
}

/// Run one pass and persist the record, also when the pass failed.
async fn cmd_reconcile<F: ClientFactory>(
    record: &Path,
    resolver: Arc<dyn ConfigResolver>,
    factory: F,
    timeout: Option<Duration>,
    ctx: &PassContext,
) -> Result<ReconcileResult> {
    let mut builder = ReconcilerBuilder::new(factory).with_resolver(resolver);
    if let Some(timeout) = timeout {
        builder = builder.pass_timeout(timeout);
    }
    let reconciler = builder.build()?;

    let mut cr = load_record(record)?;
    let outcome = reconciler.reconcile(&mut cr, ctx).await;
    save_record(record, &cr)?;

    outcome.with_context(|| format!("Reconciliation of '{}' failed", cr.name()))
}
