//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// provider-metakube - MetaKube Project reconciler
#[derive(Parser, Debug)]
#[command(name = "provider-metakube")]
#[command(version)]
#[command(about = "Reconcile declarative MetaKube Project records against the MetaKube API")]
#[command(
    long_about = "Reads a Project record from disk, resolves its provider config from a config directory and drives the external MetaKube project towards the desired state."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Observe the external project without changing it
    Observe {
        /// Project record (YAML)
        #[arg(short, long)]
        record: PathBuf,

        /// Directory holding `<provider-config>.toml` files
        #[arg(short, long, default_value = ".")]
        config_dir: PathBuf,

        /// Write the refreshed status back to the record
        #[arg(short, long, default_value_t = false)]
        write: bool,
    },

    /// Run one reconciliation pass and write the record back
    Reconcile {
        /// Project record (YAML)
        #[arg(short, long)]
        record: PathBuf,

        /// Directory holding `<provider-config>.toml` files
        #[arg(short, long, default_value = ".")]
        config_dir: PathBuf,

        /// Abort the pass after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },
}
