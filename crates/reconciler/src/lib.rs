//! Crossplane-style reconciliation of MetaKube Project records.
//!
//! A pass over one record runs through a small state machine:
//!
//! 1. **Connect**: resolve the referenced provider config and build a client
//! 2. **Observe**: fetch the external project, map it into the record status
//! 3. **Decide**: compare desired against observed state
//! 4. **Act**: create, update or delete the external project, at most once
//!
//! # Key Concepts
//!
//! ## External identity
//!
//! The MetaKube project id is stored in the `crossplane.io/external-name`
//! annotation. A record without it has never been created remotely.
//!
//! ## Late initialization
//!
//! Optional desired fields left unset (`labels`, `annotations`) are filled
//! from the observed project before drift is evaluated.
//!
//! ## Cancellation
//!
//! Every external call runs under a [`PassContext`]. Cancelling its token or
//! passing its deadline aborts the call in flight.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use metakube_client::{FileConfigResolver, HttpClientFactory};
//! use metakube_reconciler::{PassContext, Project, ReconcilerBuilder};
//!
//! let reconciler = ReconcilerBuilder::new(HttpClientFactory::new()?)
//!     .with_resolver(Arc::new(FileConfigResolver::new("/etc/provider-metakube")))
//!     .build()?;
//!
//! let mut project: Project = load_record()?;
//! let result = reconciler.reconcile(&mut project, &PassContext::new()).await?;
//! println!("{}", result.action.description());
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod compare;
pub mod conditions;
pub mod connector;
pub mod context;
pub mod error;
pub mod external;
pub mod observation;
pub mod reconciler;
pub mod types;

// Re-export main types
pub use compare::{is_equal_map, is_equal_string, is_up_to_date};
pub use conditions::{Condition, ConditionReason, ConditionStatus, ConditionType};
pub use connector::Connector;
pub use context::PassContext;
pub use error::{Error, Result, Stage};
pub use external::External;
pub use observation::{generate_observation, late_initialize};
pub use reconciler::{Reconciler, ReconcilerBuilder, ReconcilerConfig};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    EXTERNAL_NAME_ANNOTATION, ExternalCreation, ExternalObservation, ObjectMeta, PROJECT_API_VERSION,
    PROJECT_KIND, Presence, Project, ProjectObservation, ProjectParameters, ProjectSpec,
    ProjectStatus, ReconcileAction, ReconcileResult, ResourceEnvelope,
};
