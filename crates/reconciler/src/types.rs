//! Core types for the reconciler.

use std::collections::BTreeMap;

use metakube_client::ProviderConfigReference;
use serde::{Deserialize, Serialize};

use crate::conditions::{Condition, ConditionType};
use crate::error::{Error, Result};

/// Annotation carrying the external identity of a record.
pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";

/// API version of Project records.
pub const PROJECT_API_VERSION: &str = "projects.metakube.crossplane.io/v1alpha1";

/// Kind of Project records.
pub const PROJECT_KIND: &str = "Project";

/// Record metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Record name, unique per caller.
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Set by the caller once the external resource should no longer exist.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deletion_requested: bool,
}

/// Desired state of a MetaKube project.
///
/// `labels` and `annotations` distinguish "not specified" (`None`) from
/// "explicitly empty"; unspecified fields may be late-initialized from the
/// observed project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParameters {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    /// E-mail addresses granted access when the project is created.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

/// Observed state of a MetaKube project, as last reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectObservation {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// RFC 3339 creation timestamp, empty when the API did not report one.
    #[serde(default)]
    pub creation_time: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub clusters_number: u32,
}

impl ProjectObservation {
    /// Whether this is the empty observation.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Spec of a Project record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default)]
    pub provider_config_ref: ProviderConfigReference,

    pub for_provider: ProjectParameters,
}

/// Status of a Project record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    #[serde(default, skip_serializing_if = "ProjectObservation::is_empty")]
    pub at_provider: ProjectObservation,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ProjectStatus {
    /// Set a condition, replacing any condition of the same type.
    ///
    /// The previous transition time is kept when status and reason are unchanged.
    pub fn set_condition(&mut self, condition: Condition) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) if existing.same_state(&condition) => {
                existing.message = condition.message;
            }
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }

    /// Get the condition of the given type.
    pub fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// A MetaKube Project record: desired spec, external identity and observed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ProjectSpec,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl Project {
    /// Create a record with the given name and desired parameters.
    pub fn new(name: impl Into<String>, for_provider: ProjectParameters) -> Self {
        Self {
            api_version: PROJECT_API_VERSION.to_string(),
            kind: PROJECT_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            spec: ProjectSpec {
                provider_config_ref: ProviderConfigReference::default(),
                for_provider,
            },
            status: ProjectStatus::default(),
        }
    }

    /// Use a different provider config.
    #[must_use]
    pub fn with_provider_config(mut self, name: impl Into<String>) -> Self {
        self.spec.provider_config_ref = ProviderConfigReference::new(name);
        self
    }

    /// Name of the record.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// External identity, if one has been assigned.
    pub fn external_name(&self) -> Option<&str> {
        self.metadata
            .annotations
            .get(EXTERNAL_NAME_ANNOTATION)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Assign the external identity. Returns whether the value changed.
    pub fn set_external_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.external_name() == Some(name.as_str()) {
            return false;
        }
        self.metadata
            .annotations
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), name);
        true
    }

    /// Ask for the external resource to be deleted on the next pass.
    pub fn request_deletion(&mut self) {
        self.metadata.deletion_requested = true;
    }

    /// Check that this record really is a Project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongRecordKind`] for any other kind.
    pub fn ensure_kind(&self) -> Result<()> {
        if self.kind == PROJECT_KIND {
            Ok(())
        } else {
            Err(Error::wrong_record_kind(PROJECT_KIND, &self.kind))
        }
    }
}

/// Untyped record as read from disk, before its kind is known.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEnvelope {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: serde_yaml::Value,
    #[serde(default)]
    pub status: serde_yaml::Value,
}

impl TryFrom<ResourceEnvelope> for Project {
    type Error = Error;

    fn try_from(envelope: ResourceEnvelope) -> Result<Self> {
        if envelope.kind != PROJECT_KIND {
            return Err(Error::wrong_record_kind(PROJECT_KIND, envelope.kind));
        }

        let spec: ProjectSpec = serde_yaml::from_value(envelope.spec)
            .map_err(|e| Error::invalid_record(format!("spec: {e}")))?;
        let status: ProjectStatus = if envelope.status.is_null() {
            ProjectStatus::default()
        } else {
            serde_yaml::from_value(envelope.status)
                .map_err(|e| Error::invalid_record(format!("status: {e}")))?
        };

        Ok(Self {
            api_version: envelope.api_version,
            kind: envelope.kind,
            metadata: envelope.metadata,
            spec,
            status,
        })
    }
}

/// Result of observing the external resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    pub resource_late_initialized: bool,
}

impl ExternalObservation {
    /// Observation of a resource that does not exist.
    pub const fn absent() -> Self {
        Self {
            resource_exists: false,
            resource_up_to_date: false,
            resource_late_initialized: false,
        }
    }

    /// Classify the observation.
    pub const fn presence(&self) -> Presence {
        match (self.resource_exists, self.resource_up_to_date) {
            (false, _) => Presence::Absent,
            (true, false) => Presence::Stale,
            (true, true) => Presence::Current,
        }
    }
}

/// Where an observed resource stands relative to its desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Presence {
    /// No external resource.
    Absent,
    /// Exists but drifted from the desired state.
    Stale,
    /// Exists and matches the desired state.
    Current,
}

/// Result of creating the external resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCreation {
    /// Identity assigned by the external system.
    pub external_name: String,
}

/// Corrective action chosen for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReconcileAction {
    Create,
    Update,
    Delete,
    /// Nothing to do.
    None,
}

impl ReconcileAction {
    /// Choose the action for an observation.
    ///
    /// At most one corrective action is taken per pass.
    pub const fn decide(deletion_requested: bool, observation: &ExternalObservation) -> Self {
        match (deletion_requested, observation.presence()) {
            (true, Presence::Absent) | (false, Presence::Current) => Self::None,
            (true, _) => Self::Delete,
            (false, Presence::Absent) => Self::Create,
            (false, Presence::Stale) => Self::Update,
        }
    }

    /// Get a description of the action.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Create => "create external project",
            Self::Update => "update external project",
            Self::Delete => "delete external project",
            Self::None => "no-op",
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// Action that was taken.
    pub action: ReconcileAction,
    /// Observation the action was based on.
    pub observation: ExternalObservation,
    /// External identity after the pass.
    pub external_name: Option<String>,
    /// Deletion was requested and the external resource is gone.
    pub deleted: bool,
}

impl ReconcileResult {
    /// Whether the external resource matches the desired state without action.
    pub fn converged(&self) -> bool {
        self.action == ReconcileAction::None
    }
}
