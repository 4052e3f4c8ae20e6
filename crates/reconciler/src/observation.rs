//! Mapping of the API representation onto the record's observed state.

use chrono::SecondsFormat;
use metakube_client::Project as ApiProject;

use crate::types::{ProjectObservation, ProjectParameters};

/// Build the observed state from the API representation.
///
/// Fields are copied verbatim; fields the API left out map to their zero value.
pub fn generate_observation(project: &ApiProject) -> ProjectObservation {
    ProjectObservation {
        id: project.id.clone(),
        name: project.name.clone(),
        creation_time: project
            .creation_timestamp
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
        status: project.status.clone(),
        clusters_number: project.clusters_number,
    }
}

/// Fill desired fields the user left unspecified from the observed project.
///
/// Only `None` fields are touched, and only when the API reports a non-empty
/// value. Returns whether anything changed.
pub fn late_initialize(params: &mut ProjectParameters, project: &ApiProject) -> bool {
    let mut changed = false;

    if params.labels.is_none() && !project.labels.is_empty() {
        params.labels = Some(project.labels.clone());
        changed = true;
    }

    if params.annotations.is_none() && !project.annotations.is_empty() {
        params.annotations = Some(project.annotations.clone());
        changed = true;
    }

    changed
}
