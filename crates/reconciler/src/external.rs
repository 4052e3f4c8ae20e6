//! Per-pass handle on the external system: observe, create, update, delete.

use metakube_client::{ApiError, CreateProjectBody, Project as ApiProject, ProjectsApi};
use metakube_core::GenericResultExt;
use tracing::{debug, info, instrument, warn};

use crate::compare::is_up_to_date;
use crate::conditions::Condition;
use crate::context::PassContext;
use crate::error::{Error, Result, Stage};
use crate::observation::{generate_observation, late_initialize};
use crate::types::{
    ExternalCreation, ExternalObservation, Project, ProjectObservation, ProjectParameters,
};

/// Connected client for one reconciliation pass.
///
/// Owned by exactly one pass; build a new one through
/// [`Connector::connect`](crate::Connector::connect) for every pass.
#[derive(Debug)]
pub struct External<A> {
    client: A,
    ctx: PassContext,
}

impl<A: ProjectsApi> External<A> {
    /// Wrap a client for a pass running under `ctx`.
    pub const fn new(client: A, ctx: PassContext) -> Self {
        Self { client, ctx }
    }

    /// Get the underlying client.
    pub const fn client(&self) -> &A {
        &self.client
    }

    /// Observe the external project.
    ///
    /// With no external name the project cannot exist remotely and the API is
    /// not contacted. A not-found answer is reported as absent and leaves
    /// `status.atProvider` untouched. On success the observed state is
    /// replaced, unset desired fields are late-initialized and drift is
    /// evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Describe`] for any failure other than not-found, or a
    /// cancellation/deadline error.
    #[instrument(skip_all, fields(project = %cr.name()))]
    pub async fn observe(&self, cr: &mut Project) -> Result<ExternalObservation> {
        let Some(id) = cr.external_name().map(str::to_owned) else {
            debug!("No external name, project not created yet");
            return Ok(ExternalObservation::absent());
        };

        let remote = match self
            .ctx
            .guard(Stage::Observe, self.client.get_project(&id))
            .await?
        {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                debug!(id = %id, "External project not found");
                return Ok(ExternalObservation::absent());
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Describe failed");
                return Err(Error::Describe(e));
            }
        };

        cr.status.at_provider = generate_observation(&remote);
        cr.status.set_condition(Condition::available());

        let current = cr.spec.for_provider.clone();
        late_initialize(&mut cr.spec.for_provider, &remote);

        let observation = ExternalObservation {
            resource_exists: true,
            resource_up_to_date: is_up_to_date(&cr.spec.for_provider, &remote),
            resource_late_initialized: cr.spec.for_provider != current,
        };
        debug!(
            id = %id,
            up_to_date = observation.resource_up_to_date,
            late_initialized = observation.resource_late_initialized,
            "Observed external project"
        );

        Ok(observation)
    }

    /// Create the external project and record its identity.
    ///
    /// Does not re-observe; the next pass picks up the created state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Create`] when the API call fails or returns no id.
    #[instrument(skip_all, fields(project = %cr.name()))]
    pub async fn create(&self, cr: &mut Project) -> Result<ExternalCreation> {
        let body = create_body(&cr.spec.for_provider);

        let created = self
            .ctx
            .guard(Stage::Create, self.client.create_project(&body))
            .await?
            .map_err(Error::Create)
            .tap_err(|e| warn!(error = %e, "Create failed"))?;

        if created.id.is_empty() {
            return Err(Error::Create(ApiError::decode(
                "create response carries no project id",
            )));
        }

        cr.set_external_name(created.id.as_str());
        cr.status.set_condition(Condition::creating());
        info!(id = %created.id, "External project created");

        Ok(ExternalCreation {
            external_name: created.id,
        })
    }

    /// Send the full mutable-field set of the desired state.
    ///
    /// Local state is left as is; the next observation refreshes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalNameNotSet`] without an identity, otherwise
    /// [`Error::Update`] when the API call fails.
    #[instrument(skip_all, fields(project = %cr.name()))]
    pub async fn update(&self, cr: &Project) -> Result<()> {
        let id = cr.external_name().ok_or(Error::ExternalNameNotSet {
            stage: Stage::Update,
        })?;
        let body = update_body(id, &cr.spec.for_provider);

        self.ctx
            .guard(Stage::Update, self.client.update_project(id, &body))
            .await?
            .map_err(Error::Update)
            .tap_err(|e| warn!(id = %id, error = %e, "Update failed"))
            .tap_ok(|_| info!(id = %id, "External project updated"))
    }

    /// Delete the external project and reset the observed state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalNameNotSet`] without an identity, since that
    /// means identity tracking was lost; otherwise [`Error::Delete`] when the
    /// API call fails.
    #[instrument(skip_all, fields(project = %cr.name()))]
    pub async fn delete(&self, cr: &mut Project) -> Result<()> {
        let id = cr
            .external_name()
            .map(str::to_owned)
            .ok_or(Error::ExternalNameNotSet {
                stage: Stage::Delete,
            })?;

        self.ctx
            .guard(Stage::Delete, self.client.delete_project(&id))
            .await?
            .map_err(Error::Delete)
            .tap_err(|e| warn!(id = %id, error = %e, "Delete failed"))
            .tap_ok(|_| info!(id = %id, "External project deleted"))?;

        cr.status.at_provider = ProjectObservation::default();
        cr.status.set_condition(Condition::deleting());

        Ok(())
    }
}

fn create_body(params: &ProjectParameters) -> CreateProjectBody {
    CreateProjectBody {
        name: params.name.clone(),
        labels: params.labels.clone().unwrap_or_default(),
        users: params.users.clone(),
    }
}

fn update_body(id: &str, params: &ProjectParameters) -> ApiProject {
    ApiProject {
        id: id.to_string(),
        name: params.name.clone(),
        labels: params.labels.clone().unwrap_or_default(),
        annotations: params.annotations.clone().unwrap_or_default(),
        ..ApiProject::default()
    }
}
