//! In-memory Projects API for tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::api::ProjectsApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::factory::ClientFactory;
use crate::models::{CreateProjectBody, Project};

/// The four calls of the Projects API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    projects: BTreeMap<String, Project>,
    next_id: u64,
    calls: HashMap<ApiOperation, usize>,
    failures: HashMap<ApiOperation, (u16, String)>,
    last_update: Option<Project>,
}

/// Projects API backed by a map, with call counting and failure injection.
#[derive(Debug)]
pub struct InMemoryProjectsApi {
    state: RwLock<State>,
    latency: Option<Duration>,
}

impl Default for InMemoryProjectsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProjectsApi {
    /// Create an empty API whose generated ids start at `p-1`.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                next_id: 1,
                ..State::default()
            }),
            latency: None,
        }
    }

    /// Start generated ids at `p-{start}`.
    #[must_use]
    pub fn with_id_start(mut self, start: u64) -> Self {
        self.state.get_mut().next_id = start;
        self
    }

    /// Delay every call by `latency` before it takes effect.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a project as if it existed remotely.
    pub async fn insert(&self, project: Project) {
        self.state
            .write()
            .await
            .projects
            .insert(project.id.clone(), project);
    }

    /// Remove a project out of band.
    pub async fn remove(&self, id: &str) -> Option<Project> {
        self.state.write().await.projects.remove(id)
    }

    /// Current remote representation of a project.
    pub async fn project(&self, id: &str) -> Option<Project> {
        self.state.read().await.projects.get(id).cloned()
    }

    /// Number of projects held.
    pub async fn len(&self) -> usize {
        self.state.read().await.projects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Make every subsequent `operation` fail with the given HTTP status.
    pub async fn fail(&self, operation: ApiOperation, status: u16, body: impl Into<String>) {
        self.state
            .write()
            .await
            .failures
            .insert(operation, (status, body.into()));
    }

    /// Stop failing `operation`.
    pub async fn clear_failure(&self, operation: ApiOperation) {
        self.state.write().await.failures.remove(&operation);
    }

    /// How many times `operation` was called, including failed calls.
    pub async fn calls(&self, operation: ApiOperation) -> usize {
        self.state
            .read()
            .await
            .calls
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Body of the most recent successful update.
    pub async fn last_update(&self) -> Option<Project> {
        self.state.read().await.last_update.clone()
    }

    /// Count the call, apply latency, then surface any injected failure.
    async fn enter(&self, operation: ApiOperation) -> ApiResult<()> {
        *self
            .state
            .write()
            .await
            .calls
            .entry(operation)
            .or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.state.read().await.failures.get(&operation) {
            Some((status, body)) => Err(ApiError::status(*status, body.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProjectsApi for InMemoryProjectsApi {
    async fn get_project(&self, id: &str) -> ApiResult<Project> {
        self.enter(ApiOperation::Get).await?;
        self.project(id)
            .await
            .ok_or_else(|| ApiError::not_found(id))
    }

    async fn create_project(&self, body: &CreateProjectBody) -> ApiResult<Project> {
        self.enter(ApiOperation::Create).await?;

        let mut state = self.state.write().await;
        let id = format!("p-{}", state.next_id);
        state.next_id = state.next_id.saturating_add(1);

        let project = Project {
            id: id.clone(),
            name: body.name.clone(),
            labels: body.labels.clone(),
            status: "Active".to_string(),
            creation_timestamp: Some(Utc::now()),
            ..Default::default()
        };
        state.projects.insert(id.clone(), project.clone());
        debug!(id = %id, name = %body.name, "In-memory project created");

        Ok(project)
    }

    async fn update_project(&self, id: &str, project: &Project) -> ApiResult<()> {
        self.enter(ApiOperation::Update).await?;

        let mut state = self.state.write().await;
        let stored = state
            .projects
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(id))?;
        stored.name.clone_from(&project.name);
        stored.labels.clone_from(&project.labels);
        stored.annotations.clone_from(&project.annotations);
        state.last_update = Some(project.clone());

        Ok(())
    }

    async fn delete_project(&self, id: &str) -> ApiResult<()> {
        self.enter(ApiOperation::Delete).await?;

        self.state
            .write()
            .await
            .projects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(id))
    }
}

/// Factory handing out the same shared [`InMemoryProjectsApi`] to every pass.
#[derive(Debug)]
pub struct InMemoryClientFactory {
    api: Arc<InMemoryProjectsApi>,
    connections: AtomicUsize,
    last_endpoint: Mutex<Option<Url>>,
}

impl InMemoryClientFactory {
    pub fn new(api: Arc<InMemoryProjectsApi>) -> Self {
        Self {
            api,
            connections: AtomicUsize::new(0),
            last_endpoint: Mutex::new(None),
        }
    }

    /// The shared API.
    pub fn api(&self) -> &Arc<InMemoryProjectsApi> {
        &self.api
    }

    /// Number of clients handed out.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Endpoint of the most recently built client.
    pub fn last_endpoint(&self) -> Option<Url> {
        self.last_endpoint
            .lock()
            .map_or(None, |endpoint| endpoint.clone())
    }
}

impl ClientFactory for InMemoryClientFactory {
    type Api = Arc<InMemoryProjectsApi>;

    fn new_client(&self, config: ClientConfig) -> ApiResult<Self::Api> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut endpoint) = self.last_endpoint.lock() {
            *endpoint = Some(config.endpoint);
        }
        Ok(Arc::clone(&self.api))
    }
}
