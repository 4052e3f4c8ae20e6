//! HTTP implementation of the Projects API.
//!
//! Talks to the MetaKube v1 REST surface:
//!
//! - `GET    {endpoint}/api/v1/projects/{id}`
//! - `POST   {endpoint}/api/v1/projects`
//! - `PUT    {endpoint}/api/v1/projects/{id}`
//! - `DELETE {endpoint}/api/v1/projects/{id}`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::api::ProjectsApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateProjectBody, Project};

/// Projects API client bound to one endpoint and one set of credentials.
///
/// The underlying `reqwest::Client` is a connection pool; clone it into as
/// many `HttpProjectsClient`s as needed instead of building a new one per pass.
#[derive(Debug, Clone)]
pub struct HttpProjectsClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
}

impl HttpProjectsClient {
    /// Create a client with its own transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the transport cannot be built, or
    /// [`ApiError::InvalidEndpoint`] if the endpoint cannot carry path segments.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Self::with_transport(http, config)
    }

    /// Create a client over a shared transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if the endpoint is not an http(s) base URL.
    pub fn with_transport(http: reqwest::Client, config: ClientConfig) -> ApiResult<Self> {
        let endpoint = &config.endpoint;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ApiError::invalid_endpoint(
                endpoint.as_str(),
                format!("unsupported scheme '{}'", endpoint.scheme()),
            ));
        }
        if endpoint.cannot_be_a_base() {
            return Err(ApiError::invalid_endpoint(
                endpoint.as_str(),
                "not a base URL",
            ));
        }

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Build `{endpoint}/api/v1/projects[/{id}]`, keeping any base path of the endpoint.
    fn projects_url(&self, id: Option<&str>) -> ApiResult<Url> {
        let mut url = self.config.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                ApiError::invalid_endpoint(self.config.endpoint.as_str(), "not a base URL")
            })?;
            segments.pop_if_empty().extend(["api", "v1", "projects"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Attach credentials and the per-request timeout.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .timeout(self.config.timeout)
    }

    /// Send a request and map non-success statuses onto [`ApiError`].
    ///
    /// A 404 only means "project not found" when the request addressed a project id.
    async fn send(&self, request: RequestBuilder, id: Option<&str>) -> ApiResult<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ApiError::not_found(id));
            }
        }

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(status = status.as_u16(), error = %e, "Failed to read error body");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(ApiError::status(status.as_u16(), body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
    }
}

#[async_trait]
impl ProjectsApi for HttpProjectsClient {
    #[instrument(skip(self))]
    async fn get_project(&self, id: &str) -> ApiResult<Project> {
        let url = self.projects_url(Some(id))?;
        debug!(url = %url, "Getting project");

        let response = self.send(self.http.get(url), Some(id)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self, body), fields(name = %body.name))]
    async fn create_project(&self, body: &CreateProjectBody) -> ApiResult<Project> {
        let url = self.projects_url(None)?;
        debug!(url = %url, "Creating project");

        let response = self.send(self.http.post(url).json(body), None).await?;
        let project: Project = Self::decode(response).await?;

        info!(id = %project.id, "Project created");
        Ok(project)
    }

    #[instrument(skip(self, project))]
    async fn update_project(&self, id: &str, project: &Project) -> ApiResult<()> {
        let url = self.projects_url(Some(id))?;
        debug!(url = %url, "Updating project");

        self.send(self.http.put(url).json(project), Some(id)).await?;

        info!("Project updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: &str) -> ApiResult<()> {
        let url = self.projects_url(Some(id))?;
        debug!(url = %url, "Deleting project");

        self.send(self.http.delete(url), Some(id)).await?;

        info!("Project deleted");
        Ok(())
    }
}
