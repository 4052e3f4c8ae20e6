//! The CRUD surface of the MetaKube Projects API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{CreateProjectBody, Project};

/// CRUD operations on MetaKube projects, keyed by the server-assigned id.
///
/// Implementations must report a missing project as
/// [`ApiError::NotFound`](crate::ApiError::NotFound) so callers can tell it
/// apart from every other failure.
#[async_trait]
pub trait ProjectsApi: Send + Sync {
    /// Fetch a project by id.
    async fn get_project(&self, id: &str) -> ApiResult<Project>;

    /// Create a project and return its server-side representation.
    async fn create_project(&self, body: &CreateProjectBody) -> ApiResult<Project>;

    /// Replace the mutable fields of an existing project.
    async fn update_project(&self, id: &str, project: &Project) -> ApiResult<()>;

    /// Delete a project.
    async fn delete_project(&self, id: &str) -> ApiResult<()>;
}

#[async_trait]
impl<T: ProjectsApi + ?Sized> ProjectsApi for Arc<T> {
    async fn get_project(&self, id: &str) -> ApiResult<Project> {
        (**self).get_project(id).await
    }

    async fn create_project(&self, body: &CreateProjectBody) -> ApiResult<Project> {
        (**self).create_project(body).await
    }

    async fn update_project(&self, id: &str, project: &Project) -> ApiResult<()> {
        (**self).update_project(id, project).await
    }

    async fn delete_project(&self, id: &str) -> ApiResult<()> {
        (**self).delete_project(id).await
    }
}
