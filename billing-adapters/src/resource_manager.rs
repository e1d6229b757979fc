//! Cloud Resource Manager adapter used to enumerate sandbox projects.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use billing_primitives::{FolderId, ProjectId, ProjectSummary};
use serde::Deserialize;
use tracing::debug;

use crate::auth::TokenSource;
use crate::http_client::{ApiClient, ApiConfig};
use crate::traits::{AdapterError, AdapterResult, ProjectDirectory};

/// Production endpoint of the Resource Manager API.
pub const DEFAULT_RESOURCE_MANAGER_URL: &str = "https://cloudresourcemanager.googleapis.com/";

/// Lists projects through `cloudresourcemanager.googleapis.com/v1`.
pub struct ResourceManagerClient {
    api: ApiClient,
}

impl fmt::Debug for ResourceManagerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManagerClient")
            .field("api", &self.api)
            .finish()
    }
}

impl ResourceManagerClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the HTTPS client cannot be built.
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenSource>) -> AdapterResult<Self> {
        Ok(Self {
            api: ApiClient::new("resourcemanager", config, tokens)?,
        })
    }
}

#[async_trait]
impl ProjectDirectory for ResourceManagerClient {
    async fn list_folder_projects(&self, folder: &FolderId) -> AdapterResult<Vec<ProjectSummary>> {
        let filter = folder_filter(folder);
        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let uri = self.api.uri(&list_path(&filter, page_token.as_deref()))?;
            let page: ListProjectsPage = self.api.get_json(uri).await?;
            debug!(folder = %folder, count = page.projects.len(), "listed project page");

            for project in page.projects {
                projects.push(project.into_summary()?);
            }

            match page.next_page_token {
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    return Err(AdapterError::response(format!(
                        "project listing repeated page token `{token}`"
                    )));
                }
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(projects)
    }
}

fn folder_filter(folder: &FolderId) -> String {
    format!("parent.type:folder AND parent.id={folder}")
}

fn list_path(filter: &str, page_token: Option<&str>) -> String {
    let mut path = format!("v1/projects?filter={}", urlencoding::encode(filter));
    if let Some(token) = page_token {
        path.push_str("&pageToken=");
        path.push_str(&urlencoding::encode(token));
    }
    path
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsPage {
    #[serde(default)]
    projects: Vec<ProjectResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResource {
    project_id: String,
    #[serde(default)]
    project_number: Option<String>,
    #[serde(default)]
    lifecycle_state: Option<String>,
}

impl ProjectResource {
    fn into_summary(self) -> AdapterResult<ProjectSummary> {
        let id = ProjectId::new(self.project_id)
            .map_err(|err| AdapterError::response(format!("project listing returned {err}")))?;
        let mut summary = ProjectSummary::new(id);
        if let Some(number) = self.project_number {
            summary = summary.with_project_number(number);
        }
        if let Some(state) = self.lifecycle_state {
            summary = summary.with_lifecycle_state(state);
        }
        Ok(summary)
    }
}
