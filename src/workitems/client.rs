//! HTTP client for the work item REST API.

use super::types::{ListResponse, PatchOperation, TeamIteration, WorkItem, WorkItemExpand, WorkItemFields};
use super::{ServerEntry, ServerSet, WorkItemError};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// REST API version sent with every request.
const API_VERSION: &str = "7.0";

/// Timeout for a single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const JSON_PATCH: &str = "application/json-patch+json";

/// Read-only accessor over the registered servers.
///
/// Cheap to clone: the server list and HTTP client are shared.
#[derive(Debug, Clone)]
pub struct WorkItems {
    servers: Arc<[ServerEntry]>,
    http_client: reqwest::Client,
}

impl WorkItems {
    pub fn new(servers: &ServerSet) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("rexrepl/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            servers: servers.iter().cloned().collect(),
            http_client,
        }
    }

    /// Names of the servers this accessor can reach.
    pub fn server_names(&self) -> impl Iterator<Item = &str> {
        self.servers.iter().map(|s| s.name.as_str())
    }

    /// Fetch a work item by id.
    pub async fn get_work_item(
        &self,
        server: &str,
        id: i64,
        expand: Option<WorkItemExpand>,
    ) -> Result<WorkItem, WorkItemError> {
        let server = self.server(server)?;
        let url = endpoint(server, &["_apis", "wit", "workitems", &id.to_string()])?;

        let mut request = self.request(reqwest::Method::GET, server, url);
        if let Some(expand) = expand {
            request = request.query(&[("$expand", expand.as_str())]);
        }
        debug!(server = %server.name, id, "Fetching work item");
        send(request).await
    }

    /// Create a work item. `team_project` and `work_item_type` are required.
    pub async fn create_work_item(
        &self,
        server: &str,
        fields: &WorkItemFields,
    ) -> Result<WorkItem, WorkItemError> {
        let project = required(&fields.team_project, "team_project")?;
        let work_item_type = required(&fields.work_item_type, "work_item_type")?;

        let server = self.server(server)?;
        let type_segment = format!("${work_item_type}");
        let url = endpoint(server, &[project, "_apis", "wit", "workitems", &type_segment])?;

        let request = self
            .request(reqwest::Method::POST, server, url)
            .header(reqwest::header::CONTENT_TYPE, JSON_PATCH)
            .json(&fields.patch_document());
        debug!(server = %server.name, project, work_item_type, "Creating work item");
        send(request).await
    }

    /// Replace the present fields of an existing work item.
    pub async fn update_work_item(
        &self,
        server: &str,
        id: i64,
        fields: &WorkItemFields,
    ) -> Result<WorkItem, WorkItemError> {
        self.patch(server, id, &fields.patch_document()).await
    }

    /// Link each of `related` to the work item `id` with relation type `link_type`
    /// (e.g. `System.LinkTypes.Hierarchy-Forward`).
    pub async fn add_work_item_relations(
        &self,
        server: &str,
        id: i64,
        related: &[WorkItem],
        link_type: &str,
    ) -> Result<WorkItem, WorkItemError> {
        let document: Vec<PatchOperation> = related
            .iter()
            .map(|item| PatchOperation::add_relation(link_type, &item.url))
            .collect();
        self.patch(server, id, &document).await
    }

    /// Current iterations of a project, optionally scoped to a team.
    pub async fn get_current_team_iterations(
        &self,
        server: &str,
        project: &str,
        team: Option<&str>,
    ) -> Result<Vec<TeamIteration>, WorkItemError> {
        let server = self.server(server)?;
        let mut segments = vec![project];
        segments.extend(team);
        segments.extend(["_apis", "work", "teamsettings", "iterations"]);
        let url = endpoint(server, &segments)?;

        let request = self
            .request(reqwest::Method::GET, server, url)
            .query(&[("$timeframe", "current")]);
        debug!(server = %server.name, project, team, "Fetching current iterations");
        let list: ListResponse<TeamIteration> = send(request).await?;
        Ok(list.value)
    }

    async fn patch(
        &self,
        server: &str,
        id: i64,
        document: &[PatchOperation],
    ) -> Result<WorkItem, WorkItemError> {
        let server = self.server(server)?;
        let url = endpoint(server, &["_apis", "wit", "workitems", &id.to_string()])?;

        let request = self
            .request(reqwest::Method::PATCH, server, url)
            .header(reqwest::header::CONTENT_TYPE, JSON_PATCH)
            .json(document);
        debug!(server = %server.name, id, operations = document.len(), "Patching work item");
        send(request).await
    }

    fn server(&self, name: &str) -> Result<&ServerEntry, WorkItemError> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| WorkItemError::UnknownServer(name.to_string()))
    }

    fn request(&self, method: reqwest::Method, server: &ServerEntry, url: Url) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .basic_auth("", Some(&server.personal_access_token))
            .query(&[("api-version", API_VERSION)])
    }
}

/// Append path segments to a server's base url, percent-encoding each one.
fn endpoint(server: &ServerEntry, segments: &[&str]) -> Result<Url, WorkItemError> {
    let invalid = |reason: String| WorkItemError::InvalidUrl {
        server: server.name.clone(),
        reason,
    };

    let mut url = Url::parse(&server.url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("url cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, WorkItemError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(WorkItemError::MissingField(name))
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, WorkItemError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WorkItemError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
