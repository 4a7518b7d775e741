use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    domain::{MeWithRelatedData, NewTimeEntry, TimeEntry},
    Credentials, TogglURL,
};

#[derive(Debug, Clone)]
pub struct TogglClient {
    credentials: Credentials,
    base_url: TogglURL,
    http: reqwest::Client,
}

impl TogglClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, TogglURL::default())
    }

    pub fn with_base_url(credentials: Credentials, base_url: TogglURL) -> Self {
        Self {
            credentials,
            base_url,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, url: &TogglURL) -> RequestBuilder {
        self.http
            .request(method, url.as_ref())
            .header(AUTHORIZATION, self.credentials.as_authorization_header())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TogglError> {
        let resp = request
            .send()
            .await
            .map_err(|e| TogglError::ResponseError(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TogglError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TogglError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        resp.json::<T>().await.map_err(|e| {
            TogglError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// Fetch the profile together with projects, tags and recent time entries.
    pub async fn fetch_me_with_related_data(&self) -> Result<MeWithRelatedData, TogglError> {
        let url = self
            .base_url
            .append_path("/me")
            .with_query("with_related_data", "true");

        let data: MeWithRelatedData = self.send(self.request(Method::GET, &url)).await?;
        tracing::debug!(
            projects = data.projects.len(),
            tags = data.tags.len(),
            time_entries = data.time_entries.len(),
            "fetched toggl profile"
        );
        Ok(data)
    }

    pub async fn start_time_entry(&self, entry: &NewTimeEntry) -> Result<TimeEntry, TogglError> {
        let url = self
            .base_url
            .append_path(&format!("/workspaces/{}/time_entries", entry.workspace_id));

        let created: TimeEntry = self
            .send(self.request(Method::POST, &url).json(entry))
            .await?;
        tracing::info!(id = created.id, "started time entry");
        Ok(created)
    }

    pub async fn stop_time_entry(&self, entry: &TimeEntry) -> Result<TimeEntry, TogglError> {
        let url = self.base_url.append_path(&format!(
            "/workspaces/{}/time_entries/{}/stop",
            entry.workspace_id, entry.id
        ));

        let stopped: TimeEntry = self.send(self.request(Method::PATCH, &url)).await?;
        tracing::info!(id = stopped.id, "stopped time entry");
        Ok(stopped)
    }

    /// Start a new running entry with the same description, project and tags.
    pub async fn continue_time_entry(
        &self,
        entry: &TimeEntry,
        start: chrono::DateTime<chrono::Utc>,
    ) -> Result<TimeEntry, TogglError> {
        let body = NewTimeEntry::running(
            entry.workspace_id,
            entry.description.clone().unwrap_or_default(),
            start,
            entry.project_id,
            entry.tag_ids.clone(),
        );
        self.start_time_entry(&body).await
    }
}

#[derive(Error, Debug)]
pub enum TogglError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}
