use async_trait::async_trait;
use chrono::{DateTime, Utc};
use toggl::{MeWithRelatedData, NewTimeEntry, TimeEntry, TogglClient};

use super::{Backend, BackendError, Profile, Snapshot};
use crate::time_utils::parse_timezone;

/// Backend talking to the Toggl Track API.
#[derive(Debug)]
pub struct TogglBackend {
    client: TogglClient,
    snapshot: Snapshot,
}

impl TogglBackend {
    pub async fn connect(client: TogglClient) -> Result<Self, BackendError> {
        let snapshot = fetch_snapshot(&client).await?;
        Ok(Self { client, snapshot })
    }
}

async fn fetch_snapshot(client: &TogglClient) -> Result<Snapshot, BackendError> {
    let data = client.fetch_me_with_related_data().await?;
    Ok(snapshot_from(data))
}

fn snapshot_from(data: MeWithRelatedData) -> Snapshot {
    let profile = Profile {
        workspace_id: data.me.default_workspace_id,
        timezone: parse_timezone(data.me.timezone.as_deref()),
    };
    let projects = data.projects.into_iter().filter(|p| p.active).collect();
    Snapshot::new(profile, projects, data.tags, data.time_entries)
}

#[async_trait]
impl Backend for TogglBackend {
    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    async fn refresh(&mut self) -> Result<(), BackendError> {
        self.snapshot = fetch_snapshot(&self.client).await?;
        Ok(())
    }

    async fn start_entry(
        &mut self,
        workspace_id: i64,
        description: &str,
        start: DateTime<Utc>,
        project_id: Option<i64>,
        tag_ids: &[i64],
    ) -> Result<TimeEntry, BackendError> {
        let body = NewTimeEntry::running(
            workspace_id,
            description,
            start,
            project_id,
            tag_ids.to_vec(),
        );
        Ok(self.client.start_time_entry(&body).await?)
    }

    async fn stop_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError> {
        Ok(self.client.stop_time_entry(entry).await?)
    }

    async fn continue_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError> {
        Ok(self.client.continue_time_entry(entry, Utc::now()).await?)
    }
}
