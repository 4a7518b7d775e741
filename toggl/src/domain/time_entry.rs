use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A time entry as returned by the Toggl Track v9 API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    pub workspace_id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
    /// Seconds for stopped entries; negative while the entry is running.
    pub duration: i64,
    /// Tag names.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_ids: Vec<i64>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.stop.is_none() || self.duration < 0
    }

    /// Accumulated seconds, counting up to `now` for a running entry.
    pub fn active_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_running() {
            (now - self.start).num_seconds().max(0)
        } else {
            self.duration.max(0)
        }
    }

    /// End of the entry, or `now` if it is still running.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.stop {
            Some(stop) if !self.is_running() => stop,
            _ => now,
        }
    }
}

/// Body for `POST /workspaces/{wid}/time_entries`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTimeEntry {
    pub created_with: &'static str,
    pub description: String,
    pub workspace_id: i64,
    pub project_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub start: DateTime<Utc>,
    /// `-1` starts a running entry.
    pub duration: i64,
}

impl NewTimeEntry {
    pub fn running(
        workspace_id: i64,
        description: impl Into<String>,
        start: DateTime<Utc>,
        project_id: Option<i64>,
        tag_ids: Vec<i64>,
    ) -> Self {
        Self {
            created_with: "toggl-rofi",
            description: description.into(),
            workspace_id,
            project_id,
            tag_ids,
            start,
            duration: -1,
        }
    }
}
