//! The time-tracking service as the views see it: a read-only snapshot plus
//! a handful of mutations.

mod dev;
mod remote;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub use dev::DevBackend;
pub use remote::TogglBackend;
pub use toggl::{Project, Tag, TimeEntry};

use crate::grammar::ParsedEntry;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Toggl(#[from] toggl::TogglError),
    #[error("time entry {0} not found")]
    EntryNotFound(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub workspace_id: i64,
    pub timezone: Tz,
}

/// Everything the views read, fetched up front and replaced on refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub profile: Profile,
    pub projects: Vec<Project>,
    pub tags: Vec<Tag>,
    /// Sorted by start time, oldest first.
    pub time_entries: Vec<TimeEntry>,
}

/// Backend ids for the names in a parsed entry. Names that resolve to
/// nothing are listed in `misses`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub project_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub misses: Vec<String>,
}

impl Snapshot {
    pub fn new(
        profile: Profile,
        projects: Vec<Project>,
        tags: Vec<Tag>,
        mut time_entries: Vec<TimeEntry>,
    ) -> Self {
        time_entries.sort_by_key(|e| e.start);
        Self {
            profile,
            projects,
            tags,
            time_entries,
        }
    }

    pub fn project(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        let name = name.trim().to_lowercase();
        self.projects.iter().find(|p| p.name.to_lowercase() == name)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        let name = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.name.to_lowercase() == name)
    }

    pub fn resolve(&self, entry: &ParsedEntry) -> Resolved {
        let mut resolved = Resolved::default();

        if let Some(name) = entry.project() {
            match self.project_by_name(name) {
                Some(project) => resolved.project_id = Some(project.id),
                None => resolved.misses.push(format!("@{}", name)),
            }
        }

        for name in entry.tags() {
            match self.tag_by_name(name) {
                Some(tag) if !resolved.tag_ids.contains(&tag.id) => resolved.tag_ids.push(tag.id),
                Some(_) => {}
                None => resolved.misses.push(format!("#{}", name)),
            }
        }

        resolved
    }
}

#[async_trait]
pub trait Backend: Send {
    fn snapshot(&self) -> &Snapshot;

    /// Re-fetch the snapshot.
    async fn refresh(&mut self) -> Result<(), BackendError>;

    async fn start_entry(
        &mut self,
        workspace_id: i64,
        description: &str,
        start: DateTime<Utc>,
        project_id: Option<i64>,
        tag_ids: &[i64],
    ) -> Result<TimeEntry, BackendError>;

    async fn stop_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError>;

    /// Start a new running entry copying `entry`'s description, project and tags.
    async fn continue_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError>;
}
