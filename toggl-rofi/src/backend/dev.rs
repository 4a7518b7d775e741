use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use super::{Backend, BackendError, Profile, Project, Snapshot, Tag, TimeEntry};

const DEV_WORKSPACE_ID: i64 = 1;

/// In-memory backend for `toggl-rofi dev`.
///
/// Mutations change the store; the snapshot only catches up on `refresh`,
/// the same way the remote backend behaves.
#[derive(Debug, Clone)]
pub struct DevBackend {
    store: Vec<TimeEntry>,
    snapshot: Snapshot,
    next_id: i64,
}

impl DevBackend {
    pub fn new() -> Self {
        Self::with_snapshot(seed_dev_snapshot(Utc::now()))
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let next_id = snapshot
            .time_entries
            .iter()
            .map(|e| e.id)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            store: snapshot.time_entries.clone(),
            snapshot,
            next_id,
        }
    }

    /// Entries including mutations not yet visible in the snapshot.
    pub fn entries(&self) -> &[TimeEntry] {
        &self.store
    }

    fn stop_running(&mut self, now: DateTime<Utc>) {
        for entry in self.store.iter_mut().filter(|e| e.is_running()) {
            entry.stop = Some(now);
            entry.duration = (now - entry.start).num_seconds().max(0);
        }
    }

    fn push_running(
        &mut self,
        description: Option<String>,
        start: DateTime<Utc>,
        project_id: Option<i64>,
        tag_ids: Vec<i64>,
    ) -> TimeEntry {
        let tags = tag_ids
            .iter()
            .filter_map(|id| self.snapshot.tags.iter().find(|t| t.id == *id))
            .map(|t| t.name.clone())
            .collect();
        let entry = TimeEntry {
            id: self.next_id,
            workspace_id: DEV_WORKSPACE_ID,
            project_id,
            description,
            start,
            stop: None,
            duration: -1,
            tags,
            tag_ids,
        };
        self.next_id += 1;
        self.store.push(entry.clone());
        entry
    }
}

impl Default for DevBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for DevBackend {
    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    async fn refresh(&mut self) -> Result<(), BackendError> {
        self.snapshot = Snapshot::new(
            self.snapshot.profile.clone(),
            self.snapshot.projects.clone(),
            self.snapshot.tags.clone(),
            self.store.clone(),
        );
        Ok(())
    }

    async fn start_entry(
        &mut self,
        _workspace_id: i64,
        description: &str,
        start: DateTime<Utc>,
        project_id: Option<i64>,
        tag_ids: &[i64],
    ) -> Result<TimeEntry, BackendError> {
        self.stop_running(start);
        Ok(self.push_running(
            Some(description.to_string()),
            start,
            project_id,
            tag_ids.to_vec(),
        ))
    }

    async fn stop_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError> {
        let now = Utc::now();
        let stored = self
            .store
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or(BackendError::EntryNotFound(entry.id))?;
        if stored.is_running() {
            stored.stop = Some(now);
            stored.duration = (now - stored.start).num_seconds().max(0);
        }
        Ok(stored.clone())
    }

    async fn continue_entry(&mut self, entry: &TimeEntry) -> Result<TimeEntry, BackendError> {
        if !self.store.iter().any(|e| e.id == entry.id) {
            return Err(BackendError::EntryNotFound(entry.id));
        }
        let now = Utc::now();
        self.stop_running(now);
        Ok(self.push_running(
            entry.description.clone(),
            now,
            entry.project_id,
            entry.tag_ids.clone(),
        ))
    }
}

fn seed_dev_snapshot(now: DateTime<Utc>) -> Snapshot {
    let projects = vec![
        Project {
            id: 1,
            workspace_id: DEV_WORKSPACE_ID,
            name: "Acme Website".to_string(),
            color: "#06aaf5".to_string(),
            active: true,
        },
        Project {
            id: 2,
            workspace_id: DEV_WORKSPACE_ID,
            name: "Internal".to_string(),
            color: "#c56bff".to_string(),
            active: true,
        },
        Project {
            id: 3,
            workspace_id: DEV_WORKSPACE_ID,
            name: "Learning".to_string(),
            color: "#e36a00".to_string(),
            active: true,
        },
    ];
    let tags = vec![
        Tag {
            id: 1,
            workspace_id: DEV_WORKSPACE_ID,
            name: "Billable".to_string(),
        },
        Tag {
            id: 2,
            workspace_id: DEV_WORKSPACE_ID,
            name: "Meeting".to_string(),
        },
    ];

    let entry = |id: i64, hours_ago: i64, hours: i64, project_id: i64, tag: Option<(i64, &str)>, note: &str| {
        let start = now - Duration::hours(hours_ago);
        let stop = start + Duration::hours(hours);
        TimeEntry {
            id,
            workspace_id: DEV_WORKSPACE_ID,
            project_id: Some(project_id),
            description: Some(note.to_string()),
            start,
            stop: Some(stop),
            duration: hours * 3600,
            tags: tag.iter().map(|(_, name)| name.to_string()).collect(),
            tag_ids: tag.iter().map(|(id, _)| *id).collect(),
        }
    };

    let time_entries = vec![
        entry(1, 30, 2, 1, Some((1, "Billable")), "Landing page copy"),
        entry(2, 27, 2, 1, Some((1, "Billable")), "Design review"),
        entry(3, 6, 1, 2, Some((2, "Meeting")), "Weekly planning"),
        entry(4, 3, 2, 3, None, "Async Rust chapter"),
    ];

    Snapshot::new(
        Profile {
            workspace_id: DEV_WORKSPACE_ID,
            timezone: Tz::UTC,
        },
        projects,
        tags,
        time_entries,
    )
}
