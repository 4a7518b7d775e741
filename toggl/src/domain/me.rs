use serde::Deserialize;

use super::{null_as_default, Project, Tag, TimeEntry};

/// The current user, as returned by `GET /me`.
#[derive(Debug, Clone, Deserialize)]
pub struct Me {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub fullname: String,
    /// IANA timezone name, e.g. `Europe/Stockholm`.
    #[serde(default)]
    pub timezone: Option<String>,
    pub default_workspace_id: i64,
}

/// `GET /me?with_related_data=true`: the profile plus everything the
/// picker needs in one round trip.
#[derive(Debug, Clone, Deserialize)]
pub struct MeWithRelatedData {
    #[serde(flatten)]
    pub me: Me,
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_entries: Vec<TimeEntry>,
}
