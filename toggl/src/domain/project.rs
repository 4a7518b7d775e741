use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    /// Hex colour, e.g. `#06aaf5`.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_active() -> bool {
    true
}
