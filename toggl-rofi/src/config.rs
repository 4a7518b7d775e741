use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::picker::{Keymap, Matching};
use crate::views::{list_keymap, ListKey, DEFAULT_EDIT_KEY, DEFAULT_HELP_KEY, DEFAULT_REFRESH_KEY};

/// Environment variable that takes precedence over `api_token` in the file.
pub const API_TOKEN_ENV: &str = "TOGGL_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TogglRofiConfig {
    /// Toggl Track API token, from Profile settings
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_rofi_command")]
    pub rofi_command: String,
    #[serde(default = "default_rofi_args")]
    pub rofi_args: Vec<String>,
    /// Rows shown in the list; rofi's own default when unset
    #[serde(default)]
    pub list_lines: Option<u32>,
    /// How typed text filters the list: normal, regex, glob, fuzzy or prefix
    #[serde(default)]
    pub matching: Matching,
    #[serde(default)]
    pub keys: KeyBindings,
}

/// Key chords for the list view, in rofi's `kb-custom` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_edit_key")]
    pub edit: String,
    #[serde(default = "default_help_key")]
    pub help: String,
    #[serde(default = "default_refresh_key")]
    pub refresh: String,
}

fn default_rofi_command() -> String {
    "rofi".to_string()
}

fn default_rofi_args() -> Vec<String> {
    vec!["-dmenu".to_string()]
}

fn default_edit_key() -> String {
    DEFAULT_EDIT_KEY.to_string()
}

fn default_help_key() -> String {
    DEFAULT_HELP_KEY.to_string()
}

fn default_refresh_key() -> String {
    DEFAULT_REFRESH_KEY.to_string()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            edit: default_edit_key(),
            help: default_help_key(),
            refresh: default_refresh_key(),
        }
    }
}

impl KeyBindings {
    pub fn keymap(&self) -> Result<Keymap<ListKey>> {
        list_keymap(&self.edit, &self.help, &self.refresh).context("Invalid key bindings in config")
    }
}

impl Default for TogglRofiConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            rofi_command: default_rofi_command(),
            rofi_args: default_rofi_args(),
            list_lines: None,
            matching: Matching::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl TogglRofiConfig {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("toggl-rofi"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("toggl-rofi.log"))
    }

    /// Load config from disk. Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    /// The API token from the environment, falling back to the file.
    pub fn api_token(&self) -> Result<String> {
        let from_env = std::env::var(API_TOKEN_ENV).ok();
        Self::pick_token(from_env, self.api_token.clone()).with_context(|| {
            format!(
                "No Toggl API token. Set {} or api_token in the config file.",
                API_TOKEN_ENV
            )
        })
    }

    fn pick_token(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
        [from_env, from_file]
            .into_iter()
            .flatten()
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
    }
}
