//! Modal views driven through the picker: List, Edit and the message views.
//!
//! Each call to [`ViewMachine::step`] shows exactly one picker and decides
//! the next view from its response. The runtime owns the loop.

mod edit;
mod list;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::backend::{Backend, BackendError, TimeEntry};
use crate::grammar::{ParseError, ParsedEntry};
use crate::picker::{Keymap, KeymapError, Matching, Picker, PickerConfig, PickerError};
use crate::render::{render_error, render_help};

/// Custom keys available in the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKey {
    Edit,
    Help,
    Refresh,
}

impl ListKey {
    pub fn describe(self) -> &'static str {
        match self {
            ListKey::Edit => "Edit the selected entry before starting it",
            ListKey::Help => "Show this help",
            ListKey::Refresh => "Reload entries from the server",
        }
    }
}

pub const DEFAULT_EDIT_KEY: &str = "Alt+Meta+Return";
pub const DEFAULT_HELP_KEY: &str = "Alt+Meta+h";
pub const DEFAULT_REFRESH_KEY: &str = "Alt+Meta+r";

const WINDOW_TITLE: &str = "toggl-rofi";

pub fn list_keymap(edit: &str, help: &str, refresh: &str) -> Result<Keymap<ListKey>, KeymapError> {
    Keymap::new([
        (ListKey::Edit, edit),
        (ListKey::Help, help),
        (ListKey::Refresh, refresh),
    ])
}

#[derive(Debug)]
pub enum Outcome {
    Started(TimeEntry),
    Cancelled,
}

#[derive(Debug)]
pub enum View {
    List { filter: Option<String> },
    Edit { entry: Option<ParsedEntry> },
    /// Key help, then back to the list with `filter`.
    Help { filter: Option<String> },
    Done(Outcome),
}

/// The next view, and whether the backend snapshot must be refreshed first.
#[derive(Debug)]
pub struct Step {
    pub next: View,
    pub refresh: bool,
}

impl Step {
    fn to(next: View) -> Self {
        Self {
            next,
            refresh: false,
        }
    }

    fn refresh_then(next: View) -> Self {
        Self {
            next,
            refresh: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("could not read entry: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Picker(#[from] PickerError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("picker exited with unexpected code {0}")]
    UnexpectedExit(i32),
}

impl ViewError {
    /// Errors worth showing in the picker before the session ends.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ViewError::Parse(_) | ViewError::Backend(_))
    }
}

/// State that lives only while one view is shown: the entry it works on
/// and the keys its picker binds.
#[derive(Debug)]
pub struct ViewContext<'k> {
    pub current_entry: Option<ParsedEntry>,
    pub keymap: &'k Keymap<ListKey>,
}

impl<'k> ViewContext<'k> {
    pub fn new(current_entry: Option<ParsedEntry>, keymap: &'k Keymap<ListKey>) -> Self {
        Self {
            current_entry,
            keymap,
        }
    }
}

/// A picker with no rows, only a message. Any exit closes it.
fn message_config(prompt: &str, message: String) -> PickerConfig {
    PickerConfig::new()
        .prompt(prompt)
        .message(message)
        .no_custom()
        .window_title(WINDOW_TITLE)
}

/// Show an error raised before any view could run, such as a rejected API
/// token, so it is not lost in the log file.
pub async fn show_startup_error<P: Picker>(
    picker: &mut P,
    message: &str,
) -> Result<(), PickerError> {
    picker
        .prompt(&message_config("Error", render_error(message)), &[])
        .await?;
    Ok(())
}

pub struct ViewMachine<'a, P, B> {
    picker: &'a mut P,
    backend: &'a mut B,
    keymap: Keymap<ListKey>,
    lines: Option<u32>,
    matching: Matching,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, P: Picker, B: Backend> ViewMachine<'a, P, B> {
    pub fn new(picker: &'a mut P, backend: &'a mut B, keymap: Keymap<ListKey>) -> Self {
        Self {
            picker,
            backend,
            keymap,
            lines: None,
            matching: Matching::default(),
            clock: Utc::now,
        }
    }

    pub fn with_lines(mut self, lines: Option<u32>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_matching(mut self, matching: Matching) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Settings shared by every picker the views open.
    fn configure(&self, config: PickerConfig) -> PickerConfig {
        let config = config.window_title(WINDOW_TITLE);
        match self.lines {
            Some(lines) => config.lines(lines),
            None => config,
        }
    }

    /// Show one picker for `view` and decide what comes next.
    pub async fn step(&mut self, view: View) -> Result<Step, ViewError> {
        match view {
            View::List { filter } => list::step(self, filter).await,
            View::Edit { entry } => edit::step(self, entry).await,
            View::Help { filter } => {
                let help = render_help(
                    self.keymap
                        .iter()
                        .map(|(action, chord)| (chord, action.describe())),
                );
                self.show_message("Help", help).await?;
                Ok(Step::to(View::List { filter }))
            }
            View::Done(outcome) => Ok(Step::to(View::Done(outcome))),
        }
    }

    pub async fn refresh(&mut self) -> Result<(), ViewError> {
        self.backend.refresh().await?;
        Ok(())
    }

    pub async fn show_error(&mut self, error: &ViewError) -> Result<(), ViewError> {
        self.show_message("Error", render_error(&error.to_string()))
            .await
    }

    async fn show_message(&mut self, prompt: &str, message: String) -> Result<(), ViewError> {
        let config = self.configure(message_config(prompt, message));
        self.picker.prompt(&config, &[]).await?;
        Ok(())
    }

    /// Resolve names against the snapshot and start a running entry.
    async fn start(&mut self, entry: &ParsedEntry) -> Result<TimeEntry, ViewError> {
        let snapshot = self.backend.snapshot();
        let resolved = snapshot.resolve(entry);
        let workspace_id = snapshot.profile.workspace_id;
        for miss in &resolved.misses {
            tracing::warn!("{} does not match any project or tag, leaving it out", miss);
        }

        let started = self
            .backend
            .start_entry(
                workspace_id,
                entry.description(),
                self.now(),
                resolved.project_id,
                &resolved.tag_ids,
            )
            .await?;
        tracing::info!(id = started.id, "started time entry from {:?}", entry.original());
        Ok(started)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use crate::picker::{
        Picker, PickerConfig, PickerError, PickerHandle, PickerItem, PickerResponse,
        CUSTOM_EXIT_CODE_BASE,
    };

    /// What the scripted user does with the next picker.
    #[derive(Debug, Clone)]
    pub enum Reply {
        /// Accept row `n`.
        Pick(usize),
        /// Type text and accept it.
        Type(String),
        /// Press custom key `key`, with row `row` highlighted if any.
        Key { key: usize, row: Option<usize> },
        /// Press custom key `key` after typing `text`.
        KeyWithText { key: usize, text: String },
        Cancel,
        /// Exit with a raw code and no output.
        Exit(i32),
    }

    /// A picker that answers from a script and records what it was shown.
    #[derive(Debug, Default)]
    pub struct ScriptedPicker {
        replies: VecDeque<Reply>,
        pub shown: Vec<(PickerConfig, Vec<PickerItem>)>,
        generation: u64,
    }

    impl ScriptedPicker {
        pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                ..Self::default()
            }
        }

        pub fn prompts(&self) -> Vec<Option<&str>> {
            self.shown
                .iter()
                .map(|(config, _)| config.prompt.as_deref())
                .collect()
        }
    }

    #[async_trait]
    impl Picker for ScriptedPicker {
        async fn display(&mut self, config: &PickerConfig) -> Result<PickerHandle, PickerError> {
            self.generation += 1;
            self.shown.push((config.clone(), Vec::new()));
            Ok(PickerHandle::new(self.generation))
        }

        async fn write_items(
            &mut self,
            _handle: &PickerHandle,
            items: &[PickerItem],
        ) -> Result<(), PickerError> {
            if let Some((_, shown)) = self.shown.last_mut() {
                shown.extend_from_slice(items);
            }
            Ok(())
        }

        async fn read(&mut self, _handle: PickerHandle) -> Result<PickerResponse, PickerError> {
            let items = self
                .shown
                .last()
                .map(|(_, items)| items.clone())
                .unwrap_or_default();
            let written: Vec<String> = items.iter().map(PickerItem::display_line).collect();
            let row_text = |row: usize| written.get(row).cloned().unwrap_or_default();

            let (text, code) = match self.replies.pop_front().unwrap_or(Reply::Cancel) {
                Reply::Pick(row) => (row_text(row), 0),
                Reply::Type(text) => (text, 0),
                Reply::Key { key, row } => (
                    row.map(row_text).unwrap_or_default(),
                    CUSTOM_EXIT_CODE_BASE + key as i32,
                ),
                Reply::KeyWithText { key, text } => (text, CUSTOM_EXIT_CODE_BASE + key as i32),
                Reply::Cancel => (String::new(), 1),
                Reply::Exit(code) => (String::new(), code),
            };
            let raw = (!text.is_empty()).then(|| format!("{text}\n").into_bytes());
            Ok(PickerResponse::new(raw, code, &written))
        }
    }
}
