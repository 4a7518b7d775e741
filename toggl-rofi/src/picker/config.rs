use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// rofi binds custom keys `kb-custom-1` through `kb-custom-19`.
pub const MAX_CUSTOM_KEYS: usize = 19;
/// Exit code reported for the first custom key.
pub const CUSTOM_EXIT_CODE_BASE: i32 = 10;

/// How typed text filters the rows, as named in rofi's `-matching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Matching {
    Normal,
    Regex,
    Glob,
    #[default]
    Fuzzy,
    Prefix,
}

impl Matching {
    fn as_arg(self) -> &'static str {
        match self {
            Matching::Normal => "normal",
            Matching::Regex => "regex",
            Matching::Glob => "glob",
            Matching::Fuzzy => "fuzzy",
            Matching::Prefix => "prefix",
        }
    }
}

/// What the picker prints on accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The selected row, or the typed text if no row matched.
    Selected,
    /// Whatever is in the filter field.
    Filter,
}

impl OutputFormat {
    fn as_arg(self) -> &'static str {
        match self {
            OutputFormat::Selected => "s",
            OutputFormat::Filter => "f",
        }
    }
}

/// Launch options for one picker display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerConfig {
    pub prompt: Option<String>,
    pub lines: Option<u32>,
    pub case_insensitive: bool,
    pub matching: Option<Matching>,
    pub tokenize: bool,
    pub multi_select: bool,
    /// Markup message shown above the rows.
    pub message: Option<String>,
    /// Text pre-seeded into the filter field.
    pub filter: Option<String>,
    pub markup_rows: bool,
    pub format: Option<OutputFormat>,
    pub no_custom: bool,
    pub window_title: Option<String>,
    /// Chords bound to `kb-custom-1..`, in keymap order.
    pub custom_keys: Vec<String>,
}

impl PickerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn lines(mut self, lines: u32) -> Self {
        self.lines = Some(lines);
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn matching(mut self, matching: Matching) -> Self {
        self.matching = Some(matching);
        self
    }

    pub fn tokenize(mut self) -> Self {
        self.tokenize = true;
        self
    }

    pub fn multi_select(mut self) -> Self {
        self.multi_select = true;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    pub fn markup_rows(mut self) -> Self {
        self.markup_rows = true;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = Some(title.into());
        self
    }

    pub fn no_custom(mut self) -> Self {
        self.no_custom = true;
        self
    }

    pub fn keymap<A: Copy + Eq + fmt::Debug>(mut self, keymap: &Keymap<A>) -> Self {
        self.custom_keys = keymap.chords().map(str::to_string).collect();
        self
    }

    /// Command-line flags for this configuration, one argv entry per value.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |flag: &str, value: &str| {
            args.push(flag.to_string());
            args.push(value.to_string());
        };

        if let Some(prompt) = &self.prompt {
            push("-p", prompt);
        }
        if let Some(lines) = self.lines {
            push("-l", &lines.to_string());
        }
        if let Some(matching) = self.matching {
            push("-matching", matching.as_arg());
        }
        if let Some(message) = &self.message {
            push("-mesg", message);
        }
        if let Some(filter) = &self.filter {
            push("-filter", filter);
        }
        if let Some(format) = self.format {
            push("-format", format.as_arg());
        }
        if let Some(title) = &self.window_title {
            push("-window-title", title);
        }
        for (i, chord) in self.custom_keys.iter().enumerate() {
            push(&format!("-kb-custom-{}", i + 1), chord);
        }

        let switches = [
            ("-i", self.case_insensitive),
            ("-tokenize", self.tokenize),
            ("-multi-select", self.multi_select),
            ("-markup-rows", self.markup_rows),
            ("-no-custom", self.no_custom),
        ];
        args.extend(
            switches
                .into_iter()
                .filter(|(_, on)| *on)
                .map(|(flag, _)| flag.to_string()),
        );

        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("at most 19 custom keys can be bound, got {0}")]
    TooManyKeys(usize),
    #[error("action {0} is bound more than once")]
    DuplicateAction(String),
    #[error("key chord {0:?} is bound more than once")]
    DuplicateChord(String),
    #[error("action {0} has an empty key chord")]
    EmptyChord(String),
}

/// Ordered bindings from actions to key chords.
///
/// The position of a binding is its custom key index, so the mapping from
/// exit code back to action is fixed once the keymap is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap<A> {
    bindings: Vec<(A, String)>,
}

impl<A: Copy + Eq + fmt::Debug> Keymap<A> {
    pub fn new<I, S>(bindings: I) -> Result<Self, KeymapError>
    where
        I: IntoIterator<Item = (A, S)>,
        S: Into<String>,
    {
        let mut validated: Vec<(A, String)> = Vec::new();
        for (action, chord) in bindings {
            let chord = chord.into().trim().to_string();
            if chord.is_empty() {
                return Err(KeymapError::EmptyChord(format!("{action:?}")));
            }
            if validated.iter().any(|(a, _)| *a == action) {
                return Err(KeymapError::DuplicateAction(format!("{action:?}")));
            }
            if validated.iter().any(|(_, c)| *c == chord) {
                return Err(KeymapError::DuplicateChord(chord));
            }
            validated.push((action, chord));
        }

        if validated.len() > MAX_CUSTOM_KEYS {
            return Err(KeymapError::TooManyKeys(validated.len()));
        }

        Ok(Self {
            bindings: validated,
        })
    }

    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn chords(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(_, chord)| chord.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (A, &str)> {
        self.bindings
            .iter()
            .map(|(action, chord)| (*action, chord.as_str()))
    }

    #[cfg(test)]
    pub fn chord(&self, action: A) -> Option<&str> {
        self.iter()
            .find(|(a, _)| *a == action)
            .map(|(_, chord)| chord)
    }

    /// Action bound to custom key `index` (0-based).
    pub fn action_at(&self, index: usize) -> Option<A> {
        self.bindings.get(index).map(|(action, _)| *action)
    }

    pub fn action_for_exit_code(&self, code: i32) -> Option<A> {
        let index = code.checked_sub(CUSTOM_EXIT_CODE_BASE)?;
        usize::try_from(index).ok().and_then(|i| self.action_at(i))
    }
}
