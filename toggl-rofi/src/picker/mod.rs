//! Line protocol for an external row picker (rofi in dmenu mode).
//!
//! Items go to the child's stdin one per line; the child prints the chosen
//! or typed text and reports the action through its exit code.

mod config;
mod item;
mod rofi;

use async_trait::async_trait;
use thiserror::Error;

pub use config::{Keymap, KeymapError, Matching, OutputFormat, PickerConfig, CUSTOM_EXIT_CODE_BASE};
pub use item::{encode_items, PickerItem};
pub use rofi::RofiPicker;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("failed to launch picker `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("picker protocol misuse: {0}")]
    Usage(&'static str),
    #[error("picker I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("picker was terminated by a signal")]
    Terminated,
}

/// Ticket for one displayed picker process.
///
/// Not `Clone`: [`Picker::read`] takes it by value, so a handle can be read
/// at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PickerHandle {
    generation: u64,
}

impl PickerHandle {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the user did, decoded from the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Accept,
    Cancel,
    /// Custom key index, 0-based in keymap order.
    Custom(usize),
    Unknown(i32),
}

impl PickerOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => PickerOutcome::Accept,
            1 => PickerOutcome::Cancel,
            code if code >= CUSTOM_EXIT_CODE_BASE => {
                PickerOutcome::Custom((code - CUSTOM_EXIT_CODE_BASE) as usize)
            }
            code => PickerOutcome::Unknown(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerResponse {
    /// Everything the process wrote to stdout, if anything.
    pub raw_text: Option<Vec<u8>>,
    pub exit_code: i32,
    /// Index of the written item whose text equals the output.
    pub matched: Option<usize>,
}

impl PickerResponse {
    /// Build a response, matching the output against the lines that were written.
    pub fn new(raw_text: Option<Vec<u8>>, exit_code: i32, written: &[String]) -> Self {
        let raw_text = raw_text.filter(|raw| !raw.is_empty());
        let mut response = Self {
            raw_text,
            exit_code,
            matched: None,
        };
        if let Some(text) = response.text() {
            response.matched = written.iter().position(|line| line.trim() == text);
        }
        response
    }

    /// Output decoded as UTF-8 and trimmed; `None` when nothing was printed.
    pub fn text(&self) -> Option<String> {
        let raw = self.raw_text.as_ref()?;
        let text = String::from_utf8_lossy(raw).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    pub fn outcome(&self) -> PickerOutcome {
        PickerOutcome::from_exit_code(self.exit_code)
    }
}

/// One external picker session at a time.
#[async_trait]
pub trait Picker: Send {
    /// Launch a picker, terminating any process still open from an earlier display.
    async fn display(&mut self, config: &PickerConfig) -> Result<PickerHandle, PickerError>;

    /// Write rows, in order, to the picker behind `handle`.
    async fn write_items(
        &mut self,
        handle: &PickerHandle,
        items: &[PickerItem],
    ) -> Result<(), PickerError>;

    /// Wait for the picker to exit and collect its answer.
    async fn read(&mut self, handle: PickerHandle) -> Result<PickerResponse, PickerError>;

    /// Display, write and read in one go.
    async fn prompt(
        &mut self,
        config: &PickerConfig,
        items: &[PickerItem],
    ) -> Result<PickerResponse, PickerError> {
        let handle = self.display(config).await?;
        self.write_items(&handle, items).await?;
        self.read(handle).await
    }
}
