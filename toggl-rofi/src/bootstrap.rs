use anyhow::{Context, Result};
use toggl::{Credentials, TogglClient};

use crate::backend::TogglBackend;
use crate::config::TogglRofiConfig;
use crate::picker::{Picker, RofiPicker};
use crate::views::show_startup_error;

pub fn picker_from_config(config: &TogglRofiConfig) -> RofiPicker {
    RofiPicker::new(config.rofi_command.clone(), config.rofi_args.iter().cloned())
}

/// Log in with the configured token and fetch the first snapshot.
pub async fn connect_toggl(config: &TogglRofiConfig) -> Result<TogglBackend> {
    let client = TogglClient::new(Credentials::new(config.api_token()?));
    let backend = TogglBackend::connect(client)
        .await
        .context("Could not load data from Toggl Track")?;
    tracing::info!("connected to Toggl Track");
    Ok(backend)
}

/// Show a failed start in the picker. The picker is often launched from a
/// hotkey, where nobody sees stderr.
pub async fn report_startup_error<P: Picker>(picker: &mut P, err: &anyhow::Error) {
    if let Err(show_err) = show_startup_error(picker, &format!("{:#}", err)).await {
        tracing::warn!("could not show startup error: {}", show_err);
    }
}
