use anyhow::Result;

use crate::backend::Backend;
use crate::config::TogglRofiConfig;
use crate::picker::Picker;
use crate::views::{Outcome, Step, View, ViewError, ViewMachine};

/// Drive the views from the list until the session is done.
///
/// Parse errors are shown and end the session quietly; backend errors are
/// shown and then returned.
pub async fn run_session<P: Picker, B: Backend>(
    picker: &mut P,
    backend: &mut B,
    config: &TogglRofiConfig,
) -> Result<Outcome> {
    let keymap = config.keys.keymap()?;
    let mut machine = ViewMachine::new(picker, backend, keymap)
        .with_lines(config.list_lines)
        .with_matching(config.matching);
    let mut view = View::List { filter: None };

    loop {
        let step = match machine.step(view).await {
            Ok(step) => step,
            Err(err) => return fail(&mut machine, err).await,
        };

        view = match step {
            Step {
                next: View::Done(outcome),
                ..
            } => return Ok(outcome),
            Step { next, refresh } => {
                if refresh {
                    tracing::debug!("refreshing snapshot");
                    if let Err(err) = machine.refresh().await {
                        return fail(&mut machine, err).await;
                    }
                }
                next
            }
        };
    }
}

async fn fail<P: Picker, B: Backend>(
    machine: &mut ViewMachine<'_, P, B>,
    err: ViewError,
) -> Result<Outcome> {
    if !err.is_user_facing() {
        return Err(err.into());
    }

    tracing::warn!("{}", err);
    machine.show_error(&err).await?;
    match err {
        ViewError::Parse(_) => Ok(Outcome::Cancelled),
        err => Err(err.into()),
    }
}
