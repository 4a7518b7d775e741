use crate::backend::Backend;
use crate::grammar::{parse, serialize, ParsedEntry};
use crate::picker::{Keymap, OutputFormat, Picker, PickerConfig, PickerOutcome};
use crate::render::render_edit_rows;

use super::{Outcome, Step, View, ViewContext, ViewError, ViewMachine};

/// Show the entry summary with its canonical text in the filter. Whatever
/// is in the filter on accept is parsed again and started.
pub(super) async fn step<P: Picker, B: Backend>(
    machine: &mut ViewMachine<'_, P, B>,
    entry: Option<ParsedEntry>,
) -> Result<Step, ViewError> {
    let no_keys = Keymap::empty();
    let ctx = ViewContext::new(entry, &no_keys);

    let rows = render_edit_rows(ctx.current_entry.as_ref(), machine.backend.snapshot());
    let config = machine.configure(
        PickerConfig::new()
            .prompt("Edit")
            .markup_rows()
            .format(OutputFormat::Filter)
            .filter(ctx.current_entry.as_ref().map(serialize))
            .keymap(ctx.keymap),
    );
    let response = machine.picker.prompt(&config, &rows).await?;

    match response.outcome() {
        PickerOutcome::Accept => {
            let parsed = parse(&response.text().unwrap_or_default())?;
            let started = machine.start(&parsed).await?;
            Ok(Step::to(View::Done(Outcome::Started(started))))
        }
        PickerOutcome::Cancel => Ok(Step::to(View::Done(Outcome::Cancelled))),
        // No keys are bound here, but rofi still has its kb-custom defaults.
        PickerOutcome::Custom(index) => {
            tracing::debug!(index, "ignoring custom key in the edit view");
            Ok(Step::to(View::Edit {
                entry: ctx.current_entry,
            }))
        }
        PickerOutcome::Unknown(code) => Err(ViewError::UnexpectedExit(code)),
    }
}
