use crate::backend::{Backend, Snapshot, TimeEntry};
use crate::grammar::{format_fields, parse, ParsedEntry};
use crate::picker::{OutputFormat, Picker, PickerConfig, PickerOutcome};
use crate::render::{render_header, render_list_rows};

use super::{ListKey, Outcome, Step, View, ViewContext, ViewError, ViewMachine};

pub(super) async fn step<P: Picker, B: Backend>(
    machine: &mut ViewMachine<'_, P, B>,
    filter: Option<String>,
) -> Result<Step, ViewError> {
    let now = machine.now();
    let snapshot = machine.backend.snapshot();
    let tz = snapshot.profile.timezone;
    let rows = render_list_rows(&snapshot.time_entries, &snapshot.projects, tz, now);
    let header = render_header(&snapshot.time_entries, &snapshot.projects, tz, now);

    let mut ctx = ViewContext::new(None, &machine.keymap);
    let config = machine.configure(
        PickerConfig::new()
            .prompt("Entry")
            .case_insensitive()
            .matching(machine.matching)
            .tokenize()
            .markup_rows()
            .format(OutputFormat::Selected)
            .message(header)
            .filter(filter)
            .keymap(ctx.keymap),
    );
    let response = machine.picker.prompt(&config, &rows.items).await?;

    let snapshot = machine.backend.snapshot();
    let selected: Option<TimeEntry> = response
        .matched
        .and_then(|row| rows.entries.get(row))
        .and_then(|&index| snapshot.time_entries.get(index))
        .cloned();
    // Text that matched a row is that row's markup, not something typed.
    let typed = response.text().filter(|_| selected.is_none());

    match response.outcome() {
        PickerOutcome::Cancel => Ok(Step::to(View::Done(Outcome::Cancelled))),
        PickerOutcome::Custom(index) => match ctx.keymap.action_for_exit_code(response.exit_code) {
            Some(ListKey::Edit) => {
                ctx.current_entry = selected.and_then(|entry| seed_from(&entry, snapshot));
                Ok(Step::to(View::Edit {
                    entry: ctx.current_entry,
                }))
            }
            Some(ListKey::Help) => Ok(Step::to(View::Help { filter: typed })),
            Some(ListKey::Refresh) => Ok(Step::refresh_then(View::List { filter: typed })),
            // rofi binds kb-custom keys we never configured; show the list again.
            None => {
                tracing::debug!(index, "ignoring unbound custom key");
                Ok(Step::to(View::List { filter: typed }))
            }
        },
        PickerOutcome::Accept => match (selected, typed) {
            (Some(entry), _) => {
                if entry.is_running() {
                    let stopped = machine.backend.stop_entry(&entry).await?;
                    tracing::info!(id = stopped.id, "stopped time entry");
                } else {
                    let continued = machine.backend.continue_entry(&entry).await?;
                    tracing::info!(id = continued.id, from = entry.id, "continued time entry");
                }
                Ok(Step::refresh_then(View::List { filter: None }))
            }
            (None, Some(text)) => {
                let parsed = parse(&text)?;
                let started = machine.start(&parsed).await?;
                Ok(Step::to(View::Done(Outcome::Started(started))))
            }
            (None, None) => Ok(Step::to(View::Done(Outcome::Cancelled))),
        },
        PickerOutcome::Unknown(code) => Err(ViewError::UnexpectedExit(code)),
    }
}

/// The parsed form of an existing entry, for seeding the edit view.
fn seed_from(entry: &TimeEntry, snapshot: &Snapshot) -> Option<ParsedEntry> {
    let project = entry
        .project_id
        .and_then(|id| snapshot.project(id))
        .map(|p| p.name.as_str());
    let text = format_fields(
        entry.description.as_deref().unwrap_or_default(),
        project,
        entry.tags.as_slice(),
    );
    match parse(&text) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::debug!(id = entry.id, "entry cannot seed the edit view: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Reply, ScriptedPicker};
    use super::super::{list_keymap, DEFAULT_EDIT_KEY, DEFAULT_HELP_KEY, DEFAULT_REFRESH_KEY};
    use super::*;
    use crate::backend::fixtures::{entry, snapshot, utc};
    use crate::backend::DevBackend;
    use crate::picker::{Keymap, Matching};
    use chrono::{DateTime, Utc};

    fn keymap() -> Keymap<ListKey> {
        list_keymap(DEFAULT_EDIT_KEY, DEFAULT_HELP_KEY, DEFAULT_REFRESH_KEY).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        utc(2024, 3, 2, 15, 0)
    }

    /// Oldest first: a stopped entry with tags, then a running one.
    fn backend() -> DevBackend {
        let mut tagged = entry(
            1,
            Some("Write report"),
            Some(10),
            utc(2024, 3, 2, 9, 0),
            Some(utc(2024, 3, 2, 10, 0)),
        );
        tagged.tags = vec!["Urgent".to_string()];
        tagged.tag_ids = vec![100];
        let running = entry(2, Some("Calls"), Some(20), utc(2024, 3, 2, 14, 0), None);
        DevBackend::with_snapshot(snapshot(vec![tagged, running]))
    }

    async fn run_step(
        picker: &mut ScriptedPicker,
        backend: &mut DevBackend,
        filter: Option<String>,
    ) -> Result<Step, ViewError> {
        let mut machine = ViewMachine::new(picker, backend, keymap()).with_clock(fixed_now);
        machine.step(View::List { filter }).await
    }

    #[tokio::test]
    async fn list_picker_is_configured_with_header_and_keys() {
        let mut picker = ScriptedPicker::new([Reply::Cancel]);
        let mut backend = backend();
        run_step(&mut picker, &mut backend, Some("Wri".to_string()))
            .await
            .unwrap();

        let (config, items) = &picker.shown[0];
        assert_eq!(config.prompt.as_deref(), Some("Entry"));
        assert!(config.case_insensitive && config.tokenize && config.markup_rows);
        assert_eq!(config.matching, Some(Matching::Fuzzy));
        assert_eq!(config.filter.as_deref(), Some("Wri"));
        assert_eq!(
            config.custom_keys,
            vec![DEFAULT_EDIT_KEY, DEFAULT_HELP_KEY, DEFAULT_REFRESH_KEY]
        );
        assert!(config.message.as_deref().unwrap().contains("Side Project"));
        assert_eq!(items.len(), 2);
        assert!(items[0].text.contains("Calls"));
    }

    #[tokio::test]
    async fn cancel_ends_the_session() {
        let mut picker = ScriptedPicker::new([Reply::Cancel]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();
        assert!(matches!(step.next, View::Done(Outcome::Cancelled)));
    }

    #[tokio::test]
    async fn typed_text_starts_a_new_entry() {
        let mut picker = ScriptedPicker::new([Reply::Type(
            "Plan sprint @WORK #urgent #unknown".to_string(),
        )]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();

        let View::Done(Outcome::Started(started)) = step.next else {
            panic!("expected a started entry");
        };
        assert_eq!(started.description.as_deref(), Some("Plan sprint"));
        assert_eq!(started.project_id, Some(10));
        assert_eq!(started.tag_ids, vec![100]);
        assert_eq!(started.start, fixed_now());
        assert!(started.is_running());
    }

    #[tokio::test]
    async fn invalid_text_is_a_parse_error() {
        let mut picker = ScriptedPicker::new([Reply::Type("@work #urgent".to_string())]);
        let mut backend = backend();
        let result = run_step(&mut picker, &mut backend, None).await;
        assert!(matches!(result, Err(ViewError::Parse(_))));
        assert_eq!(backend.entries().len(), 2);
    }

    #[tokio::test]
    async fn accepting_the_running_row_stops_it() {
        // Row 0 is the most recent entry, the running one.
        let mut picker = ScriptedPicker::new([Reply::Pick(0)]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();

        assert!(step.refresh);
        assert!(matches!(step.next, View::List { filter: None }));
        assert!(backend.entries().iter().all(|e| !e.is_running()));
    }

    #[tokio::test]
    async fn accepting_a_stopped_row_continues_it() {
        let mut picker = ScriptedPicker::new([Reply::Pick(1)]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();

        assert!(step.refresh);
        let entries = backend.entries();
        assert_eq!(entries.len(), 3);
        let continued = entries.last().unwrap();
        assert!(continued.is_running());
        assert_eq!(continued.description.as_deref(), Some("Write report"));
        assert_eq!(continued.tag_ids, vec![100]);
    }

    #[tokio::test]
    async fn edit_key_seeds_from_the_highlighted_row() {
        let mut picker = ScriptedPicker::new([Reply::Key {
            key: 0,
            row: Some(1),
        }]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();

        let View::Edit { entry: Some(entry) } = step.next else {
            panic!("expected a seeded edit view");
        };
        assert_eq!(entry.description(), "Write report");
        assert_eq!(entry.project(), Some("work"));
        assert_eq!(entry.tags(), ["urgent".to_string()]);
    }

    #[tokio::test]
    async fn edit_key_without_a_row_opens_an_empty_edit() {
        let mut picker = ScriptedPicker::new([Reply::Key { key: 0, row: None }]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();
        assert!(matches!(step.next, View::Edit { entry: None }));
    }

    #[tokio::test]
    async fn help_and_refresh_keep_the_typed_text() {
        let mut picker = ScriptedPicker::new([Reply::KeyWithText {
            key: 1,
            text: "half".to_string(),
        }]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();
        assert!(matches!(step.next, View::Help { filter: Some(ref f) } if f == "half"));

        let mut picker = ScriptedPicker::new([Reply::KeyWithText {
            key: 2,
            text: "half".to_string(),
        }]);
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();
        assert!(step.refresh);
        assert!(matches!(step.next, View::List { filter: Some(ref f) } if f == "half"));
    }

    #[tokio::test]
    async fn unbound_key_shows_the_list_again() {
        // Alt+8 is kb-custom-8 in rofi's defaults, which this view never binds.
        let mut picker = ScriptedPicker::new([Reply::KeyWithText {
            key: 7,
            text: "half".to_string(),
        }]);
        let mut backend = backend();
        let step = run_step(&mut picker, &mut backend, None).await.unwrap();

        assert!(!step.refresh);
        assert!(matches!(step.next, View::List { filter: Some(ref f) } if f == "half"));
        assert_eq!(backend.entries().len(), 2);
    }

    #[tokio::test]
    async fn configured_matching_reaches_the_picker() {
        let mut picker = ScriptedPicker::new([Reply::Cancel]);
        let mut backend = backend();
        let mut machine = ViewMachine::new(&mut picker, &mut backend, keymap())
            .with_clock(fixed_now)
            .with_matching(Matching::Prefix);
        machine.step(View::List { filter: None }).await.unwrap();

        let (config, _) = &picker.shown[0];
        assert_eq!(config.matching, Some(Matching::Prefix));
        assert_eq!(config.format, Some(OutputFormat::Selected));
    }
}
