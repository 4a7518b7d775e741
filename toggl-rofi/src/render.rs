//! Pango markup for picker rows and messages.
//!
//! This is the only module that knows about markup; everything it renders
//! from user or backend text goes through [`escape_markup`].

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::backend::{Project, Snapshot, TimeEntry};
use crate::grammar::ParsedEntry;
use crate::picker::PickerItem;
use crate::time_utils::{start_of_day, to_local_time};

const NO_DESCRIPTION: &str = "No description";
const NO_PROJECT: &str = "No Project";
const NO_PROJECT_COLOUR: &str = "#000000";
const UNKNOWN_PROJECT_COLOUR: &str = "#FA1111";
const DATE_WIDTH: usize = 10;
/// Extra room after the widest project name.
const PROJECT_GAP: usize = 5;

pub const CONFIRM_ROW: &str = "<b>Confirm and Start</b>";

pub fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `HH:MM`, truncated to whole minutes.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 3600, seconds / 60 % 60)
}

/// Escape `raw` and pad it to `width` visible characters.
fn pad_escaped(raw: &str, width: usize) -> String {
    let mut padded = escape_markup(raw);
    let fill = width.saturating_sub(raw.chars().count());
    padded.extend(std::iter::repeat(' ').take(fill));
    padded
}

/// Rows for the list view.
#[derive(Debug, Clone, Default)]
pub struct EntryRows {
    pub items: Vec<PickerItem>,
    /// `entries[row]` is the index into the rendered entries for that row.
    pub entries: Vec<usize>,
}

/// Render `entries` (oldest first) as picker rows, most recent on top.
///
/// Each row is labelled with the entry's index in `entries`, so the labels
/// count down from the top row. A date is shown only on the first row of
/// each day.
pub fn render_list_rows(
    entries: &[TimeEntry],
    projects: &[Project],
    tz: Tz,
    now: DateTime<Utc>,
) -> EntryRows {
    let project_of = |entry: &TimeEntry| {
        entry
            .project_id
            .and_then(|id| projects.iter().find(|p| p.id == id))
    };

    let desc_width = entries
        .iter()
        .map(|e| description_of(e).chars().count())
        .max()
        .unwrap_or(0);
    let proj_width = entries
        .iter()
        .map(|e| project_of(e).map_or(NO_PROJECT, |p| p.name.as_str()).chars().count())
        .max()
        .unwrap_or(0)
        + PROJECT_GAP;

    let mut rows = EntryRows::default();
    let mut previous_date: Option<NaiveDate> = None;

    for (index, entry) in entries.iter().enumerate().rev() {
        let start = to_local_time(entry.start, tz);
        let date = start.date_naive();
        let date_label = if previous_date == Some(date) {
            String::new()
        } else {
            date.format("%Y-%m-%d").to_string()
        };
        previous_date = Some(date);

        let stop = match entry.stop {
            Some(stop) if !entry.is_running() => to_local_time(stop, tz).format("%H:%M").to_string(),
            _ => "NOW  ".to_string(),
        };

        let mut text = format!("<span color=\"gray\">{:>2}. </span>", index);
        text.push_str(&pad_escaped(description_of(entry), desc_width));
        match project_of(entry) {
            Some(project) => text.push_str(&format!(
                " @<span color=\"{}\">{}</span>",
                escape_markup(&project.color),
                pad_escaped(&project.name, proj_width)
            )),
            None => text.push_str(&" ".repeat(proj_width + 2)),
        }
        text.push_str(&format!(
            "{:<width$}  {} - {} ({})",
            date_label,
            start.format("%H:%M"),
            stop,
            format_duration(entry.active_seconds(now)),
            width = DATE_WIDTH
        ));

        let mut item = PickerItem::new(text).with_info(entry.id.to_string());
        if !entry.tags.is_empty() {
            item = item.with_meta(entry.tags.join(" "));
        }
        rows.items.push(item);
        rows.entries.push(index);
    }

    rows
}

fn description_of(entry: &TimeEntry) -> &str {
    entry
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(NO_DESCRIPTION)
}

/// Time per project for the local day containing `now`, largest first.
pub fn render_header(
    entries: &[TimeEntry],
    projects: &[Project],
    tz: Tz,
    now: DateTime<Utc>,
) -> String {
    let day_start = start_of_day(now, tz);

    let mut totals: Vec<(Option<i64>, i64)> = Vec::new();
    for entry in entries {
        if entry.end_or(now) <= day_start {
            continue;
        }
        let mut seconds = entry.active_seconds(now);
        if entry.start < day_start {
            seconds -= (day_start - entry.start).num_seconds();
        }
        if seconds <= 0 {
            continue;
        }
        match totals.iter_mut().find(|(id, _)| *id == entry.project_id) {
            Some((_, total)) => *total += seconds,
            None => totals.push((entry.project_id, seconds)),
        }
    }

    if totals.is_empty() {
        return "<i>No time tracked today</i>".to_string();
    }

    let mut lines: Vec<(i64, &str, &str)> = totals
        .iter()
        .map(|(id, seconds)| {
            let project = id.and_then(|id| projects.iter().find(|p| p.id == id));
            match project {
                Some(p) => (*seconds, p.name.as_str(), p.color.as_str()),
                None => (*seconds, NO_PROJECT, NO_PROJECT_COLOUR),
            }
        })
        .collect();
    lines.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    lines
        .into_iter()
        .map(|(seconds, name, colour)| {
            format!(
                "<b>{}</b> -- <span color='{}'>{}</span>",
                format_duration(seconds),
                escape_markup(colour),
                escape_markup(name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary rows of the edit view plus the confirm row.
pub fn render_edit_rows(entry: Option<&ParsedEntry>, snapshot: &Snapshot) -> Vec<PickerItem> {
    let description = entry
        .map(|e| escape_markup(e.description()))
        .unwrap_or_default();

    let project = match entry.and_then(ParsedEntry::project) {
        Some(name) => match snapshot.project_by_name(name) {
            Some(project) => format!(
                "@<span color=\"{}\">{}</span>",
                escape_markup(&project.color),
                escape_markup(&project.name)
            ),
            None => format!(
                "@<span color=\"{}\">{} (Unknown Project)</span>",
                UNKNOWN_PROJECT_COLOUR,
                escape_markup(name)
            ),
        },
        None => "<i>No Project</i>".to_string(),
    };

    let tags: Vec<String> = entry
        .map(ParsedEntry::tags)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| snapshot.tag_by_name(name))
        .map(|tag| format!("#{}", escape_markup(&tag.name)))
        .collect();
    let tags = if tags.is_empty() {
        "<i>No Tags</i>".to_string()
    } else {
        format!("<span color='grey'>{}</span>", tags.join(" "))
    };

    let table = [
        ("Description:", description),
        ("Project:", project),
        ("Tags:", tags),
    ];
    let key_width = table.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

    let mut items: Vec<PickerItem> = table
        .iter()
        .map(|(key, value)| {
            PickerItem::new(format!("<b>{:<key_width$}\t\t {}</b>", key, value))
                .permanent()
                .nonselectable()
        })
        .collect();
    items.push(
        PickerItem::new(CONFIRM_ROW)
            .with_icon("media-playback-start")
            .permanent(),
    );
    items
}

/// Help text listing each bound key.
pub fn render_help<'a>(bindings: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut lines = vec!["<b>Return</b>\t\tStart typed entry, or stop/continue the selected one".to_string()];
    lines.extend(bindings.into_iter().map(|(chord, description)| {
        format!("<b>{}</b>\t\t{}", escape_markup(chord), escape_markup(description))
    }));
    lines.join("\n")
}

/// Message view text for a failure shown to the user.
pub fn render_error(message: &str) -> String {
    format!(
        "<b><span color=\"{}\">Error</span></b>\n{}",
        UNKNOWN_PROJECT_COLOUR,
        escape_markup(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixtures::{entry, project, snapshot, utc};
    use crate::grammar::parse;

    #[test]
    fn escapes_each_character_once() {
        assert_eq!(
            escape_markup("<a&b>'\""),
            "&lt;a&amp;b&gt;&apos;&quot;"
        );
        assert_eq!(escape_markup("&amp;"), "&amp;amp;");
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn durations_truncate_to_minutes() {
        assert_eq!(format_duration(3661), "01:01");
        assert_eq!(format_duration(59), "00:00");
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(-30), "00:00");
        assert_eq!(format_duration(100 * 3600 + 5 * 60), "100:05");
    }

    fn day_entries() -> Vec<TimeEntry> {
        vec![
            entry(1, Some("Old"), Some(10), utc(2024, 3, 1, 9, 0), Some(utc(2024, 3, 1, 10, 0))),
            entry(2, Some("Morning"), Some(10), utc(2024, 3, 2, 8, 0), Some(utc(2024, 3, 2, 9, 0))),
            entry(3, Some("Midday"), None, utc(2024, 3, 2, 11, 0), Some(utc(2024, 3, 2, 12, 30))),
            entry(4, Some("Now <b>"), Some(20), utc(2024, 3, 2, 14, 0), None),
        ]
    }

    #[test]
    fn rows_count_down_from_the_most_recent_entry() {
        let snap = snapshot(day_entries());
        let now = utc(2024, 3, 2, 15, 0);
        let rows = render_list_rows(&snap.time_entries, &snap.projects, Tz::UTC, now);

        assert_eq!(rows.entries, vec![3, 2, 1, 0]);
        assert!(rows.items[0].text.starts_with("<span color=\"gray\"> 3. </span>Now &lt;b&gt;"));
        assert!(rows.items[3].text.starts_with("<span color=\"gray\"> 0. </span>Old"));
    }

    #[test]
    fn date_is_shown_once_per_day() {
        let snap = snapshot(day_entries());
        let now = utc(2024, 3, 2, 15, 0);
        let rows = render_list_rows(&snap.time_entries, &snap.projects, Tz::UTC, now);

        let with_date: Vec<usize> = rows
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.text.contains("2024-03-"))
            .map(|(row, _)| row)
            .collect();
        assert_eq!(with_date, vec![0, 3]);
        assert!(rows.items[0].text.contains("2024-03-02"));
        assert!(rows.items[3].text.contains("2024-03-01"));
    }

    #[test]
    fn running_entry_stops_at_now() {
        let snap = snapshot(day_entries());
        let now = utc(2024, 3, 2, 15, 0);
        let rows = render_list_rows(&snap.time_entries, &snap.projects, Tz::UTC, now);

        assert!(rows.items[0].text.ends_with("14:00 - NOW   (01:00)"));
        assert!(rows.items[1].text.ends_with("11:00 - 12:30 (01:30)"));
    }

    #[test]
    fn columns_align_despite_escaping() {
        let snap = snapshot(day_entries());
        let now = utc(2024, 3, 2, 15, 0);
        let rows = render_list_rows(&snap.time_entries, &snap.projects, Tz::UTC, now);

        // Strip markup and entities; every row must then be equally wide.
        let visible = |text: &str| {
            let mut out = String::new();
            let mut in_tag = false;
            for c in text.chars() {
                match c {
                    '<' => in_tag = true,
                    '>' => in_tag = false,
                    c if !in_tag => out.push(c),
                    _ => {}
                }
            }
            out.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
        };
        let widths: Vec<usize> = rows
            .items
            .iter()
            .map(|item| visible(&item.text).chars().count())
            .collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{widths:?}");
    }

    #[test]
    fn three_rows_on_one_day_then_a_new_day() {
        let entries = vec![
            entry(1, Some("d"), None, utc(2024, 3, 1, 9, 0), Some(utc(2024, 3, 1, 10, 0))),
            entry(2, Some("c"), None, utc(2024, 3, 2, 9, 0), Some(utc(2024, 3, 2, 10, 0))),
            entry(3, Some("b"), None, utc(2024, 3, 2, 11, 0), Some(utc(2024, 3, 2, 12, 0))),
            entry(4, Some("a"), None, utc(2024, 3, 2, 13, 0), Some(utc(2024, 3, 2, 14, 0))),
        ];
        let rows = render_list_rows(&entries, &[], Tz::UTC, utc(2024, 3, 2, 15, 0));

        let labels: Vec<Option<&str>> = rows
            .items
            .iter()
            .map(|item| {
                ["2024-03-02", "2024-03-01"]
                    .into_iter()
                    .find(|date| item.text.contains(date))
            })
            .collect();
        assert_eq!(
            labels,
            vec![Some("2024-03-02"), None, None, Some("2024-03-01")]
        );
    }

    #[test]
    fn header_clips_entries_crossing_midnight() {
        let projects = vec![project(1, "A", "#111111"), project(2, "B", "#222222")];
        let entries = vec![
            // Yesterday 22:30 until 00:30 today: only 30 minutes count.
            entry(1, Some("late"), Some(2), utc(2024, 3, 1, 22, 30), Some(utc(2024, 3, 2, 0, 30))),
            entry(2, Some("focus"), Some(1), utc(2024, 3, 2, 9, 0), Some(utc(2024, 3, 2, 10, 0))),
        ];
        let header = render_header(&entries, &projects, Tz::UTC, utc(2024, 3, 2, 18, 0));

        assert_eq!(
            header,
            "<b>01:00</b> -- <span color='#111111'>A</span>\n\
             <b>00:30</b> -- <span color='#222222'>B</span>"
        );
    }

    #[test]
    fn header_skips_yesterday_and_buckets_missing_projects() {
        let projects = vec![project(1, "A", "#111111")];
        let entries = vec![
            entry(1, Some("old"), Some(1), utc(2024, 3, 1, 9, 0), Some(utc(2024, 3, 1, 17, 0))),
            entry(2, Some("misc"), None, utc(2024, 3, 2, 9, 0), Some(utc(2024, 3, 2, 9, 45))),
            entry(3, Some("running"), Some(1), utc(2024, 3, 2, 17, 0), None),
        ];
        let header = render_header(&entries, &projects, Tz::UTC, utc(2024, 3, 2, 18, 0));

        assert_eq!(
            header,
            "<b>01:00</b> -- <span color='#111111'>A</span>\n\
             <b>00:45</b> -- <span color='#000000'>No Project</span>"
        );
    }

    #[test]
    fn header_without_time_today() {
        let entries = vec![entry(
            1,
            Some("old"),
            None,
            utc(2024, 3, 1, 9, 0),
            Some(utc(2024, 3, 1, 17, 0)),
        )];
        assert_eq!(
            render_header(&entries, &[], Tz::UTC, utc(2024, 3, 2, 18, 0)),
            "<i>No time tracked today</i>"
        );
        assert_eq!(
            render_header(&[], &[], Tz::UTC, utc(2024, 3, 2, 18, 0)),
            "<i>No time tracked today</i>"
        );
    }

    #[test]
    fn edit_rows_summarise_the_entry() {
        let snap = snapshot(vec![]);
        let parsed = parse("Write <docs> @work #urgent #nope").unwrap();
        let rows = render_edit_rows(Some(&parsed), &snap);

        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.permanent == Some(true)));
        assert!(rows[..3].iter().all(|row| row.nonselectable == Some(true)));
        assert_eq!(rows[3].nonselectable, None);
        assert!(rows[0].text.contains("Write &lt;docs&gt;"));
        assert!(rows[1].text.contains("<span color=\"#06aaf5\">Work</span>"));
        assert!(rows[2].text.contains("#Urgent"));
        assert!(!rows[2].text.contains("nope"));
        assert_eq!(rows[3].text, CONFIRM_ROW);
    }

    #[test]
    fn edit_rows_flag_unknown_project_and_empty_entry() {
        let snap = snapshot(vec![]);
        let parsed = parse("Write @mystery").unwrap();
        let rows = render_edit_rows(Some(&parsed), &snap);
        assert!(rows[1].text.contains("mystery (Unknown Project)"));
        assert!(rows[2].text.contains("<i>No Tags</i>"));

        let rows = render_edit_rows(None, &snap);
        assert!(rows[1].text.contains("<i>No Project</i>"));
    }

    #[test]
    fn help_lists_bindings() {
        let help = render_help([("Alt+h", "Show this help"), ("Alt+r", "Refresh")]);
        assert_eq!(help.lines().count(), 3);
        assert!(help.contains("<b>Alt+h</b>\t\tShow this help"));
    }
}
