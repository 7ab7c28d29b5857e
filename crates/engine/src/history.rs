//! Container execution history.
//!
//! Entries are fetched per scope, ordered by id, and enriched with an owning
//! project before display. Setup containers pass their project on to the
//! container they prepared.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};
use xcs_types::{Cell, DetailValue, Dialog, DialogBody, DialogButton, HistoryEntry, Scope, Table, TableRow};
use xcs_util::{DateWindow, format_timestamp_millis, last_path_segment};

use crate::error::{ComponentError, ComponentResult};
use crate::store::{Snapshot, Store};

const ARCHIVE_PREFIXES: [&str; 3] = ["/data/xnat/archive/", "/data/archive/", "/REST/archive/"];

pub const UNKNOWN_ENTRY_MESSAGE: &str = "Sorry, could not display this history item.";

/// Fetch history for the store's scope, ascending by id, with projects
/// filled in.
pub async fn fetch(store: &Store) -> ComponentResult<Vec<HistoryEntry>> {
    let entries = store
        .client()
        .list_containers(store.scope())
        .await
        .map_err(ComponentError::api("Could not retrieve container history"))?;
    debug!(scope = %store.scope(), entries = entries.len(), "fetched container history");
    Ok(prepare(entries))
}

/// Sort by id and fill in projects.
///
/// Every entry without a recorded project takes the one derived from its
/// first mount. A setup container also hands its project and its own id to
/// the entry named by `parent-database-id`, looked up by id.
pub fn prepare(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    entries.sort_by_key(|entry| entry.id);

    for entry in &mut entries {
        if entry.project.is_none() {
            entry.project = project_from_mounts(entry);
        }
    }

    let positions: HashMap<i64, usize> = entries.iter().enumerate().map(|(index, entry)| (entry.id, index)).collect();
    let links: Vec<(i64, i64, Option<String>)> = entries
        .iter()
        .filter(|entry| entry.is_setup())
        .filter_map(|entry| {
            entry
                .parent_database_id
                .map(|parent| (parent, entry.id, project_from_mounts(entry).or_else(|| entry.project.clone())))
        })
        .collect();
    for (parent, setup_id, project) in links {
        match positions.get(&parent) {
            Some(&index) => {
                let target = &mut entries[index];
                if project.is_some() {
                    target.project = project;
                }
                target.setup_container_id = Some(setup_id);
            }
            None => warn!(setup = setup_id, parent, "setup container names an unknown parent"),
        }
    }
    entries
}

/// Project of the first mount's archive path: the first segment after any of
/// the known archive prefixes.
pub fn project_from_mounts(entry: &HistoryEntry) -> Option<String> {
    let path = entry.mounts.first()?.xnat_host_path.as_deref()?;
    let relative = ARCHIVE_PREFIXES
        .iter()
        .fold(path.to_string(), |path, prefix| path.replace(prefix, ""));
    relative
        .split('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Newest launch first; entries without a launch time sink to the bottom.
pub fn sort_for_display(entries: &mut [HistoryEntry]) {
    entries.sort_by(|a, b| b.launched_at_millis().cmp(&a.launched_at_millis()));
}

/// Wrapper description, else wrapper name, else the recorded command line.
pub fn command_label(entry: &HistoryEntry, snapshot: &Snapshot) -> String {
    entry
        .wrapper_id
        .and_then(|id| snapshot.wrapper(id))
        .map(|wrapper| wrapper.label().to_string())
        .or_else(|| entry.command_line.clone())
        .unwrap_or_default()
}

/// Values of the entry's `wrapper-external` inputs, or `Unknown`.
pub fn root_elements(entry: &HistoryEntry) -> Vec<String> {
    let labels: Vec<String> = entry
        .inputs
        .iter()
        .filter(|input| input.input_type == "wrapper-external")
        .map(|input| {
            let value = input.value.as_deref().unwrap_or("");
            if value.contains("scans") {
                let session = value.split('/').nth(3).unwrap_or("");
                format!("session: {session} scan: {}", last_path_segment(value))
            } else {
                format!("{}: {}", input.name, last_path_segment(value))
            }
        })
        .collect();
    if labels.is_empty() { vec!["Unknown".to_string()] } else { labels }
}

/// The history table, newest first, restricted to `window`.
pub fn history_table(entries: &[HistoryEntry], snapshot: &Snapshot, window: DateWindow, now: i64) -> Table {
    let mut visible: Vec<HistoryEntry> = entries
        .iter()
        .filter(|entry| window.contains(entry.launched_at_millis(), now))
        .cloned()
        .collect();
    sort_for_display(&mut visible);

    let site = snapshot.scope.is_site();
    let mut columns = vec!["ID", "Image", "Command", "User", "Date Launched", "Root Element", "Status"];
    if site {
        columns.insert(1, "Project");
    }
    let title = match &snapshot.scope {
        Scope::Site => format!("{} Containers Launched On This Site", visible.len()),
        Scope::Project(project) => format!("{} Containers Launched For {project}", visible.len()),
    };
    let mut table = Table::new(columns)
        .with_title(title)
        .with_empty_message("No containers have been launched.");

    for entry in &visible {
        let mut cells = vec![
            Cell::text(entry.id.to_string()),
            Cell::text(entry.docker_image.clone().unwrap_or_default()),
            Cell::text(command_label(entry, snapshot)),
            Cell::text(entry.user_id.clone().unwrap_or_default()),
            Cell::text(format_timestamp_millis(entry.launched_at_millis())),
            Cell::List {
                items: root_elements(entry),
            },
            Cell::text(entry.status.clone().unwrap_or_default()),
        ];
        if site {
            cells.insert(1, Cell::text(entry.project.clone().unwrap_or_default()));
        }
        table.push(TableRow::new(entry.id.to_string(), cells));
    }
    table
}

/// Every key of the entry with its value. Arrays list their items, objects
/// show as inline JSON and falsy values read `false`. Buttons open the
/// entry's logs and linked containers.
pub fn view_history(entries: &[HistoryEntry], id: i64) -> Dialog {
    let Some(entry) = entries.iter().find(|entry| entry.id == id) else {
        return Dialog::new("Error")
            .with_body(DialogBody::Paragraph {
                text: UNKNOWN_ENTRY_MESSAGE.into(),
            })
            .with_button(DialogButton::new("OK"));
    };

    let rows = match serde_json::to_value(entry) {
        Ok(Value::Object(fields)) => fields.into_iter().map(|(key, value)| (key, detail_value(value))).collect(),
        _ => Vec::new(),
    };
    let mut dialog = Dialog::new(entry.wrapper_name.clone().unwrap_or_else(|| format!("Container {id}")))
        .with_body(DialogBody::Details { rows })
        .with_button(DialogButton::new("OK"));

    for (needle, label, file) in [("stdout.log", "View StdOut.log", "stdout"), ("stderr.log", "View StdErr.log", "stderr")] {
        if entry.log_paths.iter().any(|path| path.contains(needle)) {
            dialog = dialog.with_button(DialogButton::with_target(label, file));
        }
    }
    if let Some(setup) = entry.setup_container_id {
        dialog = dialog.with_button(DialogButton::with_target("View Setup Container", setup.to_string()));
    }
    if let Some(parent) = entry.parent_database_id {
        dialog = dialog.with_button(DialogButton::with_target("View Parent Container", parent.to_string()));
    }
    dialog
}

fn detail_value(value: Value) -> DetailValue {
    match value {
        Value::Array(items) => DetailValue::List(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(text) => text,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::Object(_) => DetailValue::Code(value.to_string()),
        Value::Null | Value::Bool(false) => DetailValue::Code("false".into()),
        Value::Number(ref number) if number.as_f64() == Some(0.0) => DetailValue::Code("false".into()),
        Value::String(text) if text.is_empty() => DetailValue::Code("false".into()),
        Value::String(text) => DetailValue::Code(text),
        other => DetailValue::Code(other.to_string()),
    }
}

/// Fetch a container log and show it line by line.
pub async fn view_log(store: &Store, container_id: &str, log_file: &str) -> ComponentResult<Dialog> {
    let text = store
        .client()
        .container_log(container_id, log_file)
        .await
        .map_err(ComponentError::api(format!("Cannot retrieve {log_file}")))?;
    Ok(log_dialog(log_file, &text))
}

pub fn log_dialog(log_file: &str, text: &str) -> Dialog {
    let body = if text.trim().is_empty() {
        DialogBody::Paragraph {
            text: "No content".into(),
        }
    } else {
        DialogBody::Lines {
            lines: text.lines().map(str::to_string).collect(),
        }
    };
    Dialog::new(format!("View {log_file}"))
        .with_body(body)
        .with_button(DialogButton::new("OK"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_commands;
    use serde_json::json;

    fn entries(value: Value) -> Vec<HistoryEntry> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn fetch_order_is_ascending_by_id() {
        let prepared = prepare(entries(json!([{"id": 3}, {"id": 1}, {"id": 2}])));
        let ids: Vec<i64> = prepared.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn projects_come_from_first_mount() {
        let prepared = prepare(entries(json!([
            {"id": 1, "mounts": [{"xnat-host-path": "/data/xnat/archive/CT1/arc001/E1/SCANS/1"}]},
            {"id": 2, "mounts": [{"xnat-host-path": "/REST/archive/CT2/E2"}]},
            {"id": 3, "project": "Explicit", "mounts": [{"xnat-host-path": "/data/archive/CT3/E3"}]},
            {"id": 4, "mounts": []}
        ])));
        let projects: Vec<Option<&str>> = prepared.iter().map(|entry| entry.project.as_deref()).collect();
        assert_eq!(projects, vec![Some("CT1"), Some("CT2"), Some("Explicit"), None]);
    }

    #[test]
    fn setup_containers_link_parents_by_id_despite_gaps() {
        let prepared = prepare(entries(json!([
            {"id": 40},
            {"id": 7},
            {"id": 41, "subtype": "Setup", "parent-database-id": 40,
             "mounts": [{"xnat-host-path": "/data/archive/CT9/E1"}]}
        ])));
        let parent = prepared.iter().find(|entry| entry.id == 40).unwrap();
        assert_eq!(parent.project.as_deref(), Some("CT9"));
        assert_eq!(parent.setup_container_id, Some(41));
        assert_eq!(prepared.iter().find(|entry| entry.id == 7).unwrap().setup_container_id, None);
    }

    #[test]
    fn root_elements_describe_scans_and_sessions() {
        let entry = entries(json!([{
            "id": 1,
            "inputs": [
                {"type": "wrapper-external", "name": "scan", "value": "/archive/experiments/E1/scans/4"},
                {"type": "wrapper-external", "name": "session", "value": "/archive/experiments/E2"},
                {"type": "raw", "name": "flag", "value": "x"}
            ]
        }]))
        .remove(0);
        assert_eq!(root_elements(&entry), vec!["session: E1 scan: 4", "session: E2"]);
        assert_eq!(root_elements(&HistoryEntry::default()), vec!["Unknown"]);
    }

    #[test]
    fn site_table_is_newest_first_with_project_column() {
        let snapshot = Snapshot::from_commands(Scope::Site, sample_commands());
        let list = prepare(entries(json!([
            {"id": 1, "wrapper-id": 10, "history": [{"status": "Created", "time-recorded": 1000}]},
            {"id": 2, "command-line": "echo hi", "history": [{"status": "Created", "time-recorded": 5000}]}
        ])));
        let table = history_table(&list, &snapshot, DateWindow::All, 10_000);
        assert_eq!(table.title.as_deref(), Some("2 Containers Launched On This Site"));
        assert_eq!(table.columns[1], "Project");
        assert_eq!(table.rows[0].key, "2");
        assert_eq!(table.rows[0].cells[3].as_text(), Some("echo hi"));
        assert_eq!(table.rows[1].cells[3].as_text(), Some("Convert scan"));

        let recent = history_table(&list, &snapshot, DateWindow::LastHour, 3_600_000 + 2_000);
        assert_eq!(recent.rows.len(), 1);
    }

    #[test]
    fn project_table_header_names_the_project() {
        let snapshot = Snapshot::from_commands(Scope::project("CT1"), Vec::new());
        let table = history_table(&[], &snapshot, DateWindow::All, 0);
        assert_eq!(table.title.as_deref(), Some("0 Containers Launched For CT1"));
        assert!(!table.columns.contains(&"Project".to_string()));
    }

    #[test]
    fn detail_dialog_offers_logs_and_linked_containers() {
        let list = entries(json!([{
            "id": 5,
            "wrapper-name": "debug-session",
            "parent-database-id": 4,
            "log-paths": ["/logs/5/stdout.log", "/logs/5/stderr.log"],
            "outputs": [{"name": "out"}]
        }]));
        let dialog = view_history(&list, 5);
        assert_eq!(dialog.title, "debug-session");
        assert_eq!(
            dialog.button_labels(),
            vec!["OK", "View StdOut.log", "View StdErr.log", "View Parent Container"]
        );
        let DialogBody::Details { rows } = &dialog.body[0] else {
            panic!("expected details");
        };
        let outputs = rows.iter().find(|(key, _)| key == "outputs").unwrap();
        assert_eq!(outputs.1, DetailValue::List(vec![r#"{"name":"out"}"#.into()]));

        let missing = view_history(&list, 99);
        assert_eq!(
            missing.body,
            vec![DialogBody::Paragraph {
                text: UNKNOWN_ENTRY_MESSAGE.into()
            }]
        );
    }

    #[test]
    fn empty_logs_say_no_content() {
        let dialog = log_dialog("stdout", "  \n");
        assert_eq!(dialog.title, "View stdout");
        assert_eq!(
            dialog.body,
            vec![DialogBody::Paragraph {
                text: "No content".into()
            }]
        );
    }
}
