//! Container execution history records (`/xapi/containers`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flex;

/// One recorded container execution.
///
/// Unknown fields are preserved in `extra` so the detail view can list every
/// key the server sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub wrapper_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub parent_database_id: Option<i64>,
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub setup_container_id: Option<i64>,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub inputs: Vec<HistoryInput>,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub mounts: Vec<HistoryMount>,
    #[serde(default)]
    pub log_paths: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl HistoryEntry {
    pub fn is_setup(&self) -> bool {
        self.subtype.as_deref().is_some_and(|subtype| subtype.eq_ignore_ascii_case("setup"))
    }

    /// Time of the first `Created` status event, falling back to the first
    /// recorded event of any status.
    pub fn launched_at_millis(&self) -> Option<i64> {
        self.history
            .iter()
            .find(|item| item.status.as_deref() == Some("Created"))
            .or_else(|| self.history.first())
            .and_then(|item| item.time_recorded)
    }
}

/// A status transition in an entry's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_i64", skip_serializing_if = "Option::is_none")]
    pub time_recorded: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryInput {
    #[serde(default, rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryMount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xnat_host_path: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_keeps_unknown_fields_for_detail_view() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": 12,
            "container-id": "abc123",
            "subtype": "SETUP",
            "parent-database-id": "11",
            "history": [
                {"status": "Waiting", "time-recorded": 10},
                {"status": "Created", "time-recorded": 20}
            ],
            "env": {"XNAT_HOST": "https://xnat.example.org"}
        }))
        .unwrap();
        assert!(entry.is_setup());
        assert_eq!(entry.parent_database_id, Some(11));
        assert_eq!(entry.launched_at_millis(), Some(20));
        assert!(entry.extra.contains_key("env"));
    }

    #[test]
    fn launch_time_falls_back_to_first_event() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": 1,
            "history": [{"status": "Running", "time-recorded": 5}]
        }))
        .unwrap();
        assert_eq!(entry.launched_at_millis(), Some(5));
        assert_eq!(HistoryEntry::default().launched_at_millis(), None);
    }
}
