//! Launch discovery, launch UI descriptions and launch reports.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::flex;

/// A wrapper that can run in the current context
/// (`GET /xapi/commands/available`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AvailableCommand {
    #[serde(default)]
    pub command_id: i64,
    #[serde(default)]
    pub command_name: String,
    #[serde(default)]
    pub wrapper_id: i64,
    #[serde(default)]
    pub wrapper_name: String,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub wrapper_description: Option<String>,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub image_type: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub root_element_name: String,
}

impl AvailableCommand {
    pub fn display_label(&self) -> &str {
        match self.wrapper_description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description,
            _ => &self.wrapper_name,
        }
    }
}

/// Input controls the server resolved for a launch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchUi {
    #[serde(default, deserialize_with = "flex::optional_i64")]
    pub command_id: Option<i64>,
    #[serde(default)]
    pub command_name: String,
    #[serde(default, deserialize_with = "flex::optional_i64")]
    pub wrapper_id: Option<i64>,
    #[serde(default)]
    pub wrapper_name: String,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub wrapper_description: Option<String>,
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub inputs: LaunchUiInputs,
}

/// Single launches describe one input map; bulk launches one map per target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LaunchUiInputs {
    Single(IndexMap<String, LaunchUiInput>),
    Bulk(Vec<IndexMap<String, LaunchUiInput>>),
}

impl Default for LaunchUiInputs {
    fn default() -> Self {
        LaunchUiInputs::Single(IndexMap::new())
    }
}

impl LaunchUiInputs {
    /// The input map used to build the shared form.
    pub fn primary(&self) -> Option<&IndexMap<String, LaunchUiInput>> {
        match self {
            LaunchUiInputs::Single(inputs) => Some(inputs),
            LaunchUiInputs::Bulk(targets) => targets.first(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchUiInput {
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub advanced: Option<bool>,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub required: Option<bool>,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub user_settable: Option<bool>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub ui: IndexMap<String, LaunchUiValues>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LaunchUiValues {
    #[serde(default, rename = "type")]
    pub ui_type: UiType,
    #[serde(default)]
    pub values: Vec<LaunchUiValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchUiValue {
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub label: Option<String>,
}

/// Control type suggested by the server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiType {
    #[default]
    Default,
    Text,
    Number,
    Boolean,
    Select,
    Hidden,
    Static,
}

/// Result of a single launch (`POST /xapi/wrappers/{id}/launch`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchReport {
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "flex::string_map")]
    pub params: IndexMap<String, String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub container_id: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub service_id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "flex::optional_string")]
    pub launch_type: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub wrapper_name: Option<String>,
}

impl LaunchReport {
    /// Identifier of the launched workload: the service id for swarm
    /// services, the container id otherwise.
    pub fn workload_id(&self) -> Option<&str> {
        if self.launch_type.as_deref() == Some("service") {
            return self.service_id.as_deref().or(self.container_id.as_deref());
        }
        self.container_id.as_deref().or(self.service_id.as_deref())
    }

    pub fn succeeded(&self) -> bool {
        self.status.as_deref().is_none_or(|status| status.eq_ignore_ascii_case("success"))
            && self.workload_id().is_some()
    }
}

/// Result of `POST /xapi/wrappers/{id}/bulklaunch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BulkLaunchReport {
    #[serde(default)]
    pub successes: Vec<BulkLaunchOutcome>,
    #[serde(default)]
    pub failures: Vec<BulkLaunchOutcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct BulkLaunchOutcome {
    #[serde(default, deserialize_with = "flex::string_map")]
    pub params: IndexMap<String, String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub container_id: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub wrapper: Option<String>,
}

/// A scan row from `/data/experiments/{id}/scans?format=json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRecord {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub series_description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "flex::optional_string")]
    pub scan_type: Option<String>,
}

impl ScanRecord {
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.id, self.series_description.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bulk_launch_ui_exposes_first_target_inputs() {
        let ui: LaunchUi = serde_json::from_value(json!({
            "wrapper-id": 7,
            "wrapper-name": "debug-scan",
            "inputs": [
                {"scan": {"label": "scan", "user-settable": true, "ui": {"default": {"type": "text", "values": [{"value": "/a", "label": "A"}]}}}},
                {"scan": {"label": "scan", "user-settable": true, "ui": {"default": {"type": "text", "values": [{"value": "/b", "label": "B"}]}}}}
            ]
        }))
        .unwrap();
        let inputs = ui.inputs.primary().unwrap();
        assert_eq!(inputs["scan"].ui["default"].ui_type, UiType::Text);
        assert_eq!(inputs["scan"].ui["default"].values[0].value.as_deref(), Some("/a"));
    }

    #[test]
    fn service_launches_report_service_id() {
        let report: LaunchReport = serde_json::from_value(json!({
            "status": "success",
            "type": "service",
            "service-id": "svc-1",
            "params": {"session": "/archive/experiments/E1", "count": 2}
        }))
        .unwrap();
        assert_eq!(report.workload_id(), Some("svc-1"));
        assert!(report.succeeded());
        assert_eq!(report.params["count"], "2");
    }

    #[test]
    fn failed_launch_has_no_workload() {
        let report: LaunchReport = serde_json::from_value(json!({
            "status": "failure",
            "message": "no such input"
        }))
        .unwrap();
        assert!(!report.succeeded());
    }
}
