//! Legacy `/data` REST envelopes and project settings.

use serde::{Deserialize, Serialize};

use crate::flex;

/// The `{"ResultSet": {"Result": [...]}}` wrapper used by `/data` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSet<T> {
    #[serde(rename = "ResultSet")]
    pub result_set: ResultSetBody<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultSetBody<T> {
    #[serde(rename = "Result", default = "Vec::new")]
    pub result: Vec<T>,
}

impl<T> ResultSet<T> {
    pub fn into_rows(self) -> Vec<T> {
        self.result_set.result
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "secondary_ID", default, deserialize_with = "flex::optional_string")]
    pub secondary_id: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub name: Option<String>,
}

impl ProjectRecord {
    pub fn display_label(&self) -> &str {
        self.secondary_id.as_deref().filter(|label| !label.is_empty()).unwrap_or(&self.id)
    }
}

/// A stored configuration document; `contents` is itself JSON text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigContents {
    #[serde(default)]
    pub contents: String,
}

/// Whether a project accepts commands enabled sitewide.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSettings {
    #[serde(rename = "optIntoSitewideCommands", default)]
    pub opt_into_sitewide_commands: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_list_unwraps_result_set() {
        let projects: ResultSet<ProjectRecord> = serde_json::from_value(json!({
            "ResultSet": {"Result": [{"ID": "CT1", "secondary_ID": "Cortical Thickness"}, {"ID": "P2", "secondary_ID": ""}]}
        }))
        .unwrap();
        let rows = projects.into_rows();
        assert_eq!(rows[0].display_label(), "Cortical Thickness");
        assert_eq!(rows[1].display_label(), "P2");
    }
}
