//! Shared type definitions for the container service admin tools.
//!
//! Wire models mirror the JSON served by the XNAT `/xapi` endpoints, which
//! uses kebab-case field names throughout. View models in [`view`] describe
//! what the engine components hand back for rendering: tables, dialogs,
//! banners and error modals.

use std::fmt;

pub mod automation;
pub mod command;
pub mod docker;
mod flex;
pub mod history;
pub mod launch;
pub mod project;
pub mod view;

pub use automation::{CommandEventMapping, EventType, NewEventMapping};
pub use command::{Command, CommandConfig, ConfigSubmission, FlagText, InputConfig, InputSubmission, OutputConfig, Wrapper};
pub use docker::{ContainerHost, DockerImage, ImageHub, PingStatus};
pub use history::{HistoryEntry, HistoryInput, HistoryItem, HistoryMount};
pub use launch::{
    AvailableCommand, BulkLaunchOutcome, BulkLaunchReport, LaunchReport, LaunchUi, LaunchUiInput, LaunchUiInputs,
    LaunchUiValue, LaunchUiValues, ScanRecord, UiType,
};
pub use project::{ConfigContents, ProjectRecord, ProjectSettings, ResultSet, ResultSetBody};
pub use view::{Banner, Cell, DetailValue, Dialog, DialogBody, DialogButton, ErrorModal, Table, TableRow};

/// Where a configuration or enabled flag applies.
///
/// Site scope is the administrator view. Project scope narrows the same
/// settings to a single project and is only meaningful while the site-level
/// flag is on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    Site,
    Project(String),
}

impl Scope {
    pub fn project(project_id: impl Into<String>) -> Self {
        Scope::Project(project_id.into())
    }

    /// Build a scope from an optional project id; blank ids mean site scope.
    pub fn from_option(project_id: Option<&str>) -> Self {
        match project_id.map(str::trim) {
            Some(id) if !id.is_empty() => Scope::Project(id.to_string()),
            _ => Scope::Site,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Scope::Site => None,
            Scope::Project(id) => Some(id.as_str()),
        }
    }

    pub fn is_site(&self) -> bool {
        matches!(self, Scope::Site)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Site => write!(f, "site"),
            Scope::Project(id) => write!(f, "project {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_project_ids_fall_back_to_site_scope() {
        assert_eq!(Scope::from_option(None), Scope::Site);
        assert_eq!(Scope::from_option(Some("  ")), Scope::Site);
        assert_eq!(Scope::from_option(Some("CT1")), Scope::project("CT1"));
        assert_eq!(Scope::project("CT1").project_id(), Some("CT1"));
        assert!(Scope::Site.is_site());
    }
}
