//! Command automation: archive events mapped to command wrappers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::flex;

/// An existing event→command mapping (`/xapi/commandeventmapping`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CommandEventMapping {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub project: Option<String>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub command_id: i64,
    #[serde(default)]
    pub xnat_command_wrapper: String,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub subscription_user_name: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_i64")]
    pub timestamp: Option<i64>,
}

/// Body posted to create a mapping.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NewEventMapping {
    pub project: String,
    pub command_id: i64,
    pub xnat_command_wrapper: String,
    pub event_type: EventType,
}

/// Archive events a command can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    SessionArchived,
    ScanArchived,
}

impl EventType {
    pub const ALL: [EventType; 2] = [EventType::SessionArchived, EventType::ScanArchived];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::SessionArchived => "SessionArchived",
            EventType::ScanArchived => "ScanArchived",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::SessionArchived => "On Session Archive",
            EventType::ScanArchived => "On Scan Archive",
        }
    }

    /// XNAT data types an event fires for.
    pub fn contexts(&self) -> &'static [&'static str] {
        match self {
            EventType::SessionArchived => &["xnat:imageSessionData"],
            EventType::ScanArchived => &["xnat:imageScanData"],
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown event type '{value}' (expected SessionArchived or ScanArchived)"))
    }
}
