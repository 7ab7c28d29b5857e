//! Commands, wrappers and their per-wrapper configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::flex;

/// An installed command definition as returned by `GET /xapi/commands`.
///
/// Only the fields the admin tools read are modelled; the full definition
/// (mounts, inputs, outputs) round-trips through `extra` so a command can be
/// re-posted without loss.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Command {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, rename = "xnat")]
    pub wrappers: Vec<Wrapper>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Command {
    pub fn image_name(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }

    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

/// A named invocation of a command, valid for a set of XNAT contexts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Wrapper {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl Wrapper {
    /// Human label: the description when present, otherwise the name.
    pub fn display_label(&self) -> &str {
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description,
            _ => &self.name,
        }
    }

    /// True when any declared context appears in `contexts`.
    pub fn supports_any(&self, contexts: &[&str]) -> bool {
        self.contexts.iter().any(|context| contexts.contains(&context.as_str()))
    }
}

/// Stored configuration for one command/wrapper pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandConfig {
    #[serde(default)]
    pub inputs: IndexMap<String, InputConfig>,
    #[serde(default)]
    pub outputs: IndexMap<String, OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct InputConfig {
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub default_value: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub matcher: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub user_settable: Option<bool>,
    #[serde(default, deserialize_with = "flex::optional_bool")]
    pub advanced: Option<bool>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, deserialize_with = "flex::optional_bool", skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl InputConfig {
    /// Default value as shown in the editor. A missing value and the literal
    /// string `null` both display as empty.
    pub fn display_default(&self) -> &str {
        match self.default_value.as_deref() {
            None | Some("null") => "",
            Some(value) => value,
        }
    }

    pub fn display_matcher(&self) -> &str {
        match self.matcher.as_deref() {
            None | Some("null") => "",
            Some(value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default, deserialize_with = "flex::optional_string")]
    pub label: Option<String>,
}

/// Body posted to `.../config?enabled=true`.
///
/// Every input carries all four editable properties; flags are written as the
/// strings `"true"`/`"false"` so an unchecked box is never dropped.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ConfigSubmission {
    pub inputs: IndexMap<String, InputSubmission>,
    pub outputs: IndexMap<String, OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct InputSubmission {
    pub default_value: String,
    pub matcher: String,
    pub user_settable: FlagText,
    pub advanced: FlagText,
}

/// A boolean that serializes as the string `"true"` or `"false"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagText(pub bool);

impl Serialize for FlagText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if self.0 { "true" } else { "false" })
    }
}

impl From<bool> for FlagText {
    fn from(value: bool) -> Self {
        FlagText(value)
    }
}
