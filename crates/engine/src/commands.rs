//! Command configuration editor and enable/disable toggles.

use indexmap::IndexMap;
use tracing::{info, warn};
use xcs_types::{
    Banner, Cell, CommandConfig, ConfigSubmission, Dialog, DialogBody, DialogButton, FlagText, InputSubmission,
    OutputConfig, Scope, Table, TableRow,
};

use crate::error::{ComponentError, ComponentResult};
use crate::store::{Snapshot, Store, WrapperEntry};
use crate::{Outcome, View};

pub const NO_COMMANDS_MESSAGE: &str = "No XNAT-enabled Commands Found";

/// One row per wrapper: label, image, enabled toggle and the config action.
///
/// Rows whose flag could not be read, and project rows whose wrapper is
/// disabled for the site, get a locked toggle.
pub fn commands_table(snapshot: &Snapshot) -> Table {
    let columns = match snapshot.scope {
        Scope::Site => ["Command", "Image", "Enabled", "Actions"],
        Scope::Project(_) => ["XNAT Command Label", "Container", "Enabled", "Actions"],
    };
    let mut table = Table::new(columns).with_empty_message(NO_COMMANDS_MESSAGE);
    for (wrapper_id, entry) in &snapshot.wrappers {
        let toggle = Cell::Toggle {
            checked: snapshot.is_enabled(*wrapper_id),
            disabled: snapshot.toggle_locked(*wrapper_id),
        };
        table.push(TableRow::new(
            wrapper_id.to_string(),
            vec![Cell::text(entry.label()), Cell::text(&entry.image), toggle, Cell::action("Set Defaults")],
        ));
    }
    table
}

/// Editable copy of a wrapper's stored configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigForm {
    pub scope: Scope,
    pub command_id: i64,
    pub wrapper_name: String,
    pub inputs: IndexMap<String, InputRow>,
    pub outputs: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRow {
    pub default_value: String,
    pub matcher: String,
    pub user_settable: bool,
    pub advanced: bool,
}

impl ConfigForm {
    /// Build the form from a stored config. Null defaults and matchers show
    /// as empty text; absent flags show unchecked.
    pub fn from_config(scope: Scope, command_id: i64, wrapper_name: impl Into<String>, config: &CommandConfig) -> Self {
        let inputs = config
            .inputs
            .iter()
            .map(|(name, input)| {
                let row = InputRow {
                    default_value: input.display_default().to_string(),
                    matcher: input.display_matcher().to_string(),
                    user_settable: input.user_settable.unwrap_or(false),
                    advanced: input.advanced.unwrap_or(false),
                };
                (name.clone(), row)
            })
            .collect();
        let outputs = config
            .outputs
            .iter()
            .map(|(name, output)| {
                let label = match output.label.as_deref() {
                    None | Some("null") => String::new(),
                    Some(label) => label.to_string(),
                };
                (name.clone(), label)
            })
            .collect();
        Self {
            scope,
            command_id,
            wrapper_name: wrapper_name.into(),
            inputs,
            outputs,
        }
    }

    /// Apply one `name.property=value` edit.
    ///
    /// Inputs accept `default-value`, `matcher`, `user-settable` and
    /// `advanced`; outputs accept `label`.
    pub fn apply_edit(&mut self, edit: &str) -> ComponentResult<()> {
        let (key, value) = edit
            .split_once('=')
            .ok_or_else(|| ComponentError::rejected("Invalid Edit", format!("Expected name.property=value, got \"{edit}\"")))?;
        let (name, property) = key
            .rsplit_once('.')
            .ok_or_else(|| ComponentError::rejected("Invalid Edit", format!("Expected name.property=value, got \"{edit}\"")))?;

        if let Some(row) = self.inputs.get_mut(name) {
            match property {
                "default-value" => row.default_value = value.to_string(),
                "matcher" => row.matcher = value.to_string(),
                "user-settable" => row.user_settable = parse_flag(value)?,
                "advanced" => row.advanced = parse_flag(value)?,
                other => {
                    return Err(ComponentError::rejected(
                        "Invalid Edit",
                        format!("Inputs have no \"{other}\" property"),
                    ));
                }
            }
            return Ok(());
        }
        if let Some(label) = self.outputs.get_mut(name) {
            if property != "label" {
                return Err(ComponentError::rejected(
                    "Invalid Edit",
                    format!("Outputs have no \"{property}\" property"),
                ));
            }
            *label = value.to_string();
            return Ok(());
        }
        Err(ComponentError::MissingReference(format!(
            "No input or output named \"{name}\" in the configuration for {}",
            self.wrapper_name
        )))
    }

    /// The body posted on save. Every input carries all four properties.
    pub fn submission(&self) -> ConfigSubmission {
        let inputs = self
            .inputs
            .iter()
            .map(|(name, row)| {
                let input = InputSubmission {
                    default_value: row.default_value.clone(),
                    matcher: row.matcher.clone(),
                    user_settable: FlagText(row.user_settable),
                    advanced: FlagText(row.advanced),
                };
                (name.clone(), input)
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|(name, label)| (name.clone(), OutputConfig { label: Some(label.clone()) }))
            .collect();
        ConfigSubmission { inputs, outputs }
    }

    pub fn dialog(&self) -> Dialog {
        let mut inputs = Table::new(["Input", "Default Value", "Matcher Value", "User-Settable?", "Advanced?"])
            .with_title("Inputs")
            .with_empty_message("No inputs");
        for (name, row) in &self.inputs {
            inputs.push(TableRow::new(
                name.clone(),
                vec![
                    Cell::text(name),
                    Cell::text(&row.default_value),
                    Cell::text(&row.matcher),
                    Cell::toggle(row.user_settable),
                    Cell::toggle(row.advanced),
                ],
            ));
        }
        let mut outputs = Table::new(["Output", "Label"])
            .with_title("Outputs")
            .with_empty_message("No outputs");
        for (name, label) in &self.outputs {
            outputs.push(TableRow::new(name.clone(), vec![Cell::text(name), Cell::text(label)]));
        }

        let mut dialog = Dialog::new("Set Config Values")
            .with_body(DialogBody::Table { table: inputs })
            .with_body(DialogBody::Table { table: outputs });
        dialog.buttons.push(DialogButton::new("Save"));
        if !self.scope.is_site() {
            dialog.buttons.push(DialogButton::new("Reset to Site-wide Default"));
        }
        dialog.buttons.push(DialogButton::new("Cancel"));
        dialog
    }
}

fn parse_flag(value: &str) -> ComponentResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" | "" => Ok(false),
        other => Err(ComponentError::rejected(
            "Invalid Edit",
            format!("\"{other}\" is not a true/false value"),
        )),
    }
}

/// Load the stored config for a command/wrapper at the store's scope.
pub async fn open_config(store: &Store, command_id: i64, wrapper_name: &str) -> ComponentResult<ConfigForm> {
    if command_id == 0 || wrapper_name.is_empty() {
        warn!(command_id, wrapper_name, "config requested without command id or wrapper name");
        return Err(ComponentError::MissingReference(
            "A command id and wrapper name are required to open a configuration.".into(),
        ));
    }
    let title = match store.scope() {
        Scope::Site => "Could Not Open Config Definition",
        Scope::Project(_) => "Could not retrieve configuration for this command",
    };
    let config = store
        .client()
        .get_config(store.scope(), command_id, wrapper_name)
        .await
        .map_err(ComponentError::api(title))?;
    Ok(ConfigForm::from_config(store.scope().clone(), command_id, wrapper_name, &config))
}

/// Post the form as the wrapper's enabled configuration.
pub async fn save_config(store: &Store, form: &ConfigForm) -> ComponentResult<Outcome> {
    store
        .client()
        .save_config(&form.scope, form.command_id, &form.wrapper_name, &form.submission())
        .await?;
    info!(wrapper = %form.wrapper_name, scope = %form.scope, "saved command config");
    Ok(Outcome::new(format!("\"{}\" updated.", form.wrapper_name), &[View::Commands]))
}

/// Drop the stored configuration so the command defaults (or the site
/// configuration, for a project) apply again.
pub async fn reset_config(store: &Store, command_id: i64, wrapper_name: &str) -> ComponentResult<Outcome> {
    let title = match store.scope() {
        Scope::Site => "Could not reset config settings for this command",
        Scope::Project(_) => "Could not reset project-based config settings for this command",
    };
    store
        .client()
        .reset_config(store.scope(), command_id, wrapper_name)
        .await
        .map_err(ComponentError::api(title))?;
    info!(wrapper = wrapper_name, scope = %store.scope(), "reset command config");
    let message = match store.scope() {
        Scope::Site => "Config settings reset to command defaults",
        Scope::Project(_) => "Config settings reset to site-wide defaults",
    };
    Ok(Outcome::new(message, &[View::Commands]))
}

/// Flip one wrapper's enabled flag at the store's scope.
///
/// A project toggle is refused without a server call while the wrapper is
/// disabled for the site.
pub async fn set_enabled(store: &Store, snapshot: &Snapshot, wrapper_id: i64, enabled: bool) -> ComponentResult<Banner> {
    let entry = wrapper_entry(snapshot, wrapper_id)?;
    toggle_wrapper(store, snapshot, entry, enabled).await
}

async fn toggle_wrapper(store: &Store, snapshot: &Snapshot, entry: &WrapperEntry, enabled: bool) -> ComponentResult<Banner> {
    if snapshot.flag_unknown(entry.wrapper.id) {
        return Err(ComponentError::rejected(
            "Command State Unknown",
            format!("The enabled state of {} could not be read. Refresh and try again.", entry.wrapper.name),
        ));
    }
    if snapshot.toggle_locked(entry.wrapper.id) {
        return Err(ComponentError::rejected(
            "Command Disabled",
            format!("{} is disabled for this site and cannot be changed for a project.", entry.wrapper.name),
        ));
    }
    store
        .client()
        .set_enabled(store.scope(), entry.command_id, &entry.wrapper.name, enabled)
        .await?;
    let status = if enabled { "enabled" } else { "disabled" };
    info!(wrapper = %entry.wrapper.name, scope = %store.scope(), status, "toggled wrapper");
    Ok(Banner::new(format!("{} {status}", entry.wrapper.name)))
}

/// Result of the master switch: one entry per row that needed a change.
#[derive(Debug)]
pub struct MasterToggleReport {
    pub banner: Banner,
    pub changed: Vec<String>,
    pub failed: Vec<(String, ComponentError)>,
}

/// Bring every row to `enabled`, one independent request per row whose
/// state disagrees. Locked rows are left alone; a failed row keeps its
/// previous state.
pub async fn set_all_enabled(store: &Store, snapshot: &Snapshot, enabled: bool) -> MasterToggleReport {
    let mut changed = Vec::new();
    let mut failed = Vec::new();
    for (wrapper_id, entry) in &snapshot.wrappers {
        // Unknown rows are reported as failures rather than skipped.
        let settled = snapshot.is_enabled(*wrapper_id) == enabled || snapshot.toggle_locked(*wrapper_id);
        if settled && !snapshot.flag_unknown(*wrapper_id) {
            continue;
        }
        match toggle_wrapper(store, snapshot, entry, enabled).await {
            Ok(_) => changed.push(entry.wrapper.name.clone()),
            Err(error) => failed.push((entry.wrapper.name.clone(), error)),
        }
    }
    let flag = if enabled { "enabled" } else { "disabled" };
    MasterToggleReport {
        banner: Banner::new(format!("All commands {flag}.")),
        changed,
        failed,
    }
}

/// Enable, for the store's project, every wrapper that is enabled for the
/// site but not yet for the project.
pub async fn import_site_enabled(store: &Store, snapshot: &Snapshot) -> ComponentResult<Vec<Banner>> {
    if store.scope().is_site() {
        return Err(ComponentError::rejected(
            "No Project",
            "Site-wide settings can only be imported into a project.",
        ));
    }
    let mut banners = Vec::new();
    for (wrapper_id, entry) in &snapshot.wrappers {
        if snapshot.site_enabled(*wrapper_id) && !snapshot.is_enabled(*wrapper_id) {
            let banner = toggle_wrapper(store, snapshot, entry, true).await.map_err(|error| match error {
                ComponentError::Api { source, .. } => ComponentError::Api {
                    title: Some(format!("Could not import site-wide setting for {}", entry.wrapper.name)),
                    source,
                },
                other => other,
            })?;
            banners.push(banner);
        }
    }
    Ok(banners)
}

fn wrapper_entry(snapshot: &Snapshot, wrapper_id: i64) -> ComponentResult<&WrapperEntry> {
    snapshot
        .wrapper(wrapper_id)
        .ok_or_else(|| ComponentError::MissingReference(format!("No wrapper with id {wrapper_id} was found.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_commands;
    use serde_json::json;

    fn stored_config() -> CommandConfig {
        serde_json::from_value(json!({
            "inputs": {
                "bids": {"default-value": "false", "matcher": null, "user-settable": true, "advanced": false},
                "other-options": {"default-value": "null", "matcher": "", "user-settable": "false"}
            },
            "outputs": {"nifti": {"label": null}}
        }))
        .unwrap()
    }

    #[test]
    fn unchanged_form_posts_every_property_with_string_flags() {
        let form = ConfigForm::from_config(Scope::Site, 4, "dcm2niix-scan", &stored_config());
        let body = serde_json::to_value(form.submission()).unwrap();
        assert_eq!(
            body,
            json!({
                "inputs": {
                    "bids": {"default-value": "false", "matcher": "", "user-settable": "true", "advanced": "false"},
                    "other-options": {"default-value": "", "matcher": "", "user-settable": "false", "advanced": "false"}
                },
                "outputs": {"nifti": {"label": ""}}
            })
        );
    }

    #[test]
    fn edits_target_inputs_then_outputs() {
        let mut form = ConfigForm::from_config(Scope::Site, 4, "dcm2niix-scan", &stored_config());
        form.apply_edit("bids.advanced=yes").unwrap();
        form.apply_edit("bids.default-value=a=b").unwrap();
        form.apply_edit("nifti.label=NIfTI").unwrap();
        assert!(form.inputs["bids"].advanced);
        assert_eq!(form.inputs["bids"].default_value, "a=b");
        assert_eq!(form.outputs["nifti"], "NIfTI");

        assert!(matches!(form.apply_edit("nifti.matcher=x"), Err(ComponentError::Rejected { .. })));
        assert!(matches!(form.apply_edit("missing.label=x"), Err(ComponentError::MissingReference(_))));
        assert!(form.apply_edit("bids.advanced=maybe").is_err());
    }

    #[test]
    fn project_dialog_offers_reset_to_site_defaults() {
        let form = ConfigForm::from_config(Scope::project("CT1"), 4, "dcm2niix-scan", &stored_config());
        let dialog = form.dialog();
        assert_eq!(dialog.title, "Set Config Values");
        assert_eq!(dialog.button_labels(), vec!["Save", "Reset to Site-wide Default", "Cancel"]);
    }

    #[test]
    fn table_locks_project_rows_disabled_for_site() {
        let mut snapshot = Snapshot::from_commands(Scope::project("CT1"), sample_commands());
        snapshot.site_enabled.extend([(10, true), (11, false), (20, true)]);
        snapshot.project_enabled.extend([(10, true), (11, true), (20, false)]);
        let table = commands_table(&snapshot);
        assert_eq!(table.columns[0], "XNAT Command Label");
        assert_eq!(table.rows[0].cells[2], Cell::Toggle { checked: true, disabled: false });
        assert_eq!(table.rows[1].cells[2], Cell::Toggle { checked: false, disabled: true });
        assert_eq!(table.rows[2].cells[0].as_text(), Some("Debug"));
    }

    #[test]
    fn empty_registry_shows_no_commands_message() {
        let table = commands_table(&Snapshot::default());
        assert!(table.is_empty());
        assert_eq!(table.empty_message, NO_COMMANDS_MESSAGE);
    }
}
