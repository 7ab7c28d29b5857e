//! Container launcher: context discovery, launch forms and launch reports.
//!
//! A [`LaunchForm`] is resolved from the launch UI the server describes for
//! one wrapper and root element. Every input becomes exactly one
//! [`InputKind`]; rendering, editing and parameter collection all match on
//! that enum.

use indexmap::IndexMap;
use tracing::{debug, info};
use xcs_api::ApiError;
use xcs_types::{
    AvailableCommand, BulkLaunchReport, Cell, DetailValue, Dialog, DialogBody, DialogButton, LaunchReport, LaunchUi,
    LaunchUiInput, LaunchUiValues, ScanRecord, Table, TableRow, UiType,
};

use crate::error::{ComponentError, ComponentResult};
use crate::store::Store;

/// Values a boolean input treats as checked (case-insensitive).
const TRUE_VALUES: [&str; 5] = ["1", "y", "yes", "true", "t"];

/// Substrings never allowed in a submitted value.
const ILLEGAL_SEQUENCES: [&str; 5] = [";", "||", "&&", "(", "`"];

/// Static lists longer than this render as a single block.
const STATIC_LIST_BULLET_LIMIT: usize = 6;

pub const ILLEGAL_CHARACTERS_MESSAGE: &str =
    "Illegal characters were found in your inputs. Please correct this and try again.";

pub fn boolean_eval(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    TRUE_VALUES.contains(&value.as_str())
}

pub fn has_illegal_characters(value: &str) -> bool {
    ILLEGAL_SEQUENCES.iter().any(|sequence| value.contains(sequence))
}

/// Archive path of a scan, used as the scan root element value.
pub fn scan_path(session_id: &str, scan_id: &str) -> String {
    format!("/archive/experiments/{session_id}/scans/{scan_id}")
}

/// Where launches are being discovered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    pub project: String,
    pub xsi_type: String,
    /// Set when the context is an image session; enables scan-level discovery.
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    pub commands: Vec<AvailableCommand>,
    pub scan_commands: Vec<AvailableCommand>,
    pub scans: Vec<ScanRecord>,
}

/// Commands runnable in `context`. For an image session a second query
/// (with `Scan` substituted for `Session` in the data type) finds
/// scan-level commands, and the session's scans are fetched for selection.
pub async fn discover_commands(store: &Store, context: &LaunchContext) -> ComponentResult<Discovery> {
    let client = store.client();
    let commands = client.list_available(&context.project, &context.xsi_type).await?;
    let mut discovery = Discovery {
        commands,
        ..Default::default()
    };

    if let Some(session_id) = context.session_id.as_deref()
        && context.xsi_type.contains("Session")
    {
        let scan_type = context.xsi_type.replace("Session", "Scan");
        discovery.scan_commands = client.list_available(&context.project, &scan_type).await?;
        discovery.scans = client
            .list_scans(session_id)
            .await
            .map_err(ComponentError::api("Could not retrieve scans"))?;
    }
    debug!(
        commands = discovery.commands.len(),
        scan_commands = discovery.scan_commands.len(),
        scans = discovery.scans.len(),
        "discovered launchable commands"
    );
    Ok(discovery)
}

pub fn available_table(discovery: &Discovery) -> Table {
    let mut table = Table::new(["Wrapper ID", "Command", "Image", "Root Element", "Level", "Enabled"])
        .with_empty_message("No commands are available for this context");
    let levels = [("Session", &discovery.commands), ("Scan", &discovery.scan_commands)];
    for (level, commands) in levels {
        for command in commands {
            table.push(TableRow::new(
                format!("{level}-{}", command.wrapper_id),
                vec![
                    Cell::text(command.wrapper_id.to_string()),
                    Cell::text(command.display_label()),
                    Cell::text(&command.image_name),
                    Cell::text(&command.root_element_name),
                    Cell::text(level),
                    Cell::Toggle {
                        checked: command.enabled,
                        disabled: true,
                    },
                ],
            ));
        }
    }
    table
}

/// A selectable launch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOption {
    pub value: String,
    pub label: String,
}

impl TargetOption {
    pub fn for_scan(session_id: &str, scan: &ScanRecord) -> Self {
        Self {
            value: scan_path(session_id, &scan.id),
            label: scan.display_label(),
        }
    }
}

/// How one launch input is presented and collected.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    /// Pick one scan of the session.
    ScanSelectOne { options: Vec<TargetOption> },
    /// Check any number of scans; the checked scans are the bulk targets.
    ScanSelectMany { options: Vec<TargetOption>, selected: Vec<String> },
    /// Posted as-is, never shown.
    Hidden,
    /// Shown read-only and posted as-is.
    Static { value_label: String },
    /// Read-only list, e.g. the targets of a bulk launch.
    StaticList { items: Vec<String> },
    /// Checkbox posted as `"true"` or `"false"`.
    Boolean,
    /// Free text, also used for number and select controls.
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub name: String,
    pub label: String,
    pub description: String,
    pub required: bool,
    pub advanced: bool,
    /// A child input with no preset for its parent's value and no default is
    /// disabled and never posted.
    pub disabled: bool,
    pub parent: Option<String>,
    pub value: String,
    pub kind: InputKind,
}

impl FormInput {
    fn posted_value(&self) -> String {
        match &self.kind {
            InputKind::Boolean => boolean_eval(&self.value).to_string(),
            _ => self.value.clone(),
        }
    }

    fn is_user_facing(&self) -> bool {
        !matches!(self.kind, InputKind::Hidden)
    }
}

/// The resolved launch form for one wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchForm {
    pub wrapper_id: i64,
    pub wrapper_name: String,
    pub root_element: String,
    pub inputs: Vec<FormInput>,
    /// Bulk launch targets; empty for a single launch.
    pub targets: Vec<String>,
}

impl LaunchForm {
    /// Resolve the form for a single launch.
    ///
    /// Top-level inputs that are neither user-settable nor the root element
    /// are hidden. Values come from the first default UI value, falling back
    /// to the input's own value.
    pub fn from_launch_ui(wrapper_id: i64, root_element: &str, ui: &LaunchUi) -> ComponentResult<Self> {
        let inputs = ui.inputs.primary().cloned().unwrap_or_default();
        ensure_root_element(&inputs, root_element)?;
        Ok(Self {
            wrapper_id,
            wrapper_name: ui.wrapper_name.clone(),
            root_element: root_element.to_string(),
            inputs: resolve_inputs(&inputs, root_element, false),
            targets: Vec::new(),
        })
    }

    /// Resolve the shared form for a bulk launch over `targets`.
    ///
    /// The root element is shown as a read-only list of the targets and
    /// every other input is set once for all of them.
    pub fn from_bulk_launch_ui(
        wrapper_id: i64,
        root_element: &str,
        ui: &LaunchUi,
        targets: Vec<String>,
    ) -> ComponentResult<Self> {
        let inputs = ui.inputs.primary().cloned().unwrap_or_default();
        ensure_root_element(&inputs, root_element)?;
        let mut resolved = resolve_inputs(&inputs, root_element, true);
        if let Some(root) = resolved.iter_mut().find(|input| input.name == root_element) {
            root.kind = InputKind::StaticList { items: targets.clone() };
            root.value = targets.join(",");
        }
        Ok(Self {
            wrapper_id,
            wrapper_name: ui.wrapper_name.clone(),
            root_element: root_element.to_string(),
            inputs: resolved,
            targets,
        })
    }

    /// Turn the root element into a scan selector over the session's scans.
    pub fn with_scan_options(mut self, session_id: &str, scans: &[ScanRecord], many: bool) -> Self {
        let options: Vec<TargetOption> = scans.iter().map(|scan| TargetOption::for_scan(session_id, scan)).collect();
        let root_element = self.root_element.clone();
        if let Some(root) = self.input_mut(&root_element) {
            root.kind = if many {
                InputKind::ScanSelectMany {
                    options,
                    selected: Vec::new(),
                }
            } else {
                InputKind::ScanSelectOne { options }
            };
        }
        self
    }

    pub fn input(&self, name: &str) -> Option<&FormInput> {
        self.inputs.iter().find(|input| input.name == name)
    }

    fn input_mut(&mut self, name: &str) -> Option<&mut FormInput> {
        self.inputs.iter_mut().find(|input| input.name == name)
    }

    /// Set a user-facing input. Scan selectors accept a scan path or a bare
    /// scan id; a multi-scan selector accepts a comma-separated list.
    pub fn set(&mut self, name: &str, value: &str) -> ComponentResult<()> {
        let input = self
            .input_mut(name)
            .ok_or_else(|| ComponentError::MissingReference(format!("No input named \"{name}\" in this launch form.")))?;
        match &mut input.kind {
            InputKind::Hidden | InputKind::Static { .. } | InputKind::StaticList { .. } => {
                return Err(ComponentError::rejected(
                    "Cannot Launch Container",
                    format!("{name} cannot be changed."),
                ));
            }
            InputKind::ScanSelectOne { options } => {
                input.value = match_option(options, value)?;
            }
            InputKind::ScanSelectMany { options, selected } => {
                let picked = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| match_option(options, item))
                    .collect::<ComponentResult<Vec<String>>>()?;
                *selected = picked;
                input.value = selected.join(",");
            }
            InputKind::Boolean => input.value = boolean_eval(value).to_string(),
            InputKind::Text => input.value = value.to_string(),
        }
        Ok(())
    }

    /// Illegal characters first, then required inputs.
    pub fn validate(&self) -> ComponentResult<()> {
        let active = || self.inputs.iter().filter(|input| !input.disabled);
        if active().any(|input| has_illegal_characters(&input.value)) {
            return Err(ComponentError::rejected("Cannot Launch Container", ILLEGAL_CHARACTERS_MESSAGE));
        }
        let missing: Vec<String> = active()
            .filter(|input| input.required && input.name != self.root_element && input.value.trim().is_empty())
            .map(|input| format!("{} requires a value.", input.label))
            .collect();
        if !missing.is_empty() {
            return Err(ComponentError::Validation(missing));
        }
        Ok(())
    }

    /// Parameters for a single launch: every enabled input, root element
    /// first.
    pub fn params(&self) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        if let Some(root) = self.input(&self.root_element) {
            params.insert(root.name.clone(), root.posted_value());
        }
        for input in self.inputs.iter().filter(|input| !input.disabled) {
            params.entry(input.name.clone()).or_insert_with(|| input.posted_value());
        }
        params
    }

    /// Targets of a bulk launch: checked scans when the root is a multi-scan
    /// selector, otherwise the targets the form was opened with.
    pub fn bulk_targets(&self) -> Vec<String> {
        match self.input(&self.root_element).map(|root| &root.kind) {
            Some(InputKind::ScanSelectMany { selected, .. }) => selected.clone(),
            _ => self.targets.clone(),
        }
    }

    /// One parameter object per target: the root element set to the target,
    /// every other field copied from the shared form.
    pub fn bulk_params(&self) -> ComponentResult<Vec<IndexMap<String, String>>> {
        let targets = self.bulk_targets();
        if targets.is_empty() {
            return Err(ComponentError::rejected(
                "Error",
                format!("You must select at least one {}", self.root_element),
            ));
        }
        let shared = self.params();
        Ok(targets
            .into_iter()
            .map(|target| {
                let mut params = shared.clone();
                params.insert(self.root_element.clone(), target);
                params
            })
            .collect())
    }

    pub fn dialog(&self) -> Dialog {
        let mut dialog = Dialog::new("Set Container Launch Values");
        if !self.targets.is_empty() {
            dialog.body.push(DialogBody::Paragraph {
                text: format!("{} items selected to run in bulk.", self.targets.len()),
            });
        }
        dialog.body.push(DialogBody::Paragraph {
            text: "Please specify settings for this container.".into(),
        });

        let (advanced, standard): (Vec<&FormInput>, Vec<&FormInput>) = self
            .inputs
            .iter()
            .filter(|input| input.is_user_facing() && !input.disabled)
            .partition(|input| input.advanced);
        dialog.body.push(DialogBody::Details {
            rows: standard.into_iter().map(detail_row).collect(),
        });
        if !advanced.is_empty() {
            dialog.body.push(DialogBody::Paragraph {
                text: "Advanced Inputs".into(),
            });
            dialog.body.push(DialogBody::Details {
                rows: advanced.into_iter().map(detail_row).collect(),
            });
        }

        let run = if self.targets.is_empty() { "Run Container" } else { "Run Container(s)" };
        dialog.buttons.push(DialogButton::new(run));
        dialog.buttons.push(DialogButton::new("Cancel"));
        dialog
    }
}

fn ensure_root_element(inputs: &IndexMap<String, LaunchUiInput>, root_element: &str) -> ComponentResult<()> {
    if inputs.contains_key(root_element) {
        Ok(())
    } else {
        Err(ComponentError::MissingReference(format!(
            "Could not launch command. Root element \"{root_element}\" not found in the list of inputs provided."
        )))
    }
}

fn match_option(options: &[TargetOption], value: &str) -> ComponentResult<String> {
    options
        .iter()
        .find(|option| option.value == value || option.value.rsplit('/').next() == Some(value))
        .map(|option| option.value.clone())
        .ok_or_else(|| ComponentError::MissingReference(format!("\"{value}\" is not one of the available scans.")))
}

fn detail_row(input: &FormInput) -> (String, DetailValue) {
    let mut label = input.label.clone();
    if input.required {
        label.push_str(" (Required)");
    }
    let value = match &input.kind {
        InputKind::StaticList { items } if items.len() > STATIC_LIST_BULLET_LIMIT => DetailValue::Code(items.join("\n")),
        InputKind::StaticList { items } => DetailValue::List(items.clone()),
        InputKind::Static { value_label } if !value_label.is_empty() => DetailValue::Code(value_label.clone()),
        InputKind::ScanSelectOne { options } => DetailValue::List(
            options
                .iter()
                .map(|option| format!("({}) {}", if option.value == input.value { "*" } else { " " }, option.label))
                .collect(),
        ),
        InputKind::ScanSelectMany { options, selected } => DetailValue::List(
            options
                .iter()
                .map(|option| format!("[{}] {}", if selected.contains(&option.value) { "x" } else { " " }, option.label))
                .collect(),
        ),
        InputKind::Boolean => DetailValue::Code(if boolean_eval(&input.value) { "[x] True" } else { "[ ] True" }.into()),
        _ => DetailValue::Code(input.value.clone()),
    };
    (label, value)
}

fn resolve_inputs(inputs: &IndexMap<String, LaunchUiInput>, root_element: &str, bulk: bool) -> Vec<FormInput> {
    let mut resolved = Vec::new();
    for (name, input) in inputs.iter().filter(|(_, input)| input.parent.is_none()) {
        let is_root = name == root_element;
        let user_facing = input.user_settable.unwrap_or(false) && !(bulk && is_root);
        let default = input.ui.get("default");
        let kind = if user_facing || (is_root && !bulk) {
            kind_for(default)
        } else {
            InputKind::Hidden
        };
        let parent = resolve_one(name, input, default, kind, None);
        let parent_value = parent.value.clone();
        resolved.push(parent);

        for child_name in &input.children {
            let Some(child) = inputs.get(child_name) else {
                continue;
            };
            let values = child.ui.get(&parent_value).or_else(|| child.ui.get("default"));
            let disabled = values.is_none();
            let kind = if bulk || disabled || !child.user_settable.unwrap_or(false) {
                InputKind::Hidden
            } else {
                kind_for(values)
            };
            let mut child = resolve_one(child_name, child, values, kind, Some(name.clone()));
            child.disabled = disabled;
            resolved.push(child);
        }
    }
    resolved
}

fn resolve_one(
    name: &str,
    input: &LaunchUiInput,
    values: Option<&LaunchUiValues>,
    kind: InputKind,
    parent: Option<String>,
) -> FormInput {
    let first = values.and_then(|values| values.values.first());
    let value = first
        .and_then(|value| value.value.clone())
        .filter(|value| !value.is_empty())
        .or_else(|| input.value.clone())
        .filter(|value| value != "null")
        .unwrap_or_default();
    let kind = match kind {
        InputKind::Static { .. } => InputKind::Static {
            value_label: first.and_then(|value| value.label.clone()).unwrap_or_default(),
        },
        other => other,
    };
    FormInput {
        name: name.to_string(),
        label: input.label.clone().filter(|label| !label.is_empty()).unwrap_or_else(|| name.to_string()),
        description: input.description.clone().unwrap_or_default(),
        required: input.required.unwrap_or(false),
        advanced: input.advanced.unwrap_or(false),
        disabled: false,
        parent,
        value,
        kind,
    }
}

fn kind_for(values: Option<&LaunchUiValues>) -> InputKind {
    match values.map(|values| values.ui_type).unwrap_or_default() {
        UiType::Hidden => InputKind::Hidden,
        UiType::Boolean => InputKind::Boolean,
        UiType::Static => InputKind::Static {
            value_label: String::new(),
        },
        UiType::Default | UiType::Text | UiType::Number | UiType::Select => InputKind::Text,
    }
}

/// Fetch the launch UI for one target and resolve its form.
pub async fn open_launch(store: &Store, wrapper_id: i64, root_element: &str, value: &str) -> ComponentResult<LaunchForm> {
    if value.trim().is_empty() {
        return Err(ComponentError::MissingReference(format!(
            "Could not launch UI. No value provided for {root_element}."
        )));
    }
    let ui = store
        .client()
        .launch_ui(store.scope(), wrapper_id, root_element, value)
        .await
        .map_err(ComponentError::api(format!(
            "Could not launch UI with value: \"{value}\" for root element: \"{root_element}\"."
        )))?;
    LaunchForm::from_launch_ui(wrapper_id, root_element, &ui)
}

/// Fetch the bulk launch UI for several targets and resolve the shared form.
pub async fn open_bulk_launch(
    store: &Store,
    wrapper_id: i64,
    root_element: &str,
    targets: Vec<String>,
) -> ComponentResult<LaunchForm> {
    if targets.is_empty() {
        return Err(ComponentError::rejected(
            "Error",
            format!("You must select at least one {root_element}"),
        ));
    }
    let ui = store
        .client()
        .bulk_launch_ui(store.scope(), wrapper_id, root_element, &targets)
        .await
        .map_err(ComponentError::api(format!(
            "Could not launch UI with value(s): \"{}\" for root element: \"{root_element}\".",
            targets.join(",")
        )))?;
    LaunchForm::from_bulk_launch_ui(wrapper_id, root_element, &ui, targets)
}

/// Launch one container and describe the result.
///
/// A launch the server rejects with a JSON message is reported in the
/// result dialog rather than as an error modal.
pub async fn launch(store: &Store, form: &LaunchForm) -> ComponentResult<Dialog> {
    form.validate()?;
    match store.client().launch(store.scope(), form.wrapper_id, &form.params()).await {
        Ok(report) => {
            info!(wrapper = form.wrapper_id, workload = report.workload_id().unwrap_or(""), "launched container");
            Ok(launch_report_dialog(&report))
        }
        Err(error) => match rejected_launch(&error) {
            Some(report) => Ok(launch_report_dialog(&report)),
            None => Err(error.into()),
        },
    }
}

/// A refused launch whose body is a launch report carrying a message.
fn rejected_launch(error: &ApiError) -> Option<LaunchReport> {
    let ApiError::Http { body, .. } = error else {
        return None;
    };
    serde_json::from_str::<LaunchReport>(body)
        .ok()
        .filter(|report| report.message.is_some())
}

pub fn launch_report_dialog(report: &LaunchReport) -> Dialog {
    let status = report.status.clone().unwrap_or_else(|| "failed".into());
    let mut dialog = Dialog::new(format!("Container Launch {}", capitalize(&status)));
    if report.succeeded() {
        let (label, id) = match report.launch_type.as_deref() {
            Some("service") => ("Service ID", report.service_id.as_deref()),
            _ => ("Container ID", report.container_id.as_deref()),
        };
        dialog.body.push(DialogBody::Paragraph {
            text: format!("{label}: {}", id.or(report.workload_id()).unwrap_or("")),
        });
    } else {
        dialog.body.push(DialogBody::Details {
            rows: vec![
                (
                    "Error Message".into(),
                    DetailValue::Code(report.message.clone().unwrap_or_default()),
                ),
                (
                    "Parameters Submitted To XNAT".into(),
                    DetailValue::List(report.params.iter().map(|(key, value)| format!("{key}: {value}")).collect()),
                ),
            ],
        });
    }
    dialog.buttons.push(DialogButton::new("OK"));
    dialog
}

/// Launch one container per target and report successes and failures.
pub async fn bulk_launch(store: &Store, form: &LaunchForm) -> ComponentResult<Dialog> {
    form.validate()?;
    let params = form.bulk_params()?;
    let report = store.client().bulk_launch(store.scope(), form.wrapper_id, &params).await?;
    info!(
        wrapper = form.wrapper_id,
        successes = report.successes.len(),
        failures = report.failures.len(),
        "bulk launch finished"
    );
    Ok(bulk_report_dialog(&report, &form.root_element))
}

/// Partition a bulk launch response into success and failure lists, naming
/// each target by its root element value.
pub fn bulk_report_dialog(report: &BulkLaunchReport, root_element: &str) -> Dialog {
    let mut dialog = Dialog::new("Container Launch Record");
    let target = |params: &IndexMap<String, String>| params.get(root_element).cloned().unwrap_or_default();
    if !report.successes.is_empty() {
        dialog.body.push(DialogBody::Paragraph {
            text: "Successfully launched containers on:".into(),
        });
        dialog.body.push(DialogBody::Bullets {
            items: report.successes.iter().map(|outcome| target(&outcome.params)).collect(),
        });
    }
    if !report.failures.is_empty() {
        dialog.body.push(DialogBody::Paragraph {
            text: "Failed to launch containers on:".into(),
        });
        dialog.body.push(DialogBody::Bullets {
            items: report.failures.iter().map(|outcome| target(&outcome.params)).collect(),
        });
    }
    dialog.buttons.push(DialogButton::new("OK"));
    dialog
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn launch_ui() -> LaunchUi {
        serde_json::from_value(json!({
            "wrapper-id": 7,
            "wrapper-name": "dcm2niix-scan",
            "inputs": {
                "scan": {
                    "label": "Scan", "user-settable": true, "required": true,
                    "ui": {"default": {"type": "text", "values": [{"value": "/archive/experiments/E1/scans/1", "label": "1"}]}}
                },
                "bids": {
                    "label": "Create BIDS", "user-settable": true,
                    "ui": {"default": {"type": "boolean", "values": [{"value": "Y"}]}}
                },
                "other-options": {
                    "label": "Other options", "user-settable": true, "advanced": true, "required": true,
                    "ui": {"default": {"type": "text", "values": []}}
                },
                "session": {
                    "user-settable": false, "value": "E1",
                    "children": ["series"],
                    "ui": {"default": {"type": "text", "values": [{"value": "E1"}]}}
                },
                "series": {
                    "parent": "session", "user-settable": true,
                    "ui": {
                        "default": {"type": "text", "values": [{"value": "generic"}]},
                        "E1": {"type": "static", "values": [{"value": "T1", "label": "T1 weighted"}]}
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn boolean_eval_accepts_short_forms() {
        for value in ["1", "y", "YES", "True", "t"] {
            assert!(boolean_eval(value), "{value}");
        }
        assert!(!boolean_eval("no"));
        assert!(!boolean_eval(""));
    }

    #[test]
    fn inputs_resolve_to_closed_kinds() {
        let form = LaunchForm::from_launch_ui(7, "scan", &launch_ui()).unwrap();
        assert_eq!(form.input("scan").unwrap().kind, InputKind::Text);
        assert_eq!(form.input("bids").unwrap().kind, InputKind::Boolean);
        assert_eq!(form.input("session").unwrap().kind, InputKind::Hidden);
        let series = form.input("series").unwrap();
        assert_eq!(series.parent.as_deref(), Some("session"));
        assert_eq!(series.value, "T1");
        assert_eq!(
            series.kind,
            InputKind::Static {
                value_label: "T1 weighted".into()
            }
        );
    }

    #[test]
    fn params_post_booleans_as_strings_with_root_first() {
        let form = LaunchForm::from_launch_ui(7, "scan", &launch_ui()).unwrap();
        let params = form.params();
        assert_eq!(params.keys().next().map(String::as_str), Some("scan"));
        assert_eq!(params["bids"], "true");
        assert_eq!(params["session"], "E1");
    }

    #[test]
    fn missing_root_element_is_reported() {
        let error = LaunchForm::from_launch_ui(7, "session-id", &launch_ui()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Could not launch command. Root element \"session-id\" not found in the list of inputs provided."
        );
    }

    #[test]
    fn validation_rejects_illegal_characters_before_required_fields() {
        let mut form = LaunchForm::from_launch_ui(7, "scan", &launch_ui()).unwrap();
        form.set("other-options", "-z y; rm -rf /").unwrap();
        let error = form.validate().unwrap_err();
        assert_eq!(error.modal().message, ILLEGAL_CHARACTERS_MESSAGE);

        form.set("other-options", "").unwrap();
        let error = form.validate().unwrap_err();
        assert_eq!(error.modal().message, "Errors found:\n  • Other options requires a value.");

        form.set("other-options", "-z y").unwrap();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn hidden_inputs_cannot_be_set() {
        let mut form = LaunchForm::from_launch_ui(7, "scan", &launch_ui()).unwrap();
        assert!(form.set("session", "E2").is_err());
        assert!(matches!(form.set("nope", "x"), Err(ComponentError::MissingReference(_))));
    }

    #[test]
    fn scan_selectors_accept_ids_or_paths() {
        let scans = vec![
            ScanRecord {
                id: "1".into(),
                series_description: Some("T1".into()),
                scan_type: None,
            },
            ScanRecord {
                id: "2".into(),
                series_description: Some("T2".into()),
                scan_type: None,
            },
        ];
        let mut form = LaunchForm::from_launch_ui(7, "scan", &launch_ui())
            .unwrap()
            .with_scan_options("E1", &scans, true);
        assert!(matches!(form.bulk_params(), Err(ComponentError::Rejected { .. })));
        form.set("scan", "1, /archive/experiments/E1/scans/2").unwrap();
        let params = form.bulk_params().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[1]["scan"], "/archive/experiments/E1/scans/2");
        assert!(form.set("scan", "9").is_err());
    }

    #[test]
    fn bulk_form_lists_targets_and_copies_shared_fields() {
        let targets = vec!["A".to_string(), "B".to_string()];
        let mut form = LaunchForm::from_bulk_launch_ui(7, "scan", &launch_ui(), targets).unwrap();
        assert_eq!(
            form.input("scan").unwrap().kind,
            InputKind::StaticList {
                items: vec!["A".into(), "B".into()]
            }
        );
        form.set("other-options", "-v").unwrap();
        let params = form.bulk_params().unwrap();
        assert_eq!(params[0]["scan"], "A");
        assert_eq!(params[1]["scan"], "B");
        assert!(params.iter().all(|target| target["other-options"] == "-v"));
        assert_eq!(form.dialog().button_labels(), vec!["Run Container(s)", "Cancel"]);
    }

    #[test]
    fn long_static_lists_render_as_one_block() {
        let targets: Vec<String> = (1..=7).map(|n| n.to_string()).collect();
        let form = LaunchForm::from_bulk_launch_ui(7, "scan", &launch_ui(), targets).unwrap();
        let dialog = form.dialog();
        let DialogBody::Details { rows } = &dialog.body[2] else {
            panic!("expected details");
        };
        let scan = rows.iter().find(|(label, _)| label.starts_with("Scan")).unwrap();
        assert_eq!(scan.1, DetailValue::Code("1\n2\n3\n4\n5\n6\n7".into()));
    }

    #[test]
    fn bulk_report_partitions_targets() {
        let report: BulkLaunchReport = serde_json::from_value(json!({
            "successes": [{"params": {"scan": "A"}}],
            "failures": [{"params": {"scan": "B"}}]
        }))
        .unwrap();
        let dialog = bulk_report_dialog(&report, "scan");
        assert_eq!(
            dialog.body,
            vec![
                DialogBody::Paragraph {
                    text: "Successfully launched containers on:".into()
                },
                DialogBody::Bullets { items: vec!["A".into()] },
                DialogBody::Paragraph {
                    text: "Failed to launch containers on:".into()
                },
                DialogBody::Bullets { items: vec!["B".into()] },
            ]
        );
    }

    #[test]
    fn service_launches_report_service_id() {
        let report: LaunchReport = serde_json::from_value(json!({
            "status": "success", "type": "service", "service-id": "svc1", "container-id": "c1"
        }))
        .unwrap();
        let dialog = launch_report_dialog(&report);
        assert_eq!(dialog.title, "Container Launch Success");
        assert_eq!(
            dialog.body[0],
            DialogBody::Paragraph {
                text: "Service ID: svc1".into()
            }
        );
    }
}
