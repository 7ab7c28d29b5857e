//! Command automation: run a wrapper whenever an archive event fires.

use tracing::info;
use xcs_types::{Cell, CommandEventMapping, EventType, NewEventMapping, Scope, Table, TableRow};

use crate::error::{ComponentError, ComponentResult};
use crate::store::{Snapshot, Store};
use crate::{Outcome, View};

pub const NO_MAPPINGS_MESSAGE: &str = "No command event mappings exist for this project.";
pub const NO_PROJECT_MAPPINGS_MESSAGE: &str = "No command automations exist for this project.";
pub const MISSING_FIELD_MESSAGE: &str = "Please enter a value for each field";

pub async fn list_mappings(store: &Store) -> ComponentResult<Vec<CommandEventMapping>> {
    Ok(store.client().list_event_mappings().await?)
}

/// Mappings visible at `scope`: every mapping for the site, only the
/// project's own mappings for a project.
pub fn mappings_table(mappings: &[CommandEventMapping], scope: &Scope) -> Table {
    let visible: Vec<&CommandEventMapping> = mappings
        .iter()
        .filter(|mapping| match scope.project_id() {
            Some(project) => mapping.project.as_deref() == Some(project),
            None => true,
        })
        .collect();
    let empty_message = if mappings.is_empty() || scope.is_site() {
        NO_MAPPINGS_MESSAGE
    } else {
        NO_PROJECT_MAPPINGS_MESSAGE
    };
    let mut table = Table::new(["ID", "Project", "Event", "Command", "Created By", "Enabled", "Action"])
        .with_empty_message(empty_message);
    for mapping in visible {
        table.push(TableRow::new(
            mapping.id.to_string(),
            vec![
                Cell::text(mapping.id.to_string()),
                Cell::text(mapping.project.clone().unwrap_or_default()),
                Cell::text(&mapping.event_type),
                Cell::text(&mapping.xnat_command_wrapper),
                Cell::text(mapping.subscription_user_name.clone().unwrap_or_default()),
                Cell::toggle(mapping.enabled.unwrap_or(false)),
                Cell::action("Delete"),
            ],
        ));
    }
    table
}

/// A wrapper offered in the add form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub command_id: i64,
    pub wrapper_id: i64,
    pub wrapper_name: String,
    pub contexts: Vec<String>,
    /// Set while no event is chosen, or when none of the wrapper's contexts
    /// match the chosen event.
    pub disabled: bool,
}

/// Wrappers the add form offers. A project only offers wrappers enabled for
/// it.
pub fn command_options(snapshot: &Snapshot, event: Option<EventType>) -> ComponentResult<Vec<CommandOption>> {
    let options: Vec<CommandOption> = snapshot
        .wrappers
        .values()
        .filter(|entry| snapshot.scope.is_site() || snapshot.is_enabled(entry.wrapper.id))
        .map(|entry| CommandOption {
            command_id: entry.command_id,
            wrapper_id: entry.wrapper.id,
            wrapper_name: entry.wrapper.name.clone(),
            contexts: entry.wrapper.contexts.clone(),
            disabled: !event.is_some_and(|event| entry.wrapper.supports_any(event.contexts())),
        })
        .collect();
    if options.is_empty() {
        return Err(ComponentError::rejected(
            "Cannot create automation",
            "Could not add a command. Check the command list.",
        ));
    }
    Ok(options)
}

/// Pick the option a user named, by wrapper id or by wrapper name. Wrapper
/// names are only unique within a command, so a name shared by several
/// commands must be given as an id.
pub fn find_option<'a>(options: &'a [CommandOption], key: &str) -> ComponentResult<&'a CommandOption> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>()
        && let Some(option) = options.iter().find(|option| option.wrapper_id == id)
    {
        return Ok(option);
    }
    let named: Vec<&CommandOption> = options.iter().filter(|option| option.wrapper_name == key).collect();
    match named.as_slice() {
        [] => Err(ComponentError::MissingReference(format!(
            "No command \"{key}\" can be automated here."
        ))),
        [option] => Ok(option),
        several => {
            let ids: Vec<String> = several.iter().map(|option| option.wrapper_id.to_string()).collect();
            Err(ComponentError::rejected(
                "Cannot create automation",
                format!(
                    "More than one command defines {key}. Choose it by wrapper id ({}).",
                    ids.join(", ")
                ),
            ))
        }
    }
}

/// The add form's fields. Every one is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationForm {
    pub project: String,
    pub event: Option<EventType>,
    /// Wrapper id, or a wrapper name unique across commands.
    pub wrapper: String,
}

pub async fn create_mapping(store: &Store, snapshot: &Snapshot, form: &AutomationForm) -> ComponentResult<Outcome> {
    let project = match store.scope().project_id() {
        Some(project) => project.to_string(),
        None => form.project.trim().to_string(),
    };
    let (Some(event), false, false) = (form.event, project.is_empty(), form.wrapper.trim().is_empty()) else {
        return Err(ComponentError::rejected("Create Command Automation", MISSING_FIELD_MESSAGE));
    };

    let options = command_options(snapshot, Some(event))?;
    let option = find_option(&options, &form.wrapper)?;
    if option.disabled {
        return Err(ComponentError::rejected(
            "Cannot create automation",
            format!("{} does not run {}.", option.wrapper_name, event.label()),
        ));
    }

    let mapping = NewEventMapping {
        project,
        command_id: option.command_id,
        xnat_command_wrapper: option.wrapper_name.clone(),
        event_type: event,
    };
    store
        .client()
        .create_event_mapping(&mapping)
        .await
        .map_err(ComponentError::api("Could not create command automation"))?;
    info!(project = %mapping.project, wrapper = %mapping.xnat_command_wrapper, event = %event, "created command automation");
    Ok(Outcome::new("Success! Command automation has been added", &[View::Automation]))
}

pub async fn delete_mapping(store: &Store, id: i64) -> ComponentResult<Outcome> {
    store
        .client()
        .delete_event_mapping(id)
        .await
        .map_err(ComponentError::api("Could not delete command automation"))?;
    info!(id, "deleted command automation");
    Ok(Outcome::new(
        "Successfully removed command automation from project.",
        &[View::Automation],
    ))
}

pub async fn set_mapping_enabled(store: &Store, id: i64, enabled: bool) -> ComponentResult<Outcome> {
    store.client().set_event_mapping_enabled(id, enabled).await?;
    let state = if enabled { "enabled" } else { "disabled" };
    info!(id, state, "toggled command automation");
    Ok(Outcome::new(format!("Command automation {id} {state}."), &[View::Automation]))
}
