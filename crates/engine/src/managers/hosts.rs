use tracing::info;
use xcs_types::{Cell, ContainerHost, DetailValue, Dialog, DialogBody, DialogButton, PingStatus, Table, TableRow};

use crate::error::{ComponentError, ComponentResult, require_fields};
use crate::store::Store;
use crate::{Outcome, View};

pub const REPLACE_HOST_WARNING: &str =
    "This will replace your existing host definition. Are you sure you want to do this? This action cannot be undone.";

/// The configured container host. The server keeps a single definition.
pub async fn list_hosts(store: &Store) -> ComponentResult<Vec<ContainerHost>> {
    let host = store
        .client()
        .get_host()
        .await
        .map_err(ComponentError::api("Could not retrieve container host"))?;
    Ok(vec![host])
}

pub fn hosts_table(hosts: &[ContainerHost]) -> Table {
    let mut table = Table::new(["Host Name", "Host Path", "Default", "Status", "Actions"])
        .with_empty_message("No container host is defined");
    for host in hosts {
        let key = host.id.map(|id| id.to_string()).unwrap_or_else(|| host.host.clone());
        table.push(TableRow::new(
            key,
            vec![
                Cell::text(host.name.as_deref().unwrap_or(&host.host)),
                Cell::text(&host.host),
                Cell::Toggle {
                    checked: true,
                    disabled: true,
                },
                Cell::text(PingStatus::from(host.ping).to_string()),
                Cell::action("Edit"),
            ],
        ));
    }
    table
}

/// Read-only view of a host definition.
pub fn host_dialog(host: &ContainerHost) -> Dialog {
    let field = |value: Option<&str>| DetailValue::Code(value.unwrap_or("").to_string());
    let rows = vec![
        ("Host Name".to_string(), field(host.name.as_deref())),
        ("URL".to_string(), field(Some(&host.host))),
        ("Certificate Path".to_string(), field(host.cert_path.as_deref())),
        ("Swarm Mode".to_string(), DetailValue::Code(host.swarm_mode.to_string())),
        (
            "XNAT Path Prefix".to_string(),
            field(host.path_translation_xnat_prefix.as_deref()),
        ),
        (
            "Docker Path Prefix".to_string(),
            field(host.path_translation_docker_prefix.as_deref()),
        ),
        ("Status".to_string(), DetailValue::Code(PingStatus::from(host.ping).to_string())),
    ];
    let mut dialog = Dialog::new("Edit Container Server Host").with_body(DialogBody::Details { rows });
    dialog.buttons.push(DialogButton::new("Save"));
    dialog.buttons.push(DialogButton::new("Cancel"));
    dialog
}

pub fn validate_host(host: &ContainerHost) -> ComponentResult<()> {
    require_fields([("host", host.host.as_str())])
}

/// Confirmation needed before saving: creating a host replaces the
/// existing definition.
pub fn save_confirmation(is_new: bool) -> Option<&'static str> {
    is_new.then_some(REPLACE_HOST_WARNING)
}

pub async fn save_host(store: &Store, host: &ContainerHost) -> ComponentResult<Outcome> {
    validate_host(host)?;
    store.client().set_host(host).await?;
    info!(host = %host.host, "saved container host");
    Ok(Outcome::new("Saved.", &[View::Hosts]))
}

pub fn delete_confirmation(host: &ContainerHost) -> String {
    format!(
        "Are you sure you'd like to delete the Container Host at {}? This action cannot be undone.",
        host.host
    )
}

/// Delete the host definition. Images, commands and history all depend on
/// the host, so they are refreshed too.
pub async fn delete_host(store: &Store, host: &ContainerHost) -> ComponentResult<Outcome> {
    let id = host
        .id
        .ok_or_else(|| ComponentError::MissingReference(format!("Container host {} has no id.", host.host)))?;
    store
        .client()
        .delete_host(id)
        .await
        .map_err(ComponentError::api("Could not delete container host"))?;
    info!(host = %host.host, "deleted container host");
    Ok(Outcome::new(format!("\"{}\" deleted.", host.host), &View::AFTER_HOST_DELETE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_the_only_required_field() {
        let mut host = ContainerHost::default();
        let error = validate_host(&host).unwrap_err();
        assert_eq!(error.modal().message, "Errors found:\n  • host requires a value.");
        host.host = "unix:///var/run/docker.sock".into();
        assert!(validate_host(&host).is_ok());
    }

    #[test]
    fn table_reports_ping_status() {
        let hosts = vec![
            ContainerHost {
                name: Some("Local".into()),
                host: "unix:///var/run/docker.sock".into(),
                ping: Some(false),
                ..Default::default()
            },
            ContainerHost {
                host: "tcp://swarm:2376".into(),
                ..Default::default()
            },
        ];
        let table = hosts_table(&hosts);
        assert_eq!(table.rows[0].cells[3].as_text(), Some("Down"));
        assert_eq!(table.rows[1].cells[0].as_text(), Some("tcp://swarm:2376"));
        assert_eq!(table.rows[1].cells[3].as_text(), Some("No response to ping"));
    }

    #[test]
    fn only_new_hosts_need_replace_confirmation() {
        assert_eq!(save_confirmation(true), Some(REPLACE_HOST_WARNING));
        assert_eq!(save_confirmation(false), None);
    }
}
