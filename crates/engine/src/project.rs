//! Project opt-in to sitewide commands, and the site default for it.

use tracing::{info, warn};
use xcs_types::{Banner, Cell, ProjectRecord, ProjectSettings, Table, TableRow};

use crate::error::{ComponentError, ComponentResult};
use crate::store::Store;

pub async fn list_projects(store: &Store) -> ComponentResult<Vec<ProjectRecord>> {
    store
        .client()
        .list_projects()
        .await
        .map_err(ComponentError::api("Could not get project list."))
}

pub fn projects_table(projects: &[ProjectRecord]) -> Table {
    let mut table = Table::new(["ID", "Name"]).with_empty_message("No projects found.");
    for project in projects {
        table.push(TableRow::new(
            project.id.clone(),
            vec![Cell::text(&project.id), Cell::text(project.display_label())],
        ));
    }
    table
}

/// The project's opt-in flag.
///
/// A project with no stored preference takes the site default, and that
/// default is written back as the project's own preference. A failed
/// write-back is logged and otherwise ignored.
pub async fn get_project_opt_in(store: &Store, project_id: &str) -> ComponentResult<bool> {
    let client = store.client();
    match client.get_project_settings(project_id).await {
        Ok(settings) => Ok(settings.opt_into_sitewide_commands),
        Err(error) => {
            warn!(project = project_id, %error, "no stored opt-in preference; using the site default");
            let opt_in = client.get_site_opt_in().await?;
            let settings = ProjectSettings {
                opt_into_sitewide_commands: opt_in,
            };
            if let Err(error) = client.set_project_settings(project_id, &settings).await {
                warn!(project = project_id, %error, "could not store the default opt-in preference");
            }
            Ok(opt_in)
        }
    }
}

pub async fn set_project_opt_in(store: &Store, project_id: &str, opt_in: bool) -> ComponentResult<Banner> {
    let settings = ProjectSettings {
        opt_into_sitewide_commands: opt_in,
    };
    store.client().set_project_settings(project_id, &settings).await?;
    info!(project = project_id, opt_in, "set project opt-in");
    Ok(Banner::new(format!("Site-wide Command Opt-in Setting set to {opt_in}.")))
}

pub async fn get_site_opt_in(store: &Store) -> ComponentResult<bool> {
    Ok(store.client().get_site_opt_in().await?)
}

pub async fn set_site_opt_in(store: &Store, opt_in: bool) -> ComponentResult<Banner> {
    store
        .client()
        .set_site_opt_in(opt_in)
        .await
        .map_err(ComponentError::api("Could not set site-wide project preference for command opt-in"))?;
    info!(opt_in, "set site opt-in default");
    Ok(Banner::new(format!("Default Project Opt-in Preference Setting set to {opt_in}.")))
}
