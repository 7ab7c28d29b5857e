use tracing::info;
use xcs_types::{Cell, ImageHub, PingStatus, Table, TableRow};

use crate::error::{ComponentError, ComponentResult, require_fields};
use crate::store::Store;
use crate::{Outcome, View};

pub const DEFAULT_HUB_DELETE_TITLE: &str = "Cannot delete the default hub";

pub async fn list_hubs(store: &Store) -> ComponentResult<Vec<ImageHub>> {
    store
        .client()
        .list_hubs()
        .await
        .map_err(ComponentError::api("Could not retrieve image hubs"))
}

/// Hubs with their default flag and a delete action. The default hub's
/// delete action is disabled.
pub fn hubs_table(hubs: &[ImageHub]) -> Table {
    let mut table =
        Table::new(["ID", "Name", "URL", "Default", "Status", "Actions"]).with_empty_message("No image hubs are defined");
    for hub in hubs {
        let id = hub.id.map(|id| id.to_string()).unwrap_or_default();
        let delete = Cell::Action {
            label: "Delete".into(),
            disabled: hub.default,
            title: hub.default.then(|| DEFAULT_HUB_DELETE_TITLE.to_string()),
        };
        table.push(TableRow::new(
            if id.is_empty() { hub.url.clone() } else { id.clone() },
            vec![
                Cell::text(id),
                Cell::text(&hub.name),
                Cell::text(&hub.url),
                Cell::toggle(hub.default),
                Cell::text(PingStatus::from(hub.ping).to_string()),
                delete,
            ],
        ));
    }
    table
}

pub fn find_hub<'a>(hubs: &'a [ImageHub], key: &str) -> ComponentResult<&'a ImageHub> {
    hubs.iter()
        .find(|hub| hub.id.is_some_and(|id| id.to_string() == key) || hub.name == key || hub.url == key)
        .ok_or_else(|| ComponentError::MissingReference(format!("No image hub matching \"{key}\" was found.")))
}

pub fn validate_hub(hub: &ImageHub) -> ComponentResult<()> {
    require_fields([("url", hub.url.as_str()), ("name", hub.name.as_str())])
}

/// Create a hub, or update it when it carries an id. A hub saved with its
/// default flag set becomes the only default.
pub async fn save_hub(store: &Store, hub: &ImageHub) -> ComponentResult<Outcome> {
    validate_hub(hub)?;
    store.client().save_hub(hub.id, hub, hub.default).await?;
    info!(hub = %hub.name, url = %hub.url, "saved image hub");
    Ok(Outcome::new("Saved.", &[View::Hubs]))
}

pub async fn set_default_hub(store: &Store, hub: &ImageHub) -> ComponentResult<Outcome> {
    let id = hub_id(hub)?;
    store
        .client()
        .set_default_hub(id)
        .await
        .map_err(ComponentError::api("Could Not Set Default Hub"))?;
    info!(hub = %hub.name, "set default image hub");
    Ok(Outcome::new(format!("{} set as default", hub.name), &[View::Hubs]))
}

/// Text to confirm before deleting. The default hub cannot be deleted.
pub fn delete_confirmation(hub: &ImageHub) -> ComponentResult<String> {
    refuse_default(hub)?;
    Ok(format!(
        "Are you sure you'd like to delete the Container Host at {}? This action cannot be undone.",
        hub.url
    ))
}

pub async fn delete_hub(store: &Store, hub: &ImageHub) -> ComponentResult<Outcome> {
    refuse_default(hub)?;
    let id = hub_id(hub)?;
    store.client().delete_hub(id).await?;
    info!(hub = %hub.name, "deleted image hub");
    Ok(Outcome::new(format!("\"{}\" deleted.", hub.url), &View::AFTER_HUB_DELETE))
}

fn refuse_default(hub: &ImageHub) -> ComponentResult<()> {
    if hub.default {
        return Err(ComponentError::rejected(
            DEFAULT_HUB_DELETE_TITLE,
            format!("{} is the default image hub. Set another hub as default before deleting it.", hub.name),
        ));
    }
    Ok(())
}

fn hub_id(hub: &ImageHub) -> ComponentResult<i64> {
    hub.id
        .ok_or_else(|| ComponentError::MissingReference(format!("Image hub {} has no id.", hub.name)))
}
