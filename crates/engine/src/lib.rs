//! # XCS Engine
//!
//! View-model components for the XNAT container service admin panel.
//!
//! Each component is a set of free functions over a [`Store`] (the API
//! client plus the scope being administered) and, where rows depend on the
//! command registry, a [`Snapshot`] taken with [`Store::refresh`]. Reads
//! return [`xcs_types::Table`]s and [`xcs_types::Dialog`]s; mutations return
//! an [`Outcome`] naming the views a front end should re-render.
//!
//! ## Modules
//!
//! - **`store`**: command snapshot with site and project enabled flags
//! - **`commands`**: enabled-commands table, toggles and the config editor
//! - **`managers`**: container host, image hubs, images and their commands
//! - **`launcher`**: context discovery, launch forms and launch reports
//! - **`history`**: container execution history, detail and log dialogs
//! - **`automation`**: event-to-command mappings
//! - **`project`**: project and site opt-in preferences
//!
//! ```rust,no_run
//! use xcs_api::{ClientSettings, XnatClient};
//! use xcs_engine::{Store, commands};
//! use xcs_types::Scope;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = XnatClient::new(ClientSettings::new("https://xnat.example.org"))?;
//! let store = Store::new(client, Scope::Site);
//! let snapshot = store.refresh().await?;
//! let table = commands::commands_table(&snapshot);
//! println!("{} wrappers", table.rows.len());
//! # Ok(())
//! # }
//! ```

pub mod automation;
pub mod commands;
pub mod error;
pub mod history;
pub mod launcher;
pub mod managers;
pub mod project;
pub mod store;

pub use error::{ComponentError, ComponentResult};
pub use store::{Snapshot, Store, WrapperEntry};
use xcs_types::Banner;

/// A table a front end renders and may need to rebuild after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Commands,
    Hosts,
    Hubs,
    Images,
    History,
    Automation,
}

impl View {
    /// Deleting a host or hub cascades to the image list, command config and
    /// history.
    pub const AFTER_HOST_DELETE: [View; 4] = [View::Hosts, View::Images, View::Commands, View::History];
    pub const AFTER_HUB_DELETE: [View; 4] = [View::Hubs, View::Images, View::Commands, View::History];
}

/// Result of a successful mutation: the banner to show and the views whose
/// data changed. There is no partial update; each listed view is re-fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub banner: Banner,
    pub refresh: Vec<View>,
}

impl Outcome {
    pub fn new(message: impl Into<String>, refresh: &[View]) -> Self {
        Self {
            banner: Banner::new(message),
            refresh: refresh.to_vec(),
        }
    }

    /// The view the mutated item is listed in. It comes first in `refresh`.
    pub fn owner(&self) -> Option<View> {
        self.refresh.first().copied()
    }
}
