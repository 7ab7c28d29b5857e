//! Snapshot of commands, wrappers and enabled flags for one scope.
//!
//! Every table is rendered from a [`Snapshot`]. Mutations never patch a
//! snapshot in place; callers take a fresh one with [`Store::refresh`].

use std::collections::{HashMap, HashSet};

use futures_util::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, warn};
use xcs_api::XnatClient;
use xcs_types::{Command, Scope, Wrapper};

use crate::error::{ComponentError, ComponentResult};

/// Owns the API client and the scope an invocation works in.
pub struct Store {
    client: XnatClient,
    scope: Scope,
}

impl Store {
    pub fn new(client: XnatClient, scope: Scope) -> Self {
        Self { client, scope }
    }

    pub fn client(&self) -> &XnatClient {
        &self.client
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Fetch commands and every wrapper's enabled flag(s).
    ///
    /// Flags are read at site scope, and additionally at project scope when
    /// the store is project scoped. A wrapper with a flag that cannot be read
    /// shows as disabled and is marked unknown, which locks its toggle.
    pub async fn refresh(&self) -> ComponentResult<Snapshot> {
        let commands = self
            .client
            .list_commands(None)
            .await
            .map_err(ComponentError::api("Could not retrieve commands"))?;
        let mut snapshot = Snapshot::from_commands(self.scope.clone(), commands);

        let lookups = snapshot.wrappers.values().map(|entry| async move {
            let site = self.read_flag(&Scope::Site, entry).await;
            let project = match &self.scope {
                Scope::Site => None,
                scope => Some(self.read_flag(scope, entry).await),
            };
            (entry.wrapper.id, site, project)
        });
        for (wrapper_id, site, project) in join_all(lookups).await {
            if site.is_none() || project.is_some_and(|flag| flag.is_none()) {
                snapshot.unknown_flags.insert(wrapper_id);
            }
            snapshot.site_enabled.insert(wrapper_id, site.unwrap_or(false));
            if let Some(project) = project {
                snapshot.project_enabled.insert(wrapper_id, project.unwrap_or(false));
            }
        }
        debug!(scope = %self.scope, wrappers = snapshot.wrappers.len(), "refreshed command snapshot");
        Ok(snapshot)
    }

    async fn read_flag(&self, scope: &Scope, entry: &WrapperEntry) -> Option<bool> {
        match self.client.get_enabled(scope, entry.command_id, &entry.wrapper.name).await {
            Ok(flag) => Some(flag),
            Err(error) => {
                warn!(%scope, wrapper = %entry.wrapper.name, %error, "could not read enabled flag");
                None
            }
        }
    }
}

/// A wrapper together with the command that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperEntry {
    pub command_id: i64,
    pub command_name: String,
    pub image: String,
    pub version: String,
    pub wrapper: Wrapper,
}

impl WrapperEntry {
    pub fn label(&self) -> &str {
        self.wrapper.display_label()
    }
}

/// Immutable view of the command registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub scope: Scope,
    pub commands: Vec<Command>,
    /// Keyed by wrapper id, in command order.
    pub wrappers: IndexMap<i64, WrapperEntry>,
    pub site_enabled: HashMap<i64, bool>,
    pub project_enabled: HashMap<i64, bool>,
    /// Wrappers whose enabled flag could not be read.
    pub unknown_flags: HashSet<i64>,
}

impl Snapshot {
    /// Index wrappers by id. Enabled flags start empty.
    pub fn from_commands(scope: Scope, commands: Vec<Command>) -> Self {
        let mut wrappers = IndexMap::new();
        for command in &commands {
            for wrapper in &command.wrappers {
                wrappers.insert(
                    wrapper.id,
                    WrapperEntry {
                        command_id: command.id,
                        command_name: command.name.clone(),
                        image: command.image_name().to_string(),
                        version: command.version_label().to_string(),
                        wrapper: wrapper.clone(),
                    },
                );
            }
        }
        Self {
            scope,
            commands,
            wrappers,
            ..Default::default()
        }
    }

    pub fn wrapper(&self, wrapper_id: i64) -> Option<&WrapperEntry> {
        self.wrappers.get(&wrapper_id)
    }

    /// Look a wrapper up by id or by name.
    pub fn find_wrapper(&self, key: &str) -> Option<&WrapperEntry> {
        if let Ok(id) = key.parse::<i64>()
            && let Some(entry) = self.wrappers.get(&id)
        {
            return Some(entry);
        }
        self.wrappers.values().find(|entry| entry.wrapper.name == key)
    }

    pub fn command(&self, command_id: i64) -> Option<&Command> {
        self.commands.iter().find(|command| command.id == command_id)
    }

    pub fn site_enabled(&self, wrapper_id: i64) -> bool {
        self.site_enabled.get(&wrapper_id).copied().unwrap_or(false)
    }

    /// Enabled flag at the snapshot's own scope. A project sees a wrapper as
    /// enabled only while it is enabled for the site too.
    pub fn is_enabled(&self, wrapper_id: i64) -> bool {
        match self.scope {
            Scope::Site => self.site_enabled(wrapper_id),
            Scope::Project(_) => {
                self.site_enabled(wrapper_id) && self.project_enabled.get(&wrapper_id).copied().unwrap_or(false)
            }
        }
    }

    pub fn flag_unknown(&self, wrapper_id: i64) -> bool {
        self.unknown_flags.contains(&wrapper_id)
    }

    /// Whether the wrapper's toggle can be used at this scope. Toggles are
    /// locked while their state is unknown, and project toggles while the
    /// site flag is off.
    pub fn toggle_locked(&self, wrapper_id: i64) -> bool {
        self.flag_unknown(wrapper_id) || (!self.scope.is_site() && !self.site_enabled(wrapper_id))
    }

    /// The master switch reads checked iff every row is checked. An empty
    /// table leaves it unchecked.
    pub fn master_checked(&self) -> bool {
        !self.wrappers.is_empty() && self.wrappers.keys().all(|id| self.is_enabled(*id))
    }

    /// Wrappers enabled at the snapshot's scope.
    pub fn enabled_wrappers(&self) -> impl Iterator<Item = &WrapperEntry> {
        self.wrappers.values().filter(|entry| self.is_enabled(entry.wrapper.id))
    }
}
