//! Subcommand dispatch onto the engine components.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tracing::{debug, warn};
use xcs_api::{ClientSettings, XnatClient};
use xcs_engine::managers::{hosts, hubs, images};
use xcs_engine::{Outcome, Snapshot, Store, View, WrapperEntry, automation, commands, history, launcher, project};
use xcs_types::{ContainerHost, ImageHub, Scope, Table};
use xcs_util::{DateWindow, XcsConfig, now_millis};

use crate::args::{
    AutomationCommand, Cli, CommandConfigCommand, CommandsCommand, ConfigCommand, GlobalArgs, HistoryCommand,
    HostArgs, HostsCommand, HubsCommand, ImagesCommand, LaunchCommand, LaunchTarget, OptInCommand, ProjectCommand,
    SiteCommand, TopCommand,
};
use crate::output::{Output, confirm};

/// Settings shared by every subcommand.
struct Session {
    global: GlobalArgs,
    config: XcsConfig,
    out: Output,
}

impl Session {
    fn store(&self, scope: Scope) -> Result<Store> {
        let settings = ClientSettings::resolve(&self.config, self.global.host.as_deref(), self.global.user.as_deref())?
            .with_dry_run(self.global.dry_run);
        debug!(host = %settings.base_url, scope = %scope, "connecting");
        Ok(Store::new(XnatClient::new(settings)?, scope))
    }

    /// Store scoped to `--project`, or to the site when none was given.
    fn scoped_store(&self) -> Result<Store> {
        self.store(Scope::from_option(self.global.project.as_deref()))
    }

    /// `--project`, falling back to the configured default project.
    fn project(&self) -> Result<String> {
        self.global
            .project
            .clone()
            .or_else(|| self.config.default_project.clone())
            .filter(|project| !project.trim().is_empty())
            .ok_or_else(|| anyhow!("this command needs a project; pass --project or run `xcs config set-project <id>`"))
    }

    fn project_store(&self) -> Result<(String, Store)> {
        let project = self.project()?;
        let store = self.store(Scope::project(project.clone()))?;
        Ok((project, store))
    }

    fn confirm(&self, prompt: &str) -> Result<bool> {
        let confirmed = confirm(prompt, self.global.yes)?;
        if !confirmed {
            eprintln!("Cancelled.");
        }
        Ok(confirmed)
    }

    /// Print a change and the freshly fetched table of the view it changed.
    /// The change already happened, so a failed re-fetch only drops the table.
    async fn finish(&self, store: &Store, outcome: &Outcome) -> Result<()> {
        let refreshed = match outcome.owner() {
            Some(view) => match owning_table(store, view).await {
                Ok(table) => Some(table),
                Err(error) => {
                    warn!(?view, %error, "could not refresh after the change");
                    None
                }
            },
            None => None,
        };
        self.out.outcome(outcome, refreshed.as_ref())
    }
}

async fn owning_table(store: &Store, view: View) -> Result<Table> {
    let table = match view {
        View::Commands => commands::commands_table(&store.refresh().await?),
        View::Hosts => hosts::hosts_table(&hosts::list_hosts(store).await?),
        View::Hubs => hubs::hubs_table(&hubs::list_hubs(store).await?),
        View::Images => {
            let listed = images::list_images(store).await?;
            images::images_table(&listed, &store.refresh().await?)
        }
        View::History => {
            let mut entries = history::fetch(store).await?;
            history::sort_for_display(&mut entries);
            history::history_table(&entries, &store.refresh().await?, DateWindow::All, now_millis())
        }
        View::Automation => automation::mappings_table(&automation::list_mappings(store).await?, store.scope()),
    };
    Ok(table)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = XcsConfig::load().context("could not read the xcs config file")?;
    let session = Session {
        out: Output::new(cli.global.json),
        global: cli.global,
        config,
    };
    match cli.command {
        TopCommand::Commands(command) => run_commands(&session, command).await,
        TopCommand::Hosts(command) => run_hosts(&session, command).await,
        TopCommand::Hubs(command) => run_hubs(&session, command).await,
        TopCommand::Images(command) => run_images(&session, command).await,
        TopCommand::Launch(command) => run_launch(&session, command).await,
        TopCommand::History(command) => run_history(&session, command).await,
        TopCommand::Automation(command) => run_automation(&session, command).await,
        TopCommand::Project(command) => run_project(&session, command).await,
        TopCommand::Site(command) => run_site(&session, command).await,
        TopCommand::Config(command) => run_config(session, command),
    }
}

fn find_wrapper<'a>(snapshot: &'a Snapshot, key: &str) -> Result<&'a WrapperEntry> {
    snapshot
        .find_wrapper(key)
        .ok_or_else(|| anyhow!("no command wrapper matching \"{key}\""))
}

/// Command definitions may be written as JSON or YAML.
fn read_definition(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| matches!(extension, "yaml" | "yml"));
    let value = if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("{} is not valid YAML", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))?
    };
    Ok(value)
}

async fn run_commands(session: &Session, command: CommandsCommand) -> Result<()> {
    let out = &session.out;
    match command {
        CommandsCommand::List => {
            let store = session.scoped_store()?;
            let snapshot = store.refresh().await?;
            out.table(&commands::commands_table(&snapshot))
        }
        CommandsCommand::Show { command } => {
            let store = session.scoped_store()?;
            out.value(&store.client().get_command(command).await?)
        }
        CommandsCommand::Add { file, image } => {
            let definition = read_definition(&file)?;
            let store = session.store(Scope::Site)?;
            session.finish(&store, &images::add_command(&store, image.as_deref(), &definition).await?).await
        }
        CommandsCommand::Update { command, file } => {
            let definition = read_definition(&file)?;
            let store = session.store(Scope::Site)?;
            session.finish(&store, &images::replace_command(&store, command, &definition).await?).await
        }
        CommandsCommand::Delete { command } => {
            let store = session.store(Scope::Site)?;
            let definition = store.client().get_command(command).await?;
            if !session.confirm(&images::delete_command_confirmation(&definition))? {
                return Ok(());
            }
            session.finish(&store, &images::delete_command(&store, &definition).await?).await
        }
        CommandsCommand::Config(command) => run_command_config(session, command).await,
        CommandsCommand::Enable { wrapper } => toggle_one(session, &wrapper, true).await,
        CommandsCommand::Disable { wrapper } => toggle_one(session, &wrapper, false).await,
        CommandsCommand::EnableAll => toggle_all(session, true).await,
        CommandsCommand::DisableAll => toggle_all(session, false).await,
        CommandsCommand::ImportSite => {
            let (project, store) = session.project_store()?;
            let snapshot = store.refresh().await?;
            let banners = commands::import_site_enabled(&store, &snapshot).await?;
            if banners.is_empty() {
                println!("Every command enabled for the site is already enabled for {project}.");
            }
            for banner in &banners {
                out.banner(banner)?;
            }
            Ok(())
        }
    }
}

async fn toggle_one(session: &Session, key: &str, enabled: bool) -> Result<()> {
    let store = session.scoped_store()?;
    let snapshot = store.refresh().await?;
    let wrapper_id = find_wrapper(&snapshot, key)?.wrapper.id;
    let banner = commands::set_enabled(&store, &snapshot, wrapper_id, enabled).await?;
    session.finish(&store, &Outcome::new(banner.message, &[View::Commands])).await
}

async fn toggle_all(session: &Session, enabled: bool) -> Result<()> {
    let store = session.scoped_store()?;
    let snapshot = store.refresh().await?;
    let report = commands::set_all_enabled(&store, &snapshot, enabled).await;
    for (name, error) in &report.failed {
        warn!(wrapper = %name, %error, "could not toggle wrapper");
        session.out.error(&error.modal());
    }
    if !report.failed.is_empty() {
        bail!("{} of {} commands could not be changed", report.failed.len(), report.failed.len() + report.changed.len());
    }
    session
        .finish(&store, &Outcome::new(report.banner.message, &[View::Commands]))
        .await
}

async fn run_command_config(session: &Session, command: CommandConfigCommand) -> Result<()> {
    let store = session.scoped_store()?;
    let snapshot = store.refresh().await?;
    match command {
        CommandConfigCommand::Get { wrapper } => {
            let entry = find_wrapper(&snapshot, &wrapper)?;
            let form = commands::open_config(&store, entry.command_id, &entry.wrapper.name).await?;
            session.out.dialog(&form.dialog())
        }
        CommandConfigCommand::Set { wrapper, edits } => {
            let entry = find_wrapper(&snapshot, &wrapper)?;
            let mut form = commands::open_config(&store, entry.command_id, &entry.wrapper.name).await?;
            for edit in &edits {
                form.apply_edit(edit)?;
            }
            session.finish(&store, &commands::save_config(&store, &form).await?).await
        }
        CommandConfigCommand::Reset { wrapper } => {
            let entry = find_wrapper(&snapshot, &wrapper)?;
            let outcome = commands::reset_config(&store, entry.command_id, &entry.wrapper.name).await?;
            session.finish(&store, &outcome).await
        }
    }
}

async fn run_hosts(session: &Session, command: HostsCommand) -> Result<()> {
    let store = session.store(Scope::Site)?;
    match command {
        HostsCommand::List => {
            let hosts = hosts::list_hosts(&store).await?;
            session.out.table(&hosts::hosts_table(&hosts))
        }
        HostsCommand::Set(args) => {
            let current = match hosts::list_hosts(&store).await {
                Ok(hosts) => hosts.into_iter().next(),
                Err(error) => {
                    warn!(%error, "no current container host");
                    None
                }
            };
            let replacing = current
                .as_ref()
                .is_some_and(|host| !host.host.is_empty() && args.host.as_deref().is_some_and(|url| url != host.host));
            let host = apply_host_args(current.unwrap_or_default(), args);
            hosts::validate_host(&host)?;
            if let Some(warning) = hosts::save_confirmation(replacing) {
                if !session.confirm(warning)? {
                    return Ok(());
                }
            }
            session.finish(&store, &hosts::save_host(&store, &host).await?).await
        }
        HostsCommand::Delete => {
            let Some(host) = hosts::list_hosts(&store).await?.into_iter().next() else {
                bail!("no container host is defined");
            };
            if !session.confirm(&hosts::delete_confirmation(&host))? {
                return Ok(());
            }
            session.finish(&store, &hosts::delete_host(&store, &host).await?).await
        }
    }
}

fn apply_host_args(mut host: ContainerHost, args: HostArgs) -> ContainerHost {
    if let Some(url) = args.host {
        host.host = url;
    }
    if args.name.is_some() {
        host.name = args.name;
    }
    if args.cert_path.is_some() {
        host.cert_path = args.cert_path;
    }
    if let Some(swarm_mode) = args.swarm_mode {
        host.swarm_mode = swarm_mode;
    }
    if args.xnat_prefix.is_some() {
        host.path_translation_xnat_prefix = args.xnat_prefix;
    }
    if args.docker_prefix.is_some() {
        host.path_translation_docker_prefix = args.docker_prefix;
    }
    host
}

async fn run_hubs(session: &Session, command: HubsCommand) -> Result<()> {
    let store = session.store(Scope::Site)?;
    let out = &session.out;
    match command {
        HubsCommand::List => out.table(&hubs::hubs_table(&hubs::list_hubs(&store).await?)),
        HubsCommand::Add { name, url, default } => {
            let hub = ImageHub {
                name,
                url,
                default,
                ..Default::default()
            };
            session.finish(&store, &hubs::save_hub(&store, &hub).await?).await
        }
        HubsCommand::Edit { hub, name, url } => {
            let all = hubs::list_hubs(&store).await?;
            let mut hub = hubs::find_hub(&all, &hub)?.clone();
            if let Some(name) = name {
                hub.name = name;
            }
            if let Some(url) = url {
                hub.url = url;
            }
            session.finish(&store, &hubs::save_hub(&store, &hub).await?).await
        }
        HubsCommand::SetDefault { hub } => {
            let all = hubs::list_hubs(&store).await?;
            let outcome = hubs::set_default_hub(&store, hubs::find_hub(&all, &hub)?).await?;
            session.finish(&store, &outcome).await
        }
        HubsCommand::Delete { hub } => {
            let all = hubs::list_hubs(&store).await?;
            let hub = hubs::find_hub(&all, &hub)?;
            if !session.confirm(&hubs::delete_confirmation(hub)?)? {
                return Ok(());
            }
            session.finish(&store, &hubs::delete_hub(&store, hub).await?).await
        }
    }
}

async fn run_images(session: &Session, command: ImagesCommand) -> Result<()> {
    let store = session.store(Scope::Site)?;
    let out = &session.out;
    match command {
        ImagesCommand::List => {
            let snapshot = store.refresh().await?;
            out.table(&images::images_table(&images::list_images(&store).await?, &snapshot))
        }
        ImagesCommand::Pull { image, tag, hub } => {
            let request = images::PullRequest {
                image,
                tag,
                hub_id: hub,
            };
            session.finish(&store, &images::pull_image(&store, &request).await?).await
        }
        ImagesCommand::Delete { image } => {
            let all = images::list_images(&store).await?;
            let image = images::find_image(&all, &image)?;
            if !session.confirm(&images::delete_confirmation(image, false))? {
                return Ok(());
            }
            match images::delete_image(&store, image, false).await? {
                images::ImageDeletion::Deleted(outcome) => session.finish(&store, &outcome).await,
                images::ImageDeletion::InUse { confirmation } => {
                    if !session.confirm(&confirmation)? {
                        return Ok(());
                    }
                    match images::delete_image(&store, image, true).await? {
                        images::ImageDeletion::Deleted(outcome) => session.finish(&store, &outcome).await,
                        images::ImageDeletion::InUse { .. } => bail!("{} is still in use", image.title()),
                    }
                }
            }
        }
        ImagesCommand::Commands { image } => {
            let all = images::list_images(&store).await?;
            let image = images::find_image(&all, &image)?;
            let commands = images::image_commands(&store, image.title()).await?;
            out.table(&images::image_commands_table(&commands))
        }
    }
}

/// Resolve a launch form for one target. With a session the root element
/// selects among the session's scans and `value` may be a bare scan id.
async fn open_target(store: &Store, target: &LaunchTarget) -> Result<launcher::LaunchForm> {
    let Some(session_id) = target.session.as_deref() else {
        return Ok(launcher::open_launch(store, target.wrapper, &target.root, &target.value).await?);
    };
    let value = scan_value(session_id, &target.value);
    let form = launcher::open_launch(store, target.wrapper, &target.root, &value).await?;
    let scans = store.client().list_scans(session_id).await?;
    let mut form = form.with_scan_options(session_id, &scans, false);
    form.set(&target.root, &value)?;
    Ok(form)
}

fn scan_value(session_id: &str, value: &str) -> String {
    if value.starts_with('/') {
        value.to_string()
    } else {
        launcher::scan_path(session_id, value)
    }
}

fn apply_values(form: &mut launcher::LaunchForm, values: &[String]) -> Result<()> {
    for value in values {
        let (name, value) = value
            .split_once('=')
            .ok_or_else(|| anyhow!("expected name=value, got \"{value}\""))?;
        form.set(name.trim(), value)?;
    }
    Ok(())
}

async fn run_launch(session: &Session, command: LaunchCommand) -> Result<()> {
    let (project, store) = session.project_store()?;
    let out = &session.out;
    match command {
        LaunchCommand::Available { xsi_type, session: session_id } => {
            let context = launcher::LaunchContext {
                project,
                xsi_type,
                session_id,
            };
            let discovery = launcher::discover_commands(&store, &context).await?;
            out.table(&launcher::available_table(&discovery))
        }
        LaunchCommand::Ui(target) => out.dialog(&open_target(&store, &target).await?.dialog()),
        LaunchCommand::Run { target, values } => {
            let mut form = open_target(&store, &target).await?;
            apply_values(&mut form, &values)?;
            out.dialog(&launcher::launch(&store, &form).await?)
        }
        LaunchCommand::Bulk {
            wrapper,
            root,
            session: session_id,
            targets,
            values,
        } => {
            let targets: Vec<String> = match session_id.as_deref() {
                Some(session_id) => targets.iter().map(|target| scan_value(session_id, target)).collect(),
                None => targets,
            };
            let mut form = launcher::open_bulk_launch(&store, wrapper, &root, targets.clone()).await?;
            if let Some(session_id) = session_id.as_deref() {
                let scans = store.client().list_scans(session_id).await?;
                form = form.with_scan_options(session_id, &scans, true);
                form.set(&root, &targets.join(","))?;
            }
            apply_values(&mut form, &values)?;
            out.dialog(&launcher::bulk_launch(&store, &form).await?)
        }
    }
}

async fn run_history(session: &Session, command: HistoryCommand) -> Result<()> {
    let store = session.scoped_store()?;
    let out = &session.out;
    match command {
        HistoryCommand::List { since } => {
            let mut entries = history::fetch(&store).await?;
            history::sort_for_display(&mut entries);
            let snapshot = store.refresh().await?;
            out.table(&history::history_table(&entries, &snapshot, since, now_millis()))
        }
        HistoryCommand::Show { id } => {
            let entries = history::fetch(&store).await?;
            out.dialog(&history::view_history(&entries, id))
        }
        HistoryCommand::Log { id, file } => out.dialog(&history::view_log(&store, &id, file.as_str()).await?),
    }
}

async fn run_automation(session: &Session, command: AutomationCommand) -> Result<()> {
    let store = session.scoped_store()?;
    let out = &session.out;
    match command {
        AutomationCommand::List => {
            let mappings = automation::list_mappings(&store).await?;
            out.table(&automation::mappings_table(&mappings, store.scope()))
        }
        AutomationCommand::Add { event, wrapper } => {
            let form = automation::AutomationForm {
                project: session.project()?,
                event: Some(event),
                wrapper,
            };
            let snapshot = store.refresh().await?;
            session.finish(&store, &automation::create_mapping(&store, &snapshot, &form).await?).await
        }
        AutomationCommand::Delete { id } => {
            if !session.confirm(&format!("Delete command automation {id}?"))? {
                return Ok(());
            }
            session.finish(&store, &automation::delete_mapping(&store, id).await?).await
        }
        AutomationCommand::Enable { id } => {
            let outcome = automation::set_mapping_enabled(&store, id, true).await?;
            session.finish(&store, &outcome).await
        }
        AutomationCommand::Disable { id } => {
            let outcome = automation::set_mapping_enabled(&store, id, false).await?;
            session.finish(&store, &outcome).await
        }
    }
}

async fn run_project(session: &Session, command: ProjectCommand) -> Result<()> {
    let out = &session.out;
    match command {
        ProjectCommand::List => {
            let store = session.store(Scope::Site)?;
            out.table(&project::projects_table(&project::list_projects(&store).await?))
        }
        ProjectCommand::OptIn(OptInCommand::Get) => {
            let (project, store) = session.project_store()?;
            out.value(&project::get_project_opt_in(&store, &project).await?)
        }
        ProjectCommand::OptIn(OptInCommand::Set { value }) => {
            let (project, store) = session.project_store()?;
            out.banner(&project::set_project_opt_in(&store, &project, value).await?)
        }
    }
}

async fn run_site(session: &Session, command: SiteCommand) -> Result<()> {
    let store = session.store(Scope::Site)?;
    match command {
        SiteCommand::OptIn(OptInCommand::Get) => session.out.value(&project::get_site_opt_in(&store).await?),
        SiteCommand::OptIn(OptInCommand::Set { value }) => {
            session.out.banner(&project::set_site_opt_in(&store, value).await?)
        }
    }
}

fn run_config(session: Session, command: ConfigCommand) -> Result<()> {
    let mut config = session.config;
    match command {
        ConfigCommand::Show => return session.out.value(&config),
        ConfigCommand::SetHost { url } => config.host = Some(url),
        ConfigCommand::SetUser { user } => config.username = Some(user),
        ConfigCommand::SetProject { project } => config.default_project = Some(project),
    }
    let path = config.save().context("could not write the xcs config file")?;
    println!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_scan_ids_become_scan_paths() {
        assert_eq!(scan_value("E1", "4"), launcher::scan_path("E1", "4"));
        assert_eq!(scan_value("E1", "/archive/experiments/E1/scans/4"), "/archive/experiments/E1/scans/4");
    }

    #[test]
    fn definitions_load_from_yaml_or_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("debug.yaml");
        fs::write(&yaml, "name: debug\nimage: xnat/debug:2.0\n").unwrap();
        let json = dir.path().join("debug.json");
        fs::write(&json, r#"{"name": "debug", "image": "xnat/debug:2.0"}"#).unwrap();
        assert_eq!(read_definition(&yaml).unwrap(), read_definition(&json).unwrap());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        assert!(read_definition(&broken).is_err());
    }

    #[test]
    fn host_flags_override_only_what_was_given() {
        let current = ContainerHost {
            name: Some("Local".into()),
            host: "unix:///var/run/docker.sock".into(),
            ..Default::default()
        };
        let args = HostArgs {
            host: None,
            name: None,
            cert_path: None,
            swarm_mode: Some(true),
            xnat_prefix: Some("/data/xnat".into()),
            docker_prefix: None,
        };
        let host = apply_host_args(current, args);
        assert_eq!(host.name.as_deref(), Some("Local"));
        assert_eq!(host.host, "unix:///var/run/docker.sock");
        assert!(host.swarm_mode);
        assert_eq!(host.path_translation_xnat_prefix.as_deref(), Some("/data/xnat"));
    }
}
