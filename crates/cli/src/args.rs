use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use xcs_types::EventType;
use xcs_util::DateWindow;

/// Administer the XNAT container service from the command line.
#[derive(Parser, Debug)]
#[command(name = "xcs", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: TopCommand,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// XNAT base URL
    #[arg(long, global = true, env = "XNAT_HOST")]
    pub host: Option<String>,

    /// XNAT user name
    #[arg(long, global = true, env = "XNAT_USER")]
    pub user: Option<String>,

    /// Work in this project instead of site-wide
    #[arg(long, short, global = true)]
    pub project: Option<String>,

    /// Skip confirmation prompts
    #[arg(long, short, global = true)]
    pub yes: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Print write requests instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum TopCommand {
    /// Registered commands, their wrappers and configuration
    #[command(subcommand)]
    Commands(CommandsCommand),
    /// The container host
    #[command(subcommand)]
    Hosts(HostsCommand),
    /// Image hubs
    #[command(subcommand)]
    Hubs(HubsCommand),
    /// Installed images
    #[command(subcommand)]
    Images(ImagesCommand),
    /// Launch containers
    #[command(subcommand)]
    Launch(LaunchCommand),
    /// Container execution history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Commands run on archive events
    #[command(subcommand)]
    Automation(AutomationCommand),
    /// Project settings
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Site-wide settings
    #[command(subcommand)]
    Site(SiteCommand),
    /// Local xcs settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum CommandsCommand {
    /// Wrappers with their enabled state
    List,
    /// One command definition
    Show { command: i64 },
    /// Register a command definition from a JSON or YAML file
    Add {
        file: PathBuf,
        /// Image the command runs in
        #[arg(long)]
        image: Option<String>,
    },
    /// Replace a command definition from a JSON or YAML file
    Update { command: i64, file: PathBuf },
    Delete { command: i64 },
    /// A wrapper's stored configuration
    #[command(subcommand)]
    Config(CommandConfigCommand),
    /// Enable a wrapper (id or name)
    Enable { wrapper: String },
    /// Disable a wrapper (id or name)
    Disable { wrapper: String },
    EnableAll,
    DisableAll,
    /// Enable for the project every wrapper enabled site-wide
    ImportSite,
}

#[derive(Subcommand, Debug)]
pub enum CommandConfigCommand {
    Get { wrapper: String },
    /// Apply `input.property=value` or `output.label=value` edits and save
    Set {
        wrapper: String,
        #[arg(required = true)]
        edits: Vec<String>,
    },
    /// Drop the stored configuration
    Reset { wrapper: String },
}

#[derive(Subcommand, Debug)]
pub enum HostsCommand {
    List,
    /// Define the container host, replacing the current one
    Set(HostArgs),
    /// Delete the container host definition
    Delete,
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Docker daemon URL or socket
    #[arg(long = "url")]
    pub host: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cert_path: Option<String>,
    #[arg(long)]
    pub swarm_mode: Option<bool>,
    #[arg(long)]
    pub xnat_prefix: Option<String>,
    #[arg(long)]
    pub docker_prefix: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum HubsCommand {
    List,
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Make this the default hub
        #[arg(long)]
        default: bool,
    },
    /// Change a hub's name or URL (hub id, name or URL)
    Edit {
        hub: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
    SetDefault { hub: String },
    Delete { hub: String },
}

#[derive(Subcommand, Debug)]
pub enum ImagesCommand {
    List,
    /// Pull an image and register the commands it declares
    Pull {
        image: String,
        #[arg(default_value = "latest")]
        tag: String,
        /// Hub id to pull through
        #[arg(long)]
        hub: Option<i64>,
    },
    /// Delete an image (id or tag)
    Delete { image: String },
    /// Commands registered for an image (id or tag)
    Commands { image: String },
}

#[derive(Subcommand, Debug)]
pub enum LaunchCommand {
    /// Commands runnable against a data type in the project
    Available {
        #[arg(long)]
        xsi_type: String,
        /// Image session id, to list scan-level commands and scans too
        #[arg(long)]
        session: Option<String>,
    },
    /// Show the launch form for one target
    Ui(LaunchTarget),
    /// Launch one container
    Run {
        #[command(flatten)]
        target: LaunchTarget,
        /// Input values as `name=value`
        #[arg(long = "set")]
        values: Vec<String>,
    },
    /// Launch one container per target with shared inputs
    Bulk {
        wrapper: i64,
        #[arg(long)]
        root: String,
        /// Session whose scans the targets name
        #[arg(long)]
        session: Option<String>,
        #[arg(required = true)]
        targets: Vec<String>,
        #[arg(long = "set")]
        values: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct LaunchTarget {
    pub wrapper: i64,
    /// Root element input name
    #[arg(long)]
    pub root: String,
    /// Root element value, or a scan id with --session
    #[arg(long)]
    pub value: String,
    /// Session whose scans the root element selects from
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    List {
        /// all, 1h, 8h, 24h, 7d or 30d
        #[arg(long, default_value = "all")]
        since: DateWindow,
    },
    Show { id: i64 },
    Log { id: String, file: LogFile },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LogFile {
    Stdout,
    Stderr,
}

impl LogFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFile::Stdout => "stdout",
            LogFile::Stderr => "stderr",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum AutomationCommand {
    List,
    /// Run a wrapper whenever an event fires in the project
    Add {
        /// SessionArchived or ScanArchived
        #[arg(long)]
        event: EventType,
        /// Wrapper id, or a wrapper name no other command shares
        #[arg(long)]
        wrapper: String,
    },
    Delete { id: i64 },
    Enable { id: i64 },
    Disable { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    List,
    /// Whether the project accepts commands enabled site-wide
    #[command(subcommand)]
    OptIn(OptInCommand),
}

#[derive(Subcommand, Debug)]
pub enum SiteCommand {
    /// Default opt-in for new projects
    #[command(subcommand)]
    OptIn(OptInCommand),
}

#[derive(Subcommand, Debug)]
pub enum OptInCommand {
    Get,
    Set {
        #[arg(action = clap::ArgAction::Set, required = true)]
        value: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    SetHost { url: String },
    SetUser { user: String },
    SetProject { project: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["xcs", "commands", "enable", "dcm2niix-scan", "--project", "CT1", "--dry-run"])
            .unwrap();
        assert_eq!(cli.global.project.as_deref(), Some("CT1"));
        assert!(cli.global.dry_run);
        assert!(matches!(
            cli.command,
            TopCommand::Commands(CommandsCommand::Enable { ref wrapper }) if wrapper == "dcm2niix-scan"
        ));
    }

    #[test]
    fn history_window_and_opt_in_values_parse() {
        let cli = Cli::try_parse_from(["xcs", "history", "list", "--since", "7d"]).unwrap();
        assert!(matches!(
            cli.command,
            TopCommand::History(HistoryCommand::List {
                since: DateWindow::LastWeek
            })
        ));
        let cli = Cli::try_parse_from(["xcs", "site", "opt-in", "set", "false"]).unwrap();
        assert!(matches!(
            cli.command,
            TopCommand::Site(SiteCommand::OptIn(OptInCommand::Set { value: false }))
        ));
        assert!(Cli::try_parse_from(["xcs", "automation", "add", "--event", "Deleted", "--wrapper", "x"]).is_err());
    }

    #[test]
    fn host_delete_takes_no_arguments() {
        let cli = Cli::try_parse_from(["xcs", "hosts", "delete", "--yes"]).unwrap();
        assert!(cli.global.yes);
        assert!(matches!(cli.command, TopCommand::Hosts(HostsCommand::Delete)));
        assert!(Cli::try_parse_from(["xcs", "hosts", "delete", "3"]).is_err());
    }
}
