use clap::{Parser, Subcommand};
use dawati_shared_util::PanelName;
use serde::{Deserialize, Serialize};

use crate::{
    app,
    daemon_response::{self, DaemonResponse, DaemonResponseReceiver, DaemonResponseSender},
};

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub force_wayland: bool,
    pub config_path: Option<std::path::PathBuf>,
    pub action: Action,
    pub show_logs: bool,
    pub restart: bool,
    pub no_daemonize: bool,
}

#[derive(Parser, Debug, PartialEq)]
#[command(author = "Dawati Shell developers")]
#[command(version, about, long_about = None)]
pub(super) struct RawOpt {
    /// Write out debug logs. (To read the logs, run `dawati logs`).
    #[arg(long = "debug", global = true)]
    log_debug: bool,

    /// Force dawati to use wayland. This is a no-op if dawati was compiled without wayland support.
    #[arg(long = "force-wayland", global = true)]
    force_wayland: bool,

    /// override path to configuration directory (directory that contains toolbar.json and dawati.css)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Watch the log output after executing the command
    #[arg(long = "logs", global = true)]
    show_logs: bool,

    /// Avoid daemonizing dawati.
    #[arg(long = "no-daemonize", global = true)]
    no_daemonize: bool,

    /// Restart the daemon completely before running the command
    #[arg(long = "restart", global = true)]
    restart: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Action {
    /// Generate a shell completion script
    ShellCompletions {
        #[arg(short, long)]
        shell: clap_complete::shells::Shell,
    },

    /// Start the dawati daemon.
    #[command(name = "daemon", alias = "d")]
    Daemon,

    #[command(flatten)]
    ClientOnly(ActionClientOnly),

    #[command(flatten)]
    WithServer(ActionWithServer),
}

#[derive(Subcommand, Debug, Serialize, Deserialize, PartialEq)]
pub enum ActionClientOnly {
    /// Print and watch the dawati logs
    #[command(name = "logs")]
    Logs,
}

#[derive(Subcommand, Debug, Serialize, Deserialize, PartialEq)]
pub enum ActionWithServer {
    /// Ping the dawati server, checking if it is reachable.
    #[command(name = "ping")]
    Ping,

    /// Reload toolbar.json and dawati.css
    #[command(name = "reload", alias = "r")]
    Reload,

    /// Kill the dawati daemon
    #[command(name = "kill", alias = "k")]
    KillServer,

    /// Replace the panel order of the running toolbar, until the next reload.
    #[command(name = "set-order")]
    SetOrder {
        /// Names of the panels, in the order their buttons should appear
        names: Vec<PanelName>,
    },

    /// Show a panel, as if its toolbar button was clicked
    #[command(name = "show", alias = "s")]
    ShowPanel { name: PanelName },

    /// Hide a panel that is currently shown
    #[command(name = "hide", alias = "h")]
    HidePanel { name: PanelName },

    /// Show the toolbar if it is hidden, hide it otherwise
    #[command(name = "toggle-toolbar", alias = "t")]
    ToggleToolbar,

    /// Print the panels on the toolbar, which one is shown and the modal depth
    #[command(name = "state")]
    ShowState,

    /// Print out the internal state of the daemon, for bug reports.
    #[command(name = "debug")]
    ShowDebug,
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { log_debug, force_wayland, config, show_logs, no_daemonize, restart, action } = other;
        Opt { log_debug, force_wayland, show_logs, restart, config_path: config, action, no_daemonize }
    }
}

impl ActionWithServer {
    /// Whether running this action without a daemon should start one.
    pub fn can_start_daemon(&self) -> bool {
        matches!(self, ActionWithServer::ShowPanel { .. } | ActionWithServer::SetOrder { .. } | ActionWithServer::ToggleToolbar)
    }

    pub fn into_daemon_command(self) -> (app::DaemonCommand, Option<DaemonResponseReceiver>) {
        let command = match self {
            ActionWithServer::Ping => {
                let (send, recv) = tokio::sync::mpsc::unbounded_channel();
                let _ = send.send(DaemonResponse::Success("pong".to_owned()));
                return (app::DaemonCommand::NoOp, Some(recv));
            }
            ActionWithServer::KillServer => app::DaemonCommand::KillServer,
            ActionWithServer::ToggleToolbar => app::DaemonCommand::ToggleToolbar,
            ActionWithServer::Reload => return with_response_channel(app::DaemonCommand::ReloadConfigAndCss),
            ActionWithServer::SetOrder { names } => {
                return with_response_channel(|sender| app::DaemonCommand::SetOrder { names, sender });
            }
            ActionWithServer::ShowPanel { name } => {
                return with_response_channel(|sender| app::DaemonCommand::ShowPanel { name, sender });
            }
            ActionWithServer::HidePanel { name } => {
                return with_response_channel(|sender| app::DaemonCommand::HidePanel { name, sender });
            }
            ActionWithServer::ShowState => return with_response_channel(app::DaemonCommand::PrintState),
            ActionWithServer::ShowDebug => return with_response_channel(app::DaemonCommand::PrintDebug),
        };
        (command, None)
    }
}

fn with_response_channel<O, F>(f: F) -> (O, Option<DaemonResponseReceiver>)
where
    F: FnOnce(DaemonResponseSender) -> O,
{
    let (sender, recv) = daemon_response::create_pair();
    (f(sender), Some(recv))
}
