#![allow(rustdoc::private_intra_doc_links)]

extern crate gtk;
#[cfg(feature = "wayland")]
extern crate gtk_layer_shell as gtk_layer_shell;

use anyhow::{Context, Result};
use clap::CommandFactory as _;
use daemon_response::{DaemonResponse, DaemonResponseReceiver};
use display_backend::DisplayBackend;
use opts::{Action, ActionWithServer, Opt};
use paths::DawatiPaths;
use std::{os::unix::net, path::Path, time::Duration};

use crate::server::ForkResult;

mod app;
mod application_lifecycle;
mod client;
mod config;
mod daemon_response;
mod display_backend;
mod error_handling_ctx;
mod ipc_server;
mod opts;
mod panel_handler;
mod paths;
mod server;
mod util;
mod widgets;

/// How often a client tries to reach the daemon before giving up.
const CONNECT_ATTEMPTS: usize = 5;

fn main() {
    let opts = Opt::from_env();
    init_logging(opts.log_debug);

    if let Action::ShellCompletions { shell } = opts.action {
        clap_complete::generate(shell, &mut opts::RawOpt::command(), "dawati", &mut std::io::stdout());
        return;
    }

    if let Err(err) = run_with_display_backend(opts) {
        error_handling_ctx::print_error(err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
        return;
    }
    let level = if debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    let mut builder = pretty_env_logger::formatted_timed_builder();
    for module in ["dawati", "shell_core", "panel_host"] {
        builder.filter(Some(module), level);
    }
    builder.init();
}

/// Pick the display backend the daemon would use, among the ones compiled in.
fn run_with_display_backend(opts: Opt) -> Result<()> {
    let detected_wayland = detect_wayland();
    #[allow(unused)]
    let use_wayland = opts.force_wayland || detected_wayland;
    log::debug!("force_wayland={}, detected_wayland={}", opts.force_wayland, detected_wayland);

    #[cfg(all(feature = "wayland", feature = "x11"))]
    return if use_wayland { run::<display_backend::WaylandBackend>(opts) } else { run::<display_backend::X11Backend>(opts) };

    #[cfg(all(not(feature = "wayland"), feature = "x11"))]
    {
        if use_wayland {
            log::warn!("dawati was built without wayland support, using X11 instead");
        }
        return run::<display_backend::X11Backend>(opts);
    }

    #[cfg(all(feature = "wayland", not(feature = "x11")))]
    return run::<display_backend::WaylandBackend>(opts);

    #[cfg(not(any(feature = "wayland", feature = "x11")))]
    return run::<display_backend::NoBackend>(opts);
}

fn detect_wayland() -> bool {
    let session_type = std::env::var("XDG_SESSION_TYPE").unwrap_or_default();
    let wayland_display = std::env::var("WAYLAND_DISPLAY").unwrap_or_default();
    session_type.contains("wayland") || (!wayland_display.is_empty() && !session_type.contains("x11"))
}

fn run<B: DisplayBackend>(opts: Opt) -> Result<()> {
    let paths = match &opts.config_path {
        Some(config_dir) => DawatiPaths::from_config_dir(config_dir),
        None => DawatiPaths::default(),
    }
    .context("Failed to initialize dawati paths")?;

    let restart = opts.restart
        && match &opts.action {
            Action::Daemon => true,
            Action::WithServer(action) => action.can_start_daemon(),
            Action::ClientOnly(_) | Action::ShellCompletions { .. } => false,
        };
    if restart {
        if let Ok(Some(response)) = send_to_daemon(&paths, &ActionWithServer::KillServer, 1) {
            print_daemon_response(response);
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    let follow_logs = match opts.action {
        Action::ShellCompletions { .. } => false,
        Action::ClientOnly(action) => {
            client::handle_client_only_action(&paths, action)?;
            false
        }
        Action::Daemon if daemon_is_running(paths.get_ipc_socket_file()) => {
            eprintln!("dawati daemon already running.");
            true
        }
        Action::Daemon => {
            let fork_result = start_daemon::<B>(&paths, None, !opts.no_daemonize, opts.show_logs)?;
            opts.no_daemonize || fork_result == ForkResult::Parent
        }
        Action::WithServer(ActionWithServer::KillServer) => {
            if let Some(response) = send_to_daemon(&paths, &ActionWithServer::KillServer, 1)? {
                print_daemon_response(response);
            }
            false
        }
        Action::WithServer(action) => match send_to_daemon(&paths, &action, CONNECT_ATTEMPTS) {
            Ok(Some(response)) => {
                print_daemon_response(response);
                true
            }
            Ok(None) => true,
            Err(err) if action.can_start_daemon() && !opts.no_daemonize => {
                log::warn!("Failed to connect to daemon: {}", err);
                let (command, response_recv) = action.into_daemon_command();
                let fork_result = start_daemon::<B>(&paths, Some(command), true, opts.show_logs)?;
                if let (ForkResult::Parent, Some(recv)) = (&fork_result, response_recv) {
                    wait_for_first_response(recv)?;
                }
                fork_result == ForkResult::Parent
            }
            Err(err) => return Err(err),
        },
    };

    if follow_logs && opts.show_logs {
        client::handle_client_only_action(&paths, opts::ActionClientOnly::Logs)?;
    }
    Ok(())
}

fn start_daemon<B: DisplayBackend>(
    paths: &DawatiPaths,
    command: Option<app::DaemonCommand>,
    daemonize: bool,
    show_logs: bool,
) -> Result<ForkResult> {
    log::info!("Starting dawati daemon ({})", paths.get_ipc_socket_file().display());
    // a leftover socket of a crashed daemon would make binding fail
    let _ = std::fs::remove_file(paths.get_ipc_socket_file());
    if !show_logs {
        println!("Run `dawati logs` to see errors while editing your configuration.");
    }
    server::initialize_server::<B>(paths.clone(), command, daemonize)
}

/// Print the answer of a freshly started daemon to the command it was started with, if it answers in time.
fn wait_for_first_response(mut recv: DaemonResponseReceiver) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    if let Ok(Some(response)) = rt.block_on(async { tokio::time::timeout(Duration::from_millis(100), recv.recv()).await }) {
        println!("{}", response);
    }
    Ok(())
}

fn send_to_daemon(paths: &DawatiPaths, action: &ActionWithServer, connect_attempts: usize) -> Result<Option<DaemonResponse>> {
    let socket = paths.get_ipc_socket_file();
    log::debug!("Connecting to daemon at {}", socket.display());
    let mut stream = connect_with_retries(socket, connect_attempts).context("Failed to connect to daemon")?;
    client::do_server_call(&mut stream, action).context("Error while forwarding command to daemon")
}

fn print_daemon_response(response: DaemonResponse) {
    match response {
        DaemonResponse::Success(output) if output.is_empty() => {}
        DaemonResponse::Success(output) => println!("{}", output),
        DaemonResponse::Failure(message) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
    }
}

/// Connect to the daemon socket, only returning a connection once the daemon answered a ping.
fn connect_with_retries(socket_path: &Path, attempts: usize) -> Option<net::UnixStream> {
    (0..attempts).find_map(|attempt| {
        if attempt > 0 {
            std::thread::sleep(Duration::from_millis(200));
        }
        daemon_is_running(socket_path).then(|| net::UnixStream::connect(socket_path).ok()).flatten()
    })
}

fn daemon_is_running(socket_path: &Path) -> bool {
    net::UnixStream::connect(socket_path)
        .ok()
        .and_then(|mut stream| client::do_server_call(&mut stream, &ActionWithServer::Ping).ok())
        .is_some()
}
