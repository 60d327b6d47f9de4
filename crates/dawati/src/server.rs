use crate::{
    app::{App, DaemonCommand},
    config::{self, ToolbarConfig},
    daemon_response::{self, DaemonResponse},
    display_backend::{self, DisplayBackend},
    error_handling_ctx, ipc_server, panel_handler,
    paths::DawatiPaths,
    widgets::{input_grab::GtkInputGrab, surfaces::SurfaceRegistry, toolbar::GtkToolbar, trigger::TriggerStrip, window::ToolbarWindow},
};
use anyhow::{Context, Result};
use shell_core::{modal::ModalStack, toolbar::Toolbar};

use std::{
    marker::PhantomData,
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// A reload happens once the config files were left alone for this long.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ForkResult {
    Parent,
    Child,
}

/// Start the daemon. In the parent process this returns right after forking; in the daemon it
/// only returns once the gtk main loop stopped.
pub fn initialize_server<B: DisplayBackend>(paths: DawatiPaths, action: Option<DaemonCommand>, should_daemonize: bool) -> Result<ForkResult> {
    std::env::set_current_dir(paths.get_config_dir())
        .with_context(|| format!("Failed to change working directory to {}", paths.get_config_dir().display()))?;
    log::info!("Loading paths: {}", &paths);

    let toolbar_config = config::read_from_file(&paths.get_toolbar_config_path()).unwrap_or_else(|err| {
        error_handling_ctx::print_error(err);
        log::warn!("Starting with an empty toolbar");
        ToolbarConfig::default()
    });

    if should_daemonize && detach_from_terminal(paths.get_log_file())? == ForkResult::Parent {
        return Ok(ForkResult::Parent);
    }
    log::info!("Initializing dawati daemon (pid {})", std::process::id());

    simple_signal::set_handler(&[simple_signal::Signal::Int, simple_signal::Signal::Term], |signal| {
        log::info!("Received {:?}, shutting down", signal);
        if let Err(err) = crate::application_lifecycle::request_shutdown() {
            log::error!("{:?}", err);
            std::process::exit(1);
        }
    });

    gtk::init().context("Failed to initialize gtk")?;

    let (ui_send, ui_recv) = tokio::sync::mpsc::unbounded_channel();
    let app = build_app::<B>(paths, toolbar_config, ui_send.clone())?;
    spawn_background_tasks(app.paths.clone(), ui_send);
    run_event_loop(app, action, ui_recv);

    gtk::main();
    log::info!("gtk main loop finished");
    Ok(ForkResult::Child)
}

fn build_app<B: DisplayBackend>(paths: DawatiPaths, toolbar_config: ToolbarConfig, ui_send: UnboundedSender<DaemonCommand>) -> Result<App<B>> {
    log::debug!("Creating toolbar window (wayland: {})", B::IS_WAYLAND);
    let display = gdk::Display::default().context("Could not get default display")?;
    let monitor = display_backend::get_monitor(&display, toolbar_config.monitor.as_ref())?;
    let window = ToolbarWindow::new(B::initialize_window(&toolbar_config, &monitor), ui_send.clone());
    let trigger = TriggerStrip::new(
        B::initialize_trigger_window(&monitor),
        Duration::from_millis(toolbar_config.trigger_delay_ms),
        ui_send.clone(),
    );

    let panel_handler = panel_handler::init(ui_send.clone())?;
    let surfaces = SurfaceRegistry::new();
    let gtk_toolbar = GtkToolbar {
        container: window.container.clone(),
        panels_dir: toolbar_config.panels_dir.clone(),
        surfaces: surfaces.clone(),
        app_evt_send: ui_send,
        panel_send: panel_handler.sender(),
    };

    let mut app = App {
        // starts out empty, so loading the config below builds every button
        config: ToolbarConfig { order: Vec::new(), ..toolbar_config.clone() },
        toolbar: Toolbar::new(gtk_toolbar),
        modal: ModalStack::new(),
        input_grab: GtkInputGrab::new(window.window.clone(), surfaces),
        window,
        trigger,
        css_provider: gtk::CssProvider::new(),
        panel_handler,
        paths,
        display_backend: PhantomData,
    };

    if let Some(screen) = gdk::Screen::default() {
        gtk::StyleContext::add_provider_for_screen(&screen, &app.css_provider, gtk::STYLE_PROVIDER_PRIORITY_APPLICATION);
    }
    match config::read_css_from_file(&app.paths.get_css_path()) {
        Ok(Some(css)) => crate::log_err!("while loading the stylesheet", app.load_css(&css)),
        Ok(None) => {}
        Err(err) => error_handling_ctx::print_error(err),
    }
    if let Err(err) = app.load_config(toolbar_config) {
        error_handling_ctx::print_error(err);
    }
    app.trigger.show();
    app.window.show();
    Ok(app)
}

/// Handle commands on the gtk main context, one at a time, starting with the command the daemon was launched with.
fn run_event_loop<B: DisplayBackend>(mut app: App<B>, action: Option<DaemonCommand>, mut ui_recv: UnboundedReceiver<DaemonCommand>) {
    glib::MainContext::default().spawn_local(async move {
        if let Some(action) = action {
            app.handle_command(action);
        }
        while let Some(command) = ui_recv.recv().await {
            app.handle_command(command);
        }
    });
}

/// Run the IPC server and the config file watcher on their own tokio runtime.
fn spawn_background_tasks(paths: DawatiPaths, ui_send: UnboundedSender<DaemonCommand>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().thread_name("dawati-async").build() {
            Ok(rt) => rt,
            Err(err) => {
                log::error!("Failed to initialize tokio runtime: {}", err);
                return;
            }
        };
        rt.block_on(async move {
            let socket_file = paths.get_ipc_socket_file().to_path_buf();
            let ipc = tokio::spawn(ipc_server::run_server(ui_send.clone(), socket_file));
            let filewatch = tokio::spawn(watch_config_dir(paths.config_dir.clone(), ui_send.clone()));

            if crate::application_lifecycle::shutdown_requested().await.is_ok() {
                log::debug!("Shutdown requested, stopping the toolbar");
                let _ = ui_send.send(DaemonCommand::KillServer);
            }

            match tokio::try_join!(ipc, filewatch) {
                Ok((ipc_result, filewatch_result)) => {
                    crate::log_err!("in the IPC server", ipc_result);
                    crate::log_err!("in the config file watcher", filewatch_result);
                }
                Err(err) => log::error!("Background task panicked: {:?}", err),
            }
        })
    });
}

/// Whether a changed file should trigger a reload.
fn is_config_file(path: &Path) -> bool {
    matches!(path.file_name().and_then(|name| name.to_str()), Some("toolbar.json" | "dawati.css"))
}

/// Collapses a burst of file changes into a single reload, [`RELOAD_DEBOUNCE`] after the last change.
#[derive(Debug, Default)]
struct ReloadDebounce {
    deadline: Option<Instant>,
}

impl ReloadDebounce {
    fn changed(&mut self, now: Instant) {
        self.deadline = Some(now + RELOAD_DEBOUNCE);
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the reload is due at `now`. A due reload is only reported once.
    fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Reload the configuration and stylesheet whenever one of them changes on disk.
async fn watch_config_dir(config_dir: PathBuf, evt_send: UnboundedSender<DaemonCommand>) -> Result<()> {
    use notify::{RecursiveMode, Watcher};

    let (change_send, mut change_recv) = tokio::sync::mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| match event {
        Ok(event) if matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) => {
            if event.paths.iter().any(|path| is_config_file(path)) {
                let _ = change_send.send(());
            }
        }
        Ok(_) => {}
        Err(err) => log::error!("Error while watching the config directory: {}", err),
    })?;
    watcher.watch(&config_dir, RecursiveMode::NonRecursive).with_context(|| format!("Failed to watch {}", config_dir.display()))?;

    let mut debounce = ReloadDebounce::default();
    crate::select_until_shutdown! {
        Some(()) = change_recv.recv() => debounce.changed(Instant::now()),
        _ = tokio::time::sleep_until(debounce.deadline().unwrap_or_else(Instant::now).into()), if debounce.deadline().is_some() => {
            if !debounce.take_due(Instant::now()) {
                continue;
            }
            let (sender, mut response) = daemon_response::create_pair();
            evt_send.send(DaemonCommand::ReloadConfigAndCss(sender))?;
            tokio::spawn(async move {
                match response.recv().await {
                    Some(DaemonResponse::Success(_)) => log::info!("Reloaded configuration"),
                    Some(DaemonResponse::Failure(err)) => log::error!("{}", err),
                    None => log::error!("Toolbar did not answer the reload request"),
                }
            });
        },
        else => break,
    }
    Ok(())
}

/// Fork into the background, redirecting stdout and stderr to `log_file_path`.
fn detach_from_terminal(log_file_path: &Path) -> Result<ForkResult> {
    use nix::unistd;

    if let unistd::ForkResult::Parent { .. } = unsafe { unistd::fork() }.context("Failed to fork")? {
        return Ok(ForkResult::Parent);
    }
    unistd::setsid().context("Failed to start a new session")?;
    // fork again, so the daemon can never reacquire a controlling terminal
    if let unistd::ForkResult::Parent { .. } = unsafe { unistd::fork() }.context("Failed to fork")? {
        std::process::exit(0);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("Error opening log file ({}), for writing", log_file_path.display()))?;
    for stream in [std::io::stdout().as_raw_fd(), std::io::stderr().as_raw_fd()] {
        if unistd::isatty(stream)? {
            unistd::dup2(log_file.as_raw_fd(), stream)?;
        }
    }
    Ok(ForkResult::Child)
}
