use std::{marker::PhantomData, time::Duration};

use anyhow::{anyhow, Context, Result};
use dawati_shared_util::PanelName;
use gtk::prelude::*;
use itertools::Itertools;
use panel_host::{PanelEvent, PanelGeometry};
use shell_core::{
    modal::ModalStack,
    panels::{apply_panel_change, PanelChange},
    toolbar::{ButtonState, ReconcileReport, Toolbar},
    SurfaceId,
};

use crate::{
    config::{self, ToolbarConfig},
    daemon_response::DaemonResponseSender,
    display_backend::{self, DisplayBackend},
    error_handling_ctx,
    panel_handler::PanelHandlerHandle,
    paths::DawatiPaths,
    widgets::{input_grab::GtkInputGrab, toolbar::GtkToolbar, trigger::TriggerStrip, window::ToolbarWindow},
};

#[derive(Debug)]
pub enum DaemonCommand {
    NoOp,
    ReloadConfigAndCss(DaemonResponseSender),
    SetOrder {
        names: Vec<PanelName>,
        sender: DaemonResponseSender,
    },
    ShowPanel {
        name: PanelName,
        sender: DaemonResponseSender,
    },
    HidePanel {
        name: PanelName,
        sender: DaemonResponseSender,
    },
    ToggleToolbar,
    /// The pointer rested on the trigger strip at the top screen edge.
    ShowToolbar,
    /// The user clicked a toolbar button. `active` is the new state of the button.
    ButtonToggled {
        name: PanelName,
        active: bool,
    },
    ToolbarPointer {
        inside: bool,
    },
    SurfaceDestroyed(SurfaceId),
    PanelEvent(PanelEvent),
    KillServer,
    PrintState(DaemonResponseSender),
    PrintDebug(DaemonResponseSender),
}

pub struct App<B> {
    pub config: ToolbarConfig,
    pub toolbar: Toolbar<GtkToolbar>,
    pub modal: ModalStack,
    pub input_grab: GtkInputGrab,
    pub window: ToolbarWindow,
    pub trigger: TriggerStrip,
    pub css_provider: gtk::CssProvider,
    pub panel_handler: PanelHandlerHandle,

    pub paths: DawatiPaths,
    pub display_backend: PhantomData<B>,
}

impl<B> std::fmt::Debug for App<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("toolbar", &self.toolbar)
            .field("modal_surfaces", &self.modal.surfaces().collect::<Vec<_>>())
            .field("toolbar_visible", &self.window.is_visible())
            .field("hide_pending", &self.window.hide_pending())
            .field("paths", &self.paths)
            .finish()
    }
}

impl<B: DisplayBackend> App<B> {
    /// Handle a DaemonCommand event.
    pub fn handle_command(&mut self, event: DaemonCommand) {
        log::debug!("Handling event: {:?}", &event);
        let result = (|| -> Result<()> {
            match event {
                DaemonCommand::NoOp => {}
                DaemonCommand::ReloadConfigAndCss(sender) => {
                    let mut errors = Vec::new();

                    let config_result = config::read_from_file(&self.paths.get_toolbar_config_path());
                    if let Err(e) = config_result.and_then(|new_config| self.load_config(new_config)) {
                        errors.push(e)
                    }
                    let css_result = config::read_css_from_file(&self.paths.get_css_path());
                    if let Err(e) = css_result.and_then(|css| self.load_css(css.as_deref().unwrap_or_default())) {
                        errors.push(e)
                    }

                    sender.respond_with_error_list(errors)?;
                }
                DaemonCommand::SetOrder { names, sender } => {
                    let report = self.reconcile(&names);
                    sender.respond_with_error_list(report.failed.into_iter().map(anyhow::Error::from))?;
                }
                DaemonCommand::ShowPanel { name, sender } => {
                    if self.toolbar.contains(name.as_str()) {
                        self.window.show();
                        self.toolbar.activate(name.as_str(), true);
                        sender.send_success(String::new())?;
                    } else {
                        sender.send_failure(format!("There is no panel named {} on the toolbar", name))?;
                    }
                }
                DaemonCommand::HidePanel { name, sender } => {
                    if self.toolbar.activate(name.as_str(), false) {
                        self.schedule_hide_if_idle();
                        sender.send_success(String::new())?;
                    } else {
                        sender.send_failure(format!("There is no panel named {} on the toolbar", name))?;
                    }
                }
                DaemonCommand::ToggleToolbar => {
                    self.trigger.cancel();
                    if self.window.is_visible() {
                        self.hide_toolbar();
                    } else {
                        self.window.show();
                    }
                }
                DaemonCommand::ShowToolbar => {
                    if !self.window.is_visible() {
                        log::debug!("Revealing toolbar");
                        self.window.show();
                        self.schedule_hide_if_idle();
                    }
                }
                DaemonCommand::ButtonToggled { name, active } => {
                    self.toolbar.button_toggled(name.as_str(), active);
                    if active {
                        self.window.cancel_hide();
                    }
                }
                DaemonCommand::ToolbarPointer { inside: true } => self.window.cancel_hide(),
                DaemonCommand::ToolbarPointer { inside: false } => self.schedule_hide_if_idle(),
                DaemonCommand::SurfaceDestroyed(surface) => {
                    self.modal.surface_destroyed(&mut self.input_grab, surface);
                }
                DaemonCommand::PanelEvent(event) => self.handle_panel_event(event),
                DaemonCommand::KillServer => {
                    log::info!("Received kill command, stopping server!");
                    self.stop_application();
                    crate::log_err!("while requesting shutdown", crate::application_lifecycle::request_shutdown());
                }
                DaemonCommand::PrintState(sender) => {
                    let output = format_state(&self.toolbar.names(), self.toolbar.checked(), self.window.is_visible(), self.modal.depth());
                    sender.send_success(output)?
                }
                DaemonCommand::PrintDebug(sender) => {
                    let output = format!("{:#?}", &self);
                    sender.send_success(output)?
                }
            }
            Ok(())
        })();

        if let Err(err) = result {
            error_handling_ctx::print_error(err);
        }
    }

    fn handle_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Initialized { name, tooltip, button_style } => {
                if let Some(item) = self.toolbar.get(name.as_str()) {
                    item.button.set_tooltip(&tooltip);
                }
                if !button_style.is_empty() {
                    self.toolbar.apply_button_style(name.as_str(), &button_style);
                }
            }
            PanelEvent::ButtonStyle { name, style } => self.toolbar.apply_button_style(name.as_str(), &style),
            PanelEvent::ButtonState { name, state } => self.toolbar.apply_button_state(name.as_str(), ButtonState::from_bits(state)),
            PanelEvent::Tooltip { name, tooltip } => {
                if let Some(item) = self.toolbar.get(name.as_str()) {
                    item.button.set_tooltip(&tooltip);
                }
            }
            PanelEvent::Modality { name, modal } => {
                if modal && self.toolbar.contains(name.as_str()) {
                    // the grab is taken on the toolbar window, it has to be mapped
                    self.window.show();
                }
                self.update_panel(&name, PanelChange::Modality(modal));
            }
            PanelEvent::FocusRequested(name) => {
                self.window.show();
                if let Some(item) = self.toolbar.get(name.as_str()) {
                    item.button.widget.grab_focus();
                }
            }
            PanelEvent::Vanished(name) => {
                log::info!("Panel {} went away", name);
                self.update_panel(&name, PanelChange::Vanished);
            }
            PanelEvent::Failed { name, message } => {
                log::warn!("Panel {} failed: {}", name, message);
                self.update_panel(&name, PanelChange::Failed);
            }
        }
    }

    fn update_panel(&mut self, name: &PanelName, change: PanelChange) {
        apply_panel_change(&mut self.toolbar, &mut self.modal, &mut self.input_grab, name.as_str(), change);
    }

    fn hide_toolbar(&mut self) {
        if let Some(name) = self.toolbar.checked().cloned() {
            self.toolbar.activate(name.as_str(), false);
        }
        self.window.hide();
    }

    /// Start the auto-hide timer, unless a panel is shown or something holds a modal grab.
    fn schedule_hide_if_idle(&self) {
        if self.config.hide_timeout_ms > 0 && self.toolbar.checked().is_none() && !self.modal.is_modal() && self.window.is_visible() {
            self.window.schedule_hide(Duration::from_millis(self.config.hide_timeout_ms));
        }
    }

    fn reconcile(&mut self, names: &[PanelName]) -> ReconcileReport {
        let report = self.toolbar.reconcile(names);
        if !report.is_noop() {
            log::info!("Toolbar panels: {}", self.toolbar.names().iter().join(", "));
        }
        report
    }

    fn stop_application(&mut self) {
        self.window.cancel_hide();
        self.trigger.close();
        let surfaces: Vec<SurfaceId> = self.modal.surfaces().collect();
        for surface in surfaces.into_iter().rev() {
            if let Err(err) = self.modal.release(&mut self.input_grab, surface, None) {
                log::error!("{}", err);
            }
        }
        self.panel_handler.stop();
        self.toolbar.clear();
        self.window.window.close();
        gtk::main_quit();
    }

    /// Apply a new configuration: bring the buttons in line with the new order and move the toolbar if needed.
    /// Placement problems do not keep the buttons from being updated, all errors are reported together.
    pub fn load_config(&mut self, config: ToolbarConfig) -> Result<()> {
        log::info!("Reloading toolbar configuration");
        log::trace!("loading config: {:#?}", config);

        let placement_changed = config.monitor != self.config.monitor || config.height != self.config.height;
        if config.panels_dir != self.config.panels_dir {
            // buttons were built from the metadata in the old directory
            self.toolbar.clear();
            self.toolbar.backend_mut().panels_dir = config.panels_dir.clone();
        }
        self.trigger.set_delay(Duration::from_millis(config.trigger_delay_ms));
        self.config = config;

        let order = self.config.order.clone();
        let report = self.reconcile(&order);
        let mut errors: Vec<anyhow::Error> = report.failed.into_iter().map(anyhow::Error::from).collect();

        if placement_changed {
            match self.monitor() {
                Ok(monitor) => {
                    B::place_window(&self.window.window, &self.config, &monitor);
                    B::place_trigger_window(&self.trigger.window, &monitor);
                }
                Err(err) => errors.push(err),
            }
        }
        if let Err(err) = self.update_panel_geometry() {
            errors.push(err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{}", errors.iter().map(|err| format!("{:#}", err)).join("\n")))
        }
    }

    pub fn load_css(&mut self, css: &str) -> Result<()> {
        self.css_provider.load_from_data(css.as_bytes()).context("Failed to load stylesheet")?;
        Ok(())
    }

    pub fn monitor(&self) -> Result<gdk::Monitor> {
        let display = gdk::Display::default().context("Could not get default display")?;
        display_backend::get_monitor(&display, self.config.monitor.as_ref())
    }

    /// Tell the panels where they may place their windows: below the toolbar, on the toolbar's monitor.
    pub fn update_panel_geometry(&self) -> Result<()> {
        let geometry = self.monitor()?.geometry();
        self.panel_handler.set_geometry(panel_geometry_below(geometry.x(), geometry.y(), geometry.width(), geometry.height(), self.config.height));
        Ok(())
    }
}

fn panel_geometry_below(x: i32, y: i32, width: i32, height: i32, toolbar_height: i32) -> PanelGeometry {
    PanelGeometry { x, y: y + toolbar_height, max_width: width, max_height: (height - toolbar_height).max(0) }
}

/// One line per toolbar button, the shown panel marked with a `*`, followed by the toolbar and modal state.
fn format_state(names: &[&PanelName], checked: Option<&PanelName>, toolbar_visible: bool, modal_depth: usize) -> String {
    let buttons = names.iter().map(|name| format!("{}{}", if checked == Some(*name) { "*" } else { "" }, name));
    let summary = [format!("toolbar: {}", if toolbar_visible { "shown" } else { "hidden" }), format!("modal depth: {}", modal_depth)];
    buttons.chain(summary).join("\n")
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_state() {
        let (myzone, status) = (PanelName::from("myzone"), PanelName::from("status"));
        let state = format_state(&[&myzone, &status], Some(&status), true, 1);
        assert_eq!(state, "myzone\n*status\ntoolbar: shown\nmodal depth: 1");
        assert_eq!(format_state(&[], None, false, 0), "toolbar: hidden\nmodal depth: 0");
    }

    #[test]
    fn test_panels_open_below_the_toolbar() {
        let geometry = panel_geometry_below(1920, 0, 1280, 800, 50);
        assert_eq!(geometry, PanelGeometry { x: 1920, y: 50, max_width: 1280, max_height: 750 });
        assert_eq!(panel_geometry_below(0, 0, 100, 30, 50).max_height, 0);
    }
}
