use std::{cell::RefCell, path::PathBuf};

use dawati_shared_util::PanelName;
use gtk::prelude::*;
use panel_host::{PanelMetadata, PanelRequest};
use shell_core::{
    toolbar::{ButtonState, ToolbarBackend},
    ConstructionError, SurfaceId,
};
use tokio::sync::mpsc::UnboundedSender;

use super::surfaces::SurfaceRegistry;
use crate::app::DaemonCommand;

/// Style class every panel button carries, in addition to the one requested by its panel.
pub const PANEL_BUTTON_CLASS: &str = "dawati-panel-button";

/// A toolbar button, as handed out to [`shell_core::toolbar::Toolbar`].
#[derive(Debug)]
pub struct PanelButton {
    pub widget: gtk::ToggleButton,
    pub surface: SurfaceId,
    toggled_handler: glib::SignalHandlerId,
    style_class: RefCell<Option<String>>,
}

impl PanelButton {
    pub fn set_tooltip(&self, tooltip: &str) {
        self.widget.set_tooltip_text(Some(tooltip).filter(|tooltip| !tooltip.is_empty()));
    }
}

/// Builds the toolbar buttons inside the toolbar window and forwards show/hide requests to the panel host.
#[derive(Debug)]
pub struct GtkToolbar {
    pub container: gtk::Box,
    pub panels_dir: PathBuf,
    pub surfaces: SurfaceRegistry,
    pub app_evt_send: UnboundedSender<DaemonCommand>,
    pub panel_send: UnboundedSender<PanelRequest>,
}

impl GtkToolbar {
    fn send_panel_request(&self, request: PanelRequest) {
        if let Err(err) = self.panel_send.send(request) {
            log::debug!("Panel host is gone, dropping {:?}", err.0);
        }
    }
}

impl ToolbarBackend for GtkToolbar {
    type Button = PanelButton;

    fn create_button(&mut self, name: &PanelName) -> Result<PanelButton, ConstructionError> {
        let metadata = PanelMetadata::load(&self.panels_dir, name).map_err(|err| ConstructionError::new(name.clone(), err.to_string()))?;

        let widget = gtk::ToggleButton::with_label(&metadata.label);
        widget.set_widget_name(name.as_str());
        widget.set_focus_on_click(false);
        if let Some(icon) = &metadata.icon {
            widget.set_image(Some(&gtk::Image::from_icon_name(Some(icon.as_str()), gtk::IconSize::LargeToolbar)));
            widget.set_always_show_image(true);
        }
        widget.style_context().add_class(PANEL_BUTTON_CLASS);
        if let Some(style) = &metadata.button_style {
            widget.style_context().add_class(style);
        }

        let toggled_handler = widget.connect_toggled({
            let name = name.clone();
            let app_evt_send = self.app_evt_send.clone();
            move |widget| {
                let command = DaemonCommand::ButtonToggled { name: name.clone(), active: widget.is_active() };
                if let Err(err) = app_evt_send.send(command) {
                    log::error!("Failed to forward toggle of {}: {}", name, err);
                }
            }
        });

        let surface = self.surfaces.register(&widget, self.app_evt_send.clone());
        self.container.pack_start(&widget, false, false, 0);
        widget.show_all();

        let style_class = RefCell::new(metadata.button_style.clone());
        self.send_panel_request(PanelRequest::Load(metadata));
        Ok(PanelButton { widget, surface, toggled_handler, style_class })
    }

    fn destroy_button(&mut self, name: &PanelName, button: PanelButton) {
        let PanelButton { widget, toggled_handler, .. } = button;
        widget.disconnect(toggled_handler);
        self.container.remove(&widget);
        // SAFETY: the button is no longer in the container and nothing else holds on to it
        unsafe { widget.destroy() };
        self.send_panel_request(PanelRequest::Unload(name.clone()));
    }

    fn move_to_end(&mut self, button: &PanelButton) {
        self.container.reorder_child(&button.widget, -1);
    }

    fn set_checked(&mut self, button: &PanelButton, checked: bool) {
        button.widget.block_signal(&button.toggled_handler);
        button.widget.set_active(checked);
        button.widget.unblock_signal(&button.toggled_handler);
    }

    fn request_show(&mut self, name: &PanelName) {
        self.send_panel_request(PanelRequest::Show(name.clone()));
    }

    fn request_hide(&mut self, name: &PanelName) {
        self.send_panel_request(PanelRequest::Hide(name.clone()));
    }

    fn set_button_state(&mut self, button: &PanelButton, state: ButtonState) {
        button.widget.set_visible(!state.is_hidden());
        button.widget.set_sensitive(!state.is_insensitive());
    }

    fn set_button_style(&mut self, button: &PanelButton, style: &str) {
        let style_context = button.widget.style_context();
        let mut current = button.style_class.borrow_mut();
        if let Some(old) = current.take() {
            style_context.remove_class(&old);
        }
        if !style.is_empty() {
            style_context.add_class(style);
            *current = Some(style.to_string());
        }
    }

    fn surface(&self, button: &PanelButton) -> SurfaceId {
        button.surface
    }
}
