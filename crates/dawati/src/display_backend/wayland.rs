use gtk::prelude::*;
use gtk_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};

use super::DisplayBackend;
use crate::{config::ToolbarConfig, widgets::trigger::TRIGGER_STRIP_HEIGHT};

pub struct WaylandBackend;

impl DisplayBackend for WaylandBackend {
    const IS_WAYLAND: bool = true;

    fn initialize_window(config: &ToolbarConfig, monitor: &gdk::Monitor) -> gtk::Window {
        // panels hand the keyboard over to the toolbar while they are modal
        let window = top_edge_surface("dawati-toolbar", KeyboardMode::OnDemand);
        Self::place_window(&window, config, monitor);
        window
    }

    fn place_window(window: &gtk::Window, config: &ToolbarConfig, monitor: &gdk::Monitor) {
        window.set_monitor(monitor);
        window.set_size_request(-1, config.height);
    }

    fn initialize_trigger_window(monitor: &gdk::Monitor) -> gtk::Window {
        let window = top_edge_surface("dawati-toolbar-trigger", KeyboardMode::None);
        Self::place_trigger_window(&window, monitor);
        window
    }

    fn place_trigger_window(window: &gtk::Window, monitor: &gdk::Monitor) {
        window.set_monitor(monitor);
        window.set_size_request(-1, TRIGGER_STRIP_HEIGHT);
    }
}

/// A layer surface stretched along the top edge of its output.
fn top_edge_surface(namespace: &str, keyboard_mode: KeyboardMode) -> gtk::Window {
    let window = gtk::Window::new(gtk::WindowType::Toplevel);
    window.init_layer_shell();
    window.set_namespace(namespace);
    window.set_layer(Layer::Top);
    window.set_keyboard_mode(keyboard_mode);

    window.set_anchor(Edge::Top, true);
    window.set_anchor(Edge::Left, true);
    window.set_anchor(Edge::Right, true);
    window.set_anchor(Edge::Bottom, false);
    window.set_resizable(false);
    window
}
