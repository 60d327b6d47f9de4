use glib::translate::ToGlibPtr;
use gtk::prelude::*;

use super::DisplayBackend;
use crate::{config::ToolbarConfig, widgets::trigger::TRIGGER_STRIP_HEIGHT};

pub struct X11Backend;

impl DisplayBackend for X11Backend {
    const IS_WAYLAND: bool = false;

    fn initialize_window(config: &ToolbarConfig, monitor: &gdk::Monitor) -> gtk::Window {
        let window = dock_window("dawati-toolbar");
        Self::place_window(&window, config, monitor);
        window
    }

    fn place_window(window: &gtk::Window, config: &ToolbarConfig, monitor: &gdk::Monitor) {
        move_to_top_edge(window, monitor, config.height);
    }

    fn initialize_trigger_window(monitor: &gdk::Monitor) -> gtk::Window {
        let window = dock_window("dawati-toolbar-trigger");
        window.set_accept_focus(false);
        Self::place_trigger_window(&window, monitor);
        window
    }

    fn place_trigger_window(window: &gtk::Window, monitor: &gdk::Monitor) {
        move_to_top_edge(window, monitor, TRIGGER_STRIP_HEIGHT);
    }
}

/// An undecorated dock window, kept above other windows on every workspace.
fn dock_window(class: &str) -> gtk::Window {
    let window = gtk::Window::new(gtk::WindowType::Toplevel);
    // gtk-rs 0.18 no longer binds gtk_window_set_wmclass
    unsafe {
        gtk::ffi::gtk_window_set_wmclass(
            window.to_glib_none().0,
            class.to_glib_none().0,
            class.to_glib_none().0,
        );
    }
    window.set_type_hint(gdk::WindowTypeHint::Dock);
    window.set_decorated(false);
    window.set_resizable(false);
    window.set_keep_above(true);
    window.set_skip_taskbar_hint(true);
    window.set_skip_pager_hint(true);
    window.stick();
    window
}

fn move_to_top_edge(window: &gtk::Window, monitor: &gdk::Monitor, height: i32) {
    let geometry = monitor.geometry();
    window.move_(geometry.x(), geometry.y());
    window.set_size_request(geometry.width(), height);
}
