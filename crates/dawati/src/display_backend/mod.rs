use anyhow::{Context, Result};
use dawati_shared_util::MonitorIdentifier;
use gtk::prelude::*;

use crate::{config::ToolbarConfig, widgets::trigger::TRIGGER_STRIP_HEIGHT};

#[cfg(feature = "wayland")]
mod wayland;
#[cfg(feature = "wayland")]
pub use wayland::WaylandBackend;

#[cfg(feature = "x11")]
mod x11;
#[cfg(feature = "x11")]
pub use x11::X11Backend;

/// Platform specific setup of the toolbar window.
pub trait DisplayBackend: Send + Sync + 'static {
    const IS_WAYLAND: bool;

    /// Create the toolbar window, spanning the top edge of `monitor`.
    fn initialize_window(config: &ToolbarConfig, monitor: &gdk::Monitor) -> gtk::Window;

    /// Move an existing toolbar window to `monitor` and apply the configured height.
    fn place_window(window: &gtk::Window, config: &ToolbarConfig, monitor: &gdk::Monitor);

    /// Create the strip along the top edge of `monitor` that reveals the hidden toolbar on hover.
    fn initialize_trigger_window(monitor: &gdk::Monitor) -> gtk::Window;

    fn place_trigger_window(window: &gtk::Window, monitor: &gdk::Monitor);
}

#[allow(unused)]
pub struct NoBackend;

impl DisplayBackend for NoBackend {
    const IS_WAYLAND: bool = false;

    fn initialize_window(config: &ToolbarConfig, monitor: &gdk::Monitor) -> gtk::Window {
        let window = gtk::Window::new(gtk::WindowType::Toplevel);
        Self::place_window(&window, config, monitor);
        window
    }

    fn place_window(window: &gtk::Window, config: &ToolbarConfig, monitor: &gdk::Monitor) {
        window.set_default_size(monitor.geometry().width(), config.height);
    }

    fn initialize_trigger_window(monitor: &gdk::Monitor) -> gtk::Window {
        let window = gtk::Window::new(gtk::WindowType::Popup);
        Self::place_trigger_window(&window, monitor);
        window
    }

    fn place_trigger_window(window: &gtk::Window, monitor: &gdk::Monitor) {
        window.set_default_size(monitor.geometry().width(), TRIGGER_STRIP_HEIGHT);
    }
}

/// Find the monitor the toolbar should be shown on. A monitor that is not connected is reported
/// and replaced by the primary one, so the toolbar always has a place.
pub fn get_monitor(display: &gdk::Display, identifier: Option<&MonitorIdentifier>) -> Result<gdk::Monitor> {
    if let Some(identifier) = identifier {
        let models: Vec<Option<String>> = (0..display.n_monitors())
            .map(|index| display.monitor(index).and_then(|monitor| monitor.model()).map(|model| model.to_string()))
            .collect();
        match monitor_index(identifier, &models).and_then(|index| display.monitor(index)) {
            Some(monitor) => return Ok(monitor),
            None => log::warn!("Could not find {}, using the primary monitor instead", identifier),
        }
    }
    display.primary_monitor().or_else(|| display.monitor(0)).context("Display has no monitors")
}

/// Index of the monitor `identifier` refers to, given the model names of the connected monitors.
fn monitor_index(identifier: &MonitorIdentifier, models: &[Option<String>]) -> Option<i32> {
    let index = match identifier {
        MonitorIdentifier::Numeric(index) => usize::try_from(*index).ok().filter(|index| *index < models.len())?,
        MonitorIdentifier::Name(name) => models.iter().position(|model| model.as_deref() == Some(name.as_str()))?,
    };
    i32::try_from(index).ok()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_monitor_index() {
        let models = vec![Some("eDP-1".to_string()), None, Some("HDMI-1".to_string())];
        assert_eq!(monitor_index(&MonitorIdentifier::Numeric(1), &models), Some(1));
        assert_eq!(monitor_index(&MonitorIdentifier::Name("HDMI-1".to_string()), &models), Some(2));
    }

    #[test]
    fn test_unplugged_monitor_is_not_found() {
        let models = vec![Some("eDP-1".to_string())];
        assert_eq!(monitor_index(&MonitorIdentifier::Name("HDMI-1".to_string()), &models), None);
        assert_eq!(monitor_index(&MonitorIdentifier::Numeric(1), &models), None);
        assert_eq!(monitor_index(&MonitorIdentifier::Numeric(-1), &models), None);
        assert_eq!(monitor_index(&MonitorIdentifier::Numeric(0), &[]), None);
    }
}
