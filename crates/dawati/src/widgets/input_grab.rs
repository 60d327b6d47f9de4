use gtk::prelude::*;
use shell_core::{
    modal::{InputGrab, ModalOptions},
    SurfaceId,
};

use super::surfaces::SurfaceRegistry;

/// Exclusive input for the toolbar window through a gdk seat grab.
#[derive(Debug)]
pub struct GtkInputGrab {
    window: gtk::Window,
    surfaces: SurfaceRegistry,
    grabbed_seat: Option<gdk::Seat>,
}

impl GtkInputGrab {
    pub fn new(window: gtk::Window, surfaces: SurfaceRegistry) -> Self {
        GtkInputGrab { window, surfaces, grabbed_seat: None }
    }
}

fn capabilities_for(options: ModalOptions) -> gdk::SeatCapabilities {
    let mut capabilities = gdk::SeatCapabilities::ALL;
    if options.pointer_already_grabbed {
        capabilities.remove(gdk::SeatCapabilities::ALL_POINTING);
    }
    if options.keyboard_already_grabbed {
        capabilities.remove(gdk::SeatCapabilities::KEYBOARD);
    }
    capabilities
}

impl InputGrab for GtkInputGrab {
    fn current_time(&self) -> u32 {
        gtk::current_event_time()
    }

    fn begin_exclusive_input(&mut self, timestamp: u32, options: ModalOptions) -> bool {
        let capabilities = capabilities_for(options);
        if capabilities.is_empty() {
            log::debug!("Pointer and keyboard are already grabbed, nothing to do");
            return true;
        }
        let Some(gdk_window) = self.window.window() else {
            log::warn!("Cannot grab input: the toolbar window is not realized");
            return false;
        };
        let Some(seat) = self.window.display().default_seat() else {
            log::warn!("Cannot grab input: no default seat");
            return false;
        };

        match seat.grab(&gdk_window, capabilities, true, None, None, None) {
            gdk::GrabStatus::Success => {
                log::debug!("Grabbed {:?} at {}", capabilities, timestamp);
                self.grabbed_seat = Some(seat);
                true
            }
            status => {
                log::warn!("Failed to grab input: {:?}", status);
                false
            }
        }
    }

    fn end_exclusive_input(&mut self, timestamp: u32) {
        if let Some(seat) = self.grabbed_seat.take() {
            log::debug!("Releasing input grab at {}", timestamp);
            seat.ungrab();
        }
    }

    fn focus(&self) -> Option<SurfaceId> {
        self.window.focused_widget().and_then(|widget| self.surfaces.surface_of(&widget))
    }

    fn set_focus(&mut self, surface: Option<SurfaceId>) {
        let widget = surface.and_then(|surface| self.surfaces.widget(surface));
        if surface.is_some() && widget.is_none() {
            log::warn!("Cannot focus {:?}, it is no longer on screen", surface);
        }
        self.window.set_focus(widget.as_ref());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_capabilities_skip_already_grabbed_devices() {
        assert_eq!(capabilities_for(ModalOptions::default()), gdk::SeatCapabilities::ALL);
        let keyboard_only = capabilities_for(ModalOptions { pointer_already_grabbed: true, keyboard_already_grabbed: false });
        assert_eq!(keyboard_only, gdk::SeatCapabilities::KEYBOARD);
        let nothing = capabilities_for(ModalOptions { pointer_already_grabbed: true, keyboard_already_grabbed: true });
        assert!(nothing.is_empty());
    }
}
