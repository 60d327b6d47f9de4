use std::{cell::Cell, rc::Rc, time::Duration};

use gtk::prelude::*;
use tokio::sync::mpsc::UnboundedSender;

use super::timeout::PendingTimeout;
use crate::app::DaemonCommand;

/// Distance from the top screen edge, in pixels, the pointer has to come to start revealing the toolbar.
const TRIGGER_THRESHOLD: f64 = 1.0;
/// While the reveal is pending the zone grows to this, so a shaking hand does not cancel it.
const TRIGGER_ADJUSTMENT: f64 = 2.0;
/// Height of the trigger strip window.
pub const TRIGGER_STRIP_HEIGHT: i32 = 3;

/// Whether a pointer `y` pixels below the top screen edge is in the trigger zone.
fn in_trigger_zone(y: f64, reveal_pending: bool) -> bool {
    let threshold = if reveal_pending { TRIGGER_ADJUSTMENT } else { TRIGGER_THRESHOLD };
    (0.0..=threshold).contains(&y)
}

/// A window a few pixels high along the top screen edge. Resting the pointer on it sends
/// [`DaemonCommand::ShowToolbar`] once the reveal delay passed.
#[derive(Debug)]
pub struct TriggerStrip {
    pub window: gtk::Window,
    reveal: PendingTimeout,
    delay: Rc<Cell<Duration>>,
}

impl TriggerStrip {
    pub fn new(window: gtk::Window, delay: Duration, app_evt_send: UnboundedSender<DaemonCommand>) -> Self {
        window.set_title("dawati-toolbar-trigger");
        window.set_widget_name("dawati-toolbar-trigger");
        window.add_events(gdk::EventMask::ENTER_NOTIFY_MASK | gdk::EventMask::LEAVE_NOTIFY_MASK | gdk::EventMask::POINTER_MOTION_MASK);

        let strip = TriggerStrip { window, reveal: PendingTimeout::default(), delay: Rc::new(Cell::new(delay)) };

        let on_pointer = Rc::new({
            let reveal = strip.reveal.clone();
            let delay = strip.delay.clone();
            move |y: f64| {
                if !in_trigger_zone(y, reveal.is_pending()) {
                    reveal.cancel();
                } else if !reveal.is_pending() {
                    let app_evt_send = app_evt_send.clone();
                    reveal.schedule(delay.get(), move || {
                        if app_evt_send.send(DaemonCommand::ShowToolbar).is_err() {
                            log::debug!("Toolbar is gone, not revealing it");
                        }
                    });
                }
            }
        });
        strip.window.connect_enter_notify_event(glib::clone!(@strong on_pointer => move |_, evt| {
            on_pointer(evt.position().1);
            glib::Propagation::Proceed
        }));
        strip.window.connect_motion_notify_event(glib::clone!(@strong on_pointer => move |_, evt| {
            on_pointer(evt.position().1);
            glib::Propagation::Proceed
        }));
        strip.window.connect_leave_notify_event(move |_, evt| {
            on_pointer(evt.position().1);
            glib::Propagation::Proceed
        });

        strip
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay.set(delay);
    }

    /// Forget a reveal that is still waiting for its delay.
    pub fn cancel(&self) {
        self.reveal.cancel();
    }

    pub fn show(&self) {
        self.window.show();
    }

    pub fn close(&self) {
        self.cancel();
        self.window.close();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_trigger_zone_grows_while_pending() {
        assert!(in_trigger_zone(0.0, false));
        assert!(in_trigger_zone(1.0, false));
        assert!(!in_trigger_zone(2.0, false));
        assert!(in_trigger_zone(2.0, true));
        assert!(!in_trigger_zone(2.5, true));
        assert!(!in_trigger_zone(-1.0, true));
        assert!(f64::from(TRIGGER_STRIP_HEIGHT) > TRIGGER_ADJUSTMENT);
    }
}
