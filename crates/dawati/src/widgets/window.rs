use std::time::Duration;

use gtk::prelude::*;
use tokio::sync::mpsc::UnboundedSender;

use super::timeout::PendingTimeout;
use crate::app::DaemonCommand;

/// The toolbar window and the box holding the panel buttons.
#[derive(Debug)]
pub struct ToolbarWindow {
    pub window: gtk::Window,
    pub container: gtk::Box,
    pending_hide: PendingTimeout,
}

impl ToolbarWindow {
    /// Wrap a window created by the display backend.
    pub fn new(window: gtk::Window, app_evt_send: UnboundedSender<DaemonCommand>) -> Self {
        window.set_title("dawati-toolbar");
        window.set_widget_name("dawati-toolbar");

        let container = gtk::Box::new(gtk::Orientation::Horizontal, 0);
        container.style_context().add_class("dawati-toolbar-buttons");
        window.add(&container);
        container.show();

        window.add_events(gdk::EventMask::ENTER_NOTIFY_MASK | gdk::EventMask::LEAVE_NOTIFY_MASK);
        window.connect_enter_notify_event(glib::clone!(@strong app_evt_send => move |_, _| {
            let _ = app_evt_send.send(DaemonCommand::ToolbarPointer { inside: true });
            glib::Propagation::Proceed
        }));
        window.connect_leave_notify_event(move |_, evt| {
            // leaving into one of our own buttons is not leaving the toolbar
            if evt.detail() != gdk::NotifyType::Inferior {
                let _ = app_evt_send.send(DaemonCommand::ToolbarPointer { inside: false });
            }
            glib::Propagation::Proceed
        });

        ToolbarWindow { window, container, pending_hide: PendingTimeout::default() }
    }

    pub fn is_visible(&self) -> bool {
        self.window.is_visible()
    }

    pub fn show(&self) {
        self.cancel_hide();
        // not show_all, buttons hidden by their panel must stay hidden
        self.window.show();
    }

    pub fn hide(&self) {
        self.cancel_hide();
        self.window.hide();
    }

    /// Hide the window after `timeout`, unless [`ToolbarWindow::cancel_hide`] is called before.
    pub fn schedule_hide(&self, timeout: Duration) {
        let window = self.window.clone();
        self.pending_hide.schedule(timeout, move || {
            log::debug!("Auto-hiding toolbar");
            window.hide();
        });
    }

    pub fn cancel_hide(&self) {
        self.pending_hide.cancel();
    }

    pub fn hide_pending(&self) -> bool {
        self.pending_hide.is_pending()
    }
}
