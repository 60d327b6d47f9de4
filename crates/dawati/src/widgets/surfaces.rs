use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use gtk::prelude::*;
use shell_core::SurfaceId;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::DaemonCommand;

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    widgets: HashMap<SurfaceId, gtk::Widget>,
}

/// Hands out [`SurfaceId`]s for gtk widgets and reports their destruction to the app as
/// [`DaemonCommand::SurfaceDestroyed`]. Ids are never reused.
#[derive(Debug, Clone, Default)]
pub struct SurfaceRegistry(Rc<RefCell<Registry>>);

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, widget: &impl IsA<gtk::Widget>, app_evt_send: UnboundedSender<DaemonCommand>) -> SurfaceId {
        let id = {
            let mut registry = self.0.borrow_mut();
            registry.next_id += 1;
            let id = SurfaceId(registry.next_id);
            registry.widgets.insert(id, widget.clone().upcast());
            id
        };

        let registry: Weak<RefCell<Registry>> = Rc::downgrade(&self.0);
        widget.connect_destroy(move |_| {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().widgets.remove(&id);
            }
            if app_evt_send.send(DaemonCommand::SurfaceDestroyed(id)).is_err() {
                log::debug!("Surface {:?} destroyed after the app stopped", id);
            }
        });
        id
    }

    pub fn widget(&self, id: SurfaceId) -> Option<gtk::Widget> {
        self.0.borrow().widgets.get(&id).cloned()
    }

    pub fn surface_of(&self, widget: &gtk::Widget) -> Option<SurfaceId> {
        self.0.borrow().widgets.iter().find(|(_, registered)| registered == &widget).map(|(id, _)| *id)
    }
}
