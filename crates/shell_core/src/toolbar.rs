//! The toolbar: one toggle button per configured panel.
//!
//! [`Toolbar::reconcile`] brings the set of buttons in line with a configured panel order,
//! creating buttons only for new panels and destroying only the buttons of panels that went away.
//! Buttons of panels that stay keep their identity. At most one button is checked at any time;
//! a checked button means that the panel it belongs to is currently shown.

use std::collections::HashMap;

use dawati_shared_util::PanelName;
use itertools::Itertools;

use crate::{error::ConstructionError, surface::SurfaceId};

/// Visibility flags a panel may request for its toolbar button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(u32);

impl ButtonState {
    pub const NORMAL: ButtonState = ButtonState(0);
    pub const HIDDEN: ButtonState = ButtonState(1 << 0);
    pub const INSENSITIVE: ButtonState = ButtonState(1 << 1);

    pub fn from_bits(bits: u32) -> Self {
        ButtonState(bits)
    }

    pub fn is_hidden(self) -> bool {
        self.0 & Self::HIDDEN.0 != 0
    }

    pub fn is_insensitive(self) -> bool {
        self.0 & Self::INSENSITIVE.0 != 0
    }
}

/// Everything the toolbar needs from the UI and from the panel processes.
pub trait ToolbarBackend {
    /// Handle to an on-screen button.
    type Button;

    /// Build and show the button for a panel. Nothing must be left on screen if this fails.
    fn create_button(&mut self, name: &PanelName) -> Result<Self::Button, ConstructionError>;
    /// Remove a button from the screen and stop delivering its click events.
    fn destroy_button(&mut self, name: &PanelName, button: Self::Button);
    /// Move a button to the end of the on-screen sequence.
    fn move_to_end(&mut self, button: &Self::Button);
    /// Change the checked state of a button without it being reported as a user toggle.
    fn set_checked(&mut self, button: &Self::Button, checked: bool);
    fn request_show(&mut self, name: &PanelName);
    fn request_hide(&mut self, name: &PanelName);
    fn set_button_state(&mut self, button: &Self::Button, state: ButtonState);
    fn set_button_style(&mut self, button: &Self::Button, style: &str);
    /// The surface a button is shown on, used for the modal grabs of its panel.
    fn surface(&self, button: &Self::Button) -> SurfaceId;
}

#[derive(Debug)]
pub struct ToolbarItem<W> {
    pub name: PanelName,
    pub button: W,
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fixup {
    Add,
    Remove,
    Keep,
}

/// What a single [`Toolbar::reconcile`] pass changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<PanelName>,
    pub removed: Vec<PanelName>,
    pub failed: Vec<ConstructionError>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }
}

pub struct Toolbar<B: ToolbarBackend> {
    backend: B,
    items: HashMap<PanelName, ToolbarItem<B::Button>>,
    /// The order given to the last reconcile pass.
    order: Vec<PanelName>,
}

impl<B: ToolbarBackend> std::fmt::Debug for Toolbar<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbar").field("order", &self.order).field("checked", &self.checked()).finish()
    }
}

impl<B: ToolbarBackend> Toolbar<B> {
    pub fn new(backend: B) -> Self {
        Toolbar { backend, items: HashMap::new(), order: Vec::new() }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Synchronize the buttons with the desired panel order.
    ///
    /// Failing to create a button for one panel does not stop the others from being processed;
    /// the failures are returned in the report.
    pub fn reconcile(&mut self, desired: &[PanelName]) -> ReconcileReport {
        let mut fixups: HashMap<&PanelName, Fixup> = HashMap::new();
        for name in desired {
            let fixup = if self.items.contains_key(name) { Fixup::Keep } else { Fixup::Add };
            fixups.insert(name, fixup);
        }
        for name in self.items.keys() {
            fixups.entry(name).or_insert(Fixup::Remove);
        }

        let (to_add, to_remove): (Vec<PanelName>, Vec<PanelName>) = {
            let to_add = desired.iter().filter(|name| fixups.get(name) == Some(&Fixup::Add)).unique().cloned().collect();
            let to_remove =
                fixups.iter().filter(|(_, fixup)| **fixup == Fixup::Remove).map(|(name, _)| (*name).clone()).sorted().collect();
            (to_add, to_remove)
        };

        let mut report = ReconcileReport::default();
        for name in to_add {
            log::info!("Adding toolbar button {}", name);
            match self.backend.create_button(&name) {
                Ok(button) => {
                    self.items.insert(name.clone(), ToolbarItem { name: name.clone(), button, checked: false });
                    report.added.push(name);
                }
                Err(err) => {
                    log::error!("{}", err);
                    report.failed.push(err);
                }
            }
        }

        for name in to_remove {
            log::info!("Removing toolbar button {}", name);
            if let Some(item) = self.items.remove(&name) {
                self.backend.destroy_button(&item.name, item.button);
                report.removed.push(name);
            }
        }

        self.order = desired.to_vec();

        for name in self.order.iter().unique() {
            if let Some(item) = self.items.get(name) {
                self.backend.move_to_end(&item.button);
            }
        }

        report
    }

    /// Handle the user toggling the button of a panel. `active` is the button's new toggle state.
    pub fn button_toggled(&mut self, name: &str, active: bool) {
        let Some(item) = self.items.get(name) else {
            log::warn!("Got toggle event for unknown toolbar button {}", name);
            return;
        };
        if item.checked == active {
            return;
        }

        if active {
            if let Some(previous) = self.items.values_mut().find(|item| item.checked) {
                previous.checked = false;
                self.backend.set_checked(&previous.button, false);
            }
            if let Some(item) = self.items.get_mut(name) {
                item.checked = true;
                self.backend.request_show(&item.name);
            }
        } else if let Some(item) = self.items.get_mut(name) {
            item.checked = false;
            self.backend.request_hide(&item.name);
        }
    }

    /// Like [`Toolbar::button_toggled`], for requests that did not come from the button itself,
    /// so the button's own state is updated as well. Returns false if the panel has no button.
    pub fn activate(&mut self, name: &str, active: bool) -> bool {
        if !self.items.contains_key(name) {
            return false;
        }
        self.button_toggled(name, active);
        if let Some(item) = self.items.get(name) {
            self.backend.set_checked(&item.button, item.checked);
        }
        true
    }

    /// Uncheck the button of a panel that went away on its own, without asking the panel to hide.
    pub fn set_unchecked(&mut self, name: &str) {
        if let Some(item) = self.items.get_mut(name) {
            if item.checked {
                item.checked = false;
                self.backend.set_checked(&item.button, false);
            }
        }
    }

    pub fn apply_button_state(&mut self, name: &str, state: ButtonState) {
        match self.items.get(name) {
            Some(item) => self.backend.set_button_state(&item.button, state),
            None => log::warn!("Panel {} requested a button state, but has no toolbar button", name),
        }
    }

    pub fn apply_button_style(&mut self, name: &str, style: &str) {
        match self.items.get(name) {
            Some(item) => self.backend.set_button_style(&item.button, style),
            None => log::warn!("Panel {} requested a button style, but has no toolbar button", name),
        }
    }

    /// Remove every button, e.g. on shutdown.
    pub fn clear(&mut self) -> ReconcileReport {
        self.reconcile(&[])
    }

    /// The panel whose button is currently checked, if any.
    pub fn checked(&self) -> Option<&PanelName> {
        self.items.values().find(|item| item.checked).map(|item| &item.name)
    }

    /// Names of all panels that currently have a button, in display order.
    pub fn names(&self) -> Vec<&PanelName> {
        self.order.iter().unique().filter(|name| self.items.contains_key(*name)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolbarItem<B::Button>> {
        self.items.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod test;
