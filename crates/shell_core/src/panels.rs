//! How the toolbar follows what happens to the panel processes behind its buttons.

use crate::{
    modal::{InputGrab, ModalOptions, ModalStack},
    surface::SurfaceId,
    toolbar::{Toolbar, ToolbarBackend},
};

/// A change reported for a panel that affects its toolbar button or the modal grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelChange {
    /// The panel asked for its button's surface to grab all input, or to give the grab up.
    Modality(bool),
    /// The panel process went away.
    Vanished,
    /// A call to the panel failed.
    Failed,
}

/// Apply `change` to the toolbar and the modal stack.
///
/// Returns false if `name` has no toolbar button. Such changes come from panels that were
/// removed from the toolbar while the change was on its way, and are dropped.
pub fn apply_panel_change<B, G>(toolbar: &mut Toolbar<B>, modal: &mut ModalStack, grab: &mut G, name: &str, change: PanelChange) -> bool
where
    B: ToolbarBackend,
    G: InputGrab + ?Sized,
{
    let Some(surface) = toolbar.get(name).map(|item| toolbar.backend().surface(&item.button)) else {
        log::debug!("Dropping {:?} of panel {}, it has no toolbar button", change, name);
        return false;
    };

    match change {
        PanelChange::Modality(true) if holds_grab(modal, surface) => log::debug!("Panel {} is already modal", name),
        PanelChange::Modality(true) => {
            if !modal.acquire(grab, surface, None, ModalOptions::default()) {
                log::warn!("Failed to grab input for modal panel {}", name);
            }
        }
        PanelChange::Modality(false) => release_grab(modal, grab, surface),
        PanelChange::Vanished => {
            release_grab(modal, grab, surface);
            toolbar.set_unchecked(name);
        }
        PanelChange::Failed => toolbar.set_unchecked(name),
    }
    true
}

fn holds_grab(modal: &ModalStack, surface: SurfaceId) -> bool {
    modal.surfaces().any(|modal_surface| modal_surface == surface)
}

/// Give up the grab of `surface`, if it holds one.
fn release_grab<G: InputGrab + ?Sized>(modal: &mut ModalStack, grab: &mut G, surface: SurfaceId) {
    if !holds_grab(modal, surface) {
        return;
    }
    if let Err(err) = modal.release(grab, surface, None) {
        log::error!("{}", err);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{names, Call, FakeBackend, FakeGrab};
    use pretty_assertions::assert_eq;

    const DESKTOP: SurfaceId = SurfaceId(100);

    fn toolbar_with(list: &[&str]) -> Toolbar<FakeBackend> {
        let mut toolbar = Toolbar::new(FakeBackend::default());
        toolbar.reconcile(&names(list));
        toolbar
    }

    fn surface_of(toolbar: &Toolbar<FakeBackend>, name: &str) -> SurfaceId {
        toolbar.get(name).map(|item| toolbar.backend().surface(&item.button)).unwrap()
    }

    #[test]
    fn test_modality_grabs_the_button_surface() {
        let mut toolbar = toolbar_with(&["myzone", "status"]);
        let (mut modal, mut grab) = (ModalStack::new(), FakeGrab::focused_on(DESKTOP));
        let status = surface_of(&toolbar, "status");

        assert!(apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Modality(true)));
        assert_eq!(modal.surfaces().collect::<Vec<_>>(), vec![status]);
        assert_eq!(grab.focus, Some(status));
        assert!(grab.grabbed);

        // asking twice does not nest the grab
        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Modality(true));
        assert_eq!(modal.depth(), 1);

        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Modality(false));
        assert_eq!(modal.depth(), 0);
        assert_eq!(grab.focus, Some(DESKTOP));
        assert!(!grab.grabbed);
    }

    #[test]
    fn test_releasing_without_a_grab_does_nothing() {
        let mut toolbar = toolbar_with(&["myzone"]);
        let (mut modal, mut grab) = (ModalStack::new(), FakeGrab::focused_on(DESKTOP));

        assert!(apply_panel_change(&mut toolbar, &mut modal, &mut grab, "myzone", PanelChange::Modality(false)));
        assert_eq!(grab.focus, Some(DESKTOP));
        assert!(grab.end_calls.is_empty());
    }

    #[test]
    fn test_vanished_panel_loses_grab_and_selection() {
        let mut toolbar = toolbar_with(&["myzone", "status"]);
        let (mut modal, mut grab) = (ModalStack::new(), FakeGrab::focused_on(DESKTOP));
        let myzone = surface_of(&toolbar, "myzone");
        toolbar.button_toggled("status", true);
        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "myzone", PanelChange::Modality(true));
        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Modality(true));
        toolbar.backend_mut().calls.clear();

        assert!(apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Vanished));
        assert_eq!(modal.surfaces().collect::<Vec<_>>(), vec![myzone]);
        assert_eq!(grab.focus, Some(myzone));
        assert_eq!(toolbar.checked(), None);
        // the panel is gone, so it is not asked to hide
        assert_eq!(toolbar.backend().calls, vec![Call::SetChecked(2, false)]);
    }

    #[test]
    fn test_failed_panel_is_unchecked() {
        let mut toolbar = toolbar_with(&["myzone", "status"]);
        let (mut modal, mut grab) = (ModalStack::new(), FakeGrab::focused_on(DESKTOP));
        toolbar.button_toggled("myzone", true);

        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", PanelChange::Failed);
        assert_eq!(toolbar.checked().map(|name| name.as_str()), Some("myzone"));

        apply_panel_change(&mut toolbar, &mut modal, &mut grab, "myzone", PanelChange::Failed);
        assert_eq!(toolbar.checked(), None);
    }

    #[test]
    fn test_changes_of_removed_panels_are_dropped() {
        let mut toolbar = toolbar_with(&["myzone", "status"]);
        let (mut modal, mut grab) = (ModalStack::new(), FakeGrab::focused_on(DESKTOP));
        toolbar.reconcile(&names(&["myzone"]));
        toolbar.backend_mut().calls.clear();

        for change in [PanelChange::Modality(true), PanelChange::Vanished, PanelChange::Failed] {
            assert!(!apply_panel_change(&mut toolbar, &mut modal, &mut grab, "status", change));
        }
        assert_eq!(modal.depth(), 0);
        assert!(grab.begin_calls.is_empty());
        assert!(toolbar.backend().calls.is_empty());
    }
}
