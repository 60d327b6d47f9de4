//! Exclusive input grabs for transient shell surfaces.
//!
//! Every [`ModalStack::acquire`] must be balanced by a [`ModalStack::release`] of the same surface.
//! Grabs nest: the exclusive input grab is only taken for the first acquire and only given up
//! once the last surface is released. Releasing in a different order than acquiring is allowed;
//! keyboard focus then still ends up where it was before the outermost acquire.

use crate::{
    error::ModalError,
    surface::{DestroyNotifier, ObserverToken, SurfaceId},
};

/// Flags passed on to the windowing system when beginning a modal grab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalOptions {
    /// The pointer is already grabbed by the caller, so it must not be grabbed again.
    pub pointer_already_grabbed: bool,
    /// The keyboard is already grabbed by the caller, so it must not be grabbed again.
    pub keyboard_already_grabbed: bool,
}

/// The windowing-system primitives a [`ModalStack`] needs.
pub trait InputGrab {
    /// Timestamp used when the caller does not provide one.
    fn current_time(&self) -> u32;
    /// Route all keyboard and pointer input to the shell. Returns false if the grab could not be taken.
    fn begin_exclusive_input(&mut self, timestamp: u32, options: ModalOptions) -> bool;
    /// Give up the exclusive grab and go back to normal input routing.
    fn end_exclusive_input(&mut self, timestamp: u32);
    fn focus(&self) -> Option<SurfaceId>;
    fn set_focus(&mut self, surface: Option<SurfaceId>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalWatch {
    Surface,
    PreviousFocus,
}

#[derive(Debug)]
struct ModalGrabRecord {
    surface: SurfaceId,
    previous_focus: Option<SurfaceId>,
    surface_token: Option<ObserverToken>,
    focus_token: Option<ObserverToken>,
}

#[derive(Debug, Default)]
pub struct ModalStack {
    modal_count: usize,
    records: Vec<ModalGrabRecord>,
    observers: DestroyNotifier<ModalWatch>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently active (nested) modal grabs.
    pub fn depth(&self) -> usize {
        self.modal_count
    }

    pub fn is_modal(&self) -> bool {
        self.modal_count > 0
    }

    /// Surfaces currently holding a modal grab, outermost first.
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.records.iter().map(|record| record.surface)
    }

    /// Grab all input and give keyboard focus to `surface`.
    ///
    /// Returns true if the exclusive grab was acquired, or if one was already held.
    /// On false nothing changed and the caller must not call [`ModalStack::release`].
    pub fn acquire<G: InputGrab + ?Sized>(
        &mut self,
        grab: &mut G,
        surface: SurfaceId,
        timestamp: Option<u32>,
        options: ModalOptions,
    ) -> bool {
        let timestamp = timestamp.unwrap_or_else(|| grab.current_time());

        if self.modal_count == 0 && !grab.begin_exclusive_input(timestamp, options) {
            log::warn!("acquire: beginning the exclusive input grab failed for {:?}", surface);
            return false;
        }

        self.modal_count += 1;
        let surface_token = self.observers.connect(surface, ModalWatch::Surface);
        let previous_focus = grab.focus();
        let focus_token = previous_focus.map(|focus| self.observers.connect(focus, ModalWatch::PreviousFocus));
        self.records.push(ModalGrabRecord {
            surface,
            previous_focus,
            surface_token: Some(surface_token),
            focus_token,
        });

        grab.set_focus(Some(surface));
        log::debug!("Modal grab acquired by {:?}, depth is now {}", surface, self.modal_count);
        true
    }

    /// Undo the [`ModalStack::acquire`] of `surface`.
    ///
    /// If `surface` holds the innermost grab, focus goes back to what was focused when it was acquired.
    /// Releasing an outer grab hands its saved focus on to the grab directly above it.
    pub fn release<G: InputGrab + ?Sized>(
        &mut self,
        grab: &mut G,
        surface: SurfaceId,
        timestamp: Option<u32>,
    ) -> Result<(), ModalError> {
        let timestamp = timestamp.unwrap_or_else(|| grab.current_time());

        let Some(index) = self.find(surface) else {
            grab.set_focus(None);
            grab.end_exclusive_input(timestamp);
            return Err(ModalError::UnbalancedRelease(surface));
        };

        self.modal_count -= 1;

        if let Some(token) = self.records[index].surface_token.take() {
            self.observers.disconnect(token);
        }

        let top = self.records.len() - 1;
        if index == top {
            if let Some(token) = self.records[top].focus_token.take() {
                self.observers.disconnect(token);
            }
            grab.set_focus(self.records[top].previous_focus);
        } else {
            // the focus saved by the innermost grab is overwritten by the shift below.
            if let Some(token) = self.records[top].focus_token.take() {
                self.observers.disconnect(token);
            }
            for i in (index + 1..=top).rev() {
                self.records[i].previous_focus = self.records[i - 1].previous_focus;
                self.records[i].focus_token = self.records[i - 1].focus_token.take();
            }
        }
        self.records.remove(index);
        log::debug!("Modal grab released by {:?}, depth is now {}", surface, self.modal_count);

        if self.modal_count > 0 {
            return Ok(());
        }

        if !self.observers.is_empty() {
            log::warn!("Destroy observers are left over after the last modal grab was released");
        }
        grab.end_exclusive_input(timestamp);
        Ok(())
    }

    /// Handle the destruction of a surface.
    ///
    /// A destroyed surface that was saved as the focus to restore is forgotten, so focus is cleared instead.
    /// A destroyed surface that still holds a modal grab is released.
    /// Surfaces the stack does not reference are ignored.
    pub fn surface_destroyed<G: InputGrab + ?Sized>(&mut self, grab: &mut G, surface: SurfaceId) {
        if !self.observers.is_observed(surface) {
            return;
        }
        let watches = self.observers.notify_destroyed(surface);

        if watches.contains(&ModalWatch::PreviousFocus) {
            for record in self.records.iter_mut().filter(|record| record.previous_focus == Some(surface)) {
                record.previous_focus = None;
                record.focus_token = None;
            }
        }

        let held_grabs = watches.iter().filter(|watch| **watch == ModalWatch::Surface).count();
        if held_grabs == 0 {
            return;
        }
        for record in self.records.iter_mut().filter(|record| record.surface == surface) {
            record.surface_token = None;
        }
        log::debug!("{:?} was destroyed while holding {} modal grab(s), releasing", surface, held_grabs);
        for _ in 0..held_grabs {
            if let Err(err) = self.release(grab, surface, None) {
                log::error!("Failed to release modal grab of destroyed surface: {}", err);
            }
        }
    }

    fn find(&self, surface: SurfaceId) -> Option<usize> {
        self.records.iter().position(|record| record.surface == surface)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::FakeGrab;
    use pretty_assertions::assert_eq;

    const A: SurfaceId = SurfaceId(1);
    const B: SurfaceId = SurfaceId(2);
    const C: SurfaceId = SurfaceId(3);
    const ORIGINAL: SurfaceId = SurfaceId(100);

    #[test]
    fn test_lifo_release_restores_focus() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();

        assert!(stack.acquire(&mut grab, A, None, ModalOptions::default()));
        assert!(stack.acquire(&mut grab, B, None, ModalOptions::default()));
        assert_eq!(grab.focus, Some(B));
        assert_eq!(stack.depth(), 2);
        assert_eq!(grab.begin_calls.len(), 1, "nested acquire must not grab again");

        stack.release(&mut grab, B, None).unwrap();
        assert_eq!(grab.focus, Some(A));
        assert!(grab.grabbed);

        stack.release(&mut grab, A, None).unwrap();
        assert_eq!(grab.focus, Some(ORIGINAL));
        assert!(!grab.grabbed);
        assert_eq!(stack.depth(), 0);
        assert!(stack.observers.is_empty());
    }

    #[test]
    fn test_out_of_order_release() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();

        stack.acquire(&mut grab, A, None, ModalOptions::default());
        stack.acquire(&mut grab, B, None, ModalOptions::default());

        stack.release(&mut grab, A, None).unwrap();
        assert_eq!(grab.focus, Some(B), "releasing an outer grab must not steal focus from the inner one");
        assert!(grab.grabbed);
        assert_eq!(stack.surfaces().collect::<Vec<_>>(), vec![B]);

        stack.release(&mut grab, B, None).unwrap();
        assert_eq!(grab.focus, Some(ORIGINAL));
        assert!(!grab.grabbed);
        assert!(stack.observers.is_empty());
    }

    #[test]
    fn test_release_from_the_middle_of_three() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();

        stack.acquire(&mut grab, A, None, ModalOptions::default());
        stack.acquire(&mut grab, B, None, ModalOptions::default());
        stack.acquire(&mut grab, C, None, ModalOptions::default());

        stack.release(&mut grab, B, None).unwrap();
        assert_eq!(grab.focus, Some(C));

        stack.release(&mut grab, C, None).unwrap();
        assert_eq!(grab.focus, Some(A));

        stack.release(&mut grab, A, None).unwrap();
        assert_eq!(grab.focus, Some(ORIGINAL));
        assert!(!grab.grabbed);
    }

    #[test]
    fn test_unbalanced_release() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();
        stack.acquire(&mut grab, A, Some(5), ModalOptions::default());

        let result = stack.release(&mut grab, B, Some(9));
        assert_eq!(result, Err(ModalError::UnbalancedRelease(B)));
        assert_eq!(stack.depth(), 1);
        assert_eq!(grab.focus, None);
        assert_eq!(grab.end_calls, vec![9]);
    }

    #[test]
    fn test_failed_grab_pushes_nothing() {
        let mut grab = FakeGrab { refuse_grab: true, ..FakeGrab::focused_on(ORIGINAL) };
        let mut stack = ModalStack::new();

        assert!(!stack.acquire(&mut grab, A, None, ModalOptions::default()));
        assert_eq!(stack.depth(), 0);
        assert_eq!(grab.focus, Some(ORIGINAL));
        assert_eq!(grab.begin_calls, vec![42], "missing timestamp should default to the current time");
        assert!(stack.release(&mut grab, A, None).is_err());
    }

    #[test]
    fn test_destroyed_previous_focus_is_forgotten() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();
        stack.acquire(&mut grab, A, None, ModalOptions::default());

        stack.surface_destroyed(&mut grab, ORIGINAL);
        assert_eq!(stack.depth(), 1);

        stack.release(&mut grab, A, None).unwrap();
        assert_eq!(grab.focus, None);
        assert!(!grab.grabbed);
    }

    #[test]
    fn test_destroyed_modal_surface_is_released() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();
        stack.acquire(&mut grab, A, None, ModalOptions::default());
        stack.acquire(&mut grab, B, None, ModalOptions::default());

        // A is both an outer grab and the focus B will restore to.
        stack.surface_destroyed(&mut grab, A);
        assert_eq!(stack.depth(), 1);
        assert_eq!(grab.focus, Some(B));
        assert!(grab.grabbed);

        stack.release(&mut grab, B, None).unwrap();
        assert_eq!(grab.focus, Some(ORIGINAL));
        assert!(!grab.grabbed);
        assert_eq!(stack.release(&mut grab, A, None), Err(ModalError::UnbalancedRelease(A)));
    }

    #[test]
    fn test_destroying_unrelated_surface_is_ignored() {
        let mut grab = FakeGrab::focused_on(ORIGINAL);
        let mut stack = ModalStack::new();
        stack.acquire(&mut grab, A, None, ModalOptions::default());
        stack.release(&mut grab, A, None).unwrap();

        stack.surface_destroyed(&mut grab, A);
        stack.surface_destroyed(&mut grab, C);
        assert_eq!(stack.depth(), 0);
        assert_eq!(grab.end_calls.len(), 1);
    }
}
