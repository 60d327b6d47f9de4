use std::{cell::RefCell, rc::Rc, time::Duration};

/// A one-shot glib timeout on the main context that can be cancelled until it fired.
/// Scheduling again replaces the pending timeout.
#[derive(Debug, Clone, Default)]
pub struct PendingTimeout(Rc<RefCell<Option<glib::SourceId>>>);

impl PendingTimeout {
    pub fn schedule(&self, timeout: Duration, on_timeout: impl FnOnce() + 'static) {
        self.cancel();
        let pending = self.clone();
        let source = glib::timeout_add_local_once(timeout, move || {
            // the source is done once it fired, it must not be removed again
            pending.0.borrow_mut().take();
            on_timeout();
        });
        *self.0.borrow_mut() = Some(source);
    }

    pub fn cancel(&self) {
        if let Some(source) = self.0.borrow_mut().take() {
            source.remove();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_cancelled_timeout_never_fires() {
        let context = glib::MainContext::default();
        let _guard = context.acquire().unwrap();
        let fired = Rc::new(Cell::new(0));

        let cancelled = PendingTimeout::default();
        cancelled.schedule(Duration::from_millis(5), glib::clone!(@strong fired => move || fired.set(fired.get() + 100)));
        cancelled.cancel();
        assert!(!cancelled.is_pending());

        let timeout = PendingTimeout::default();
        timeout.schedule(Duration::from_millis(20), glib::clone!(@strong fired => move || fired.set(fired.get() + 100)));
        // rescheduling replaces the first callback
        timeout.schedule(Duration::from_millis(10), glib::clone!(@strong fired => move || fired.set(fired.get() + 1)));
        while timeout.is_pending() {
            context.iteration(true);
        }
        assert_eq!(fired.get(), 1);
    }
}
