use std::collections::HashMap;

/// Identity of a focusable UI surface. Surfaces are compared by this handle only;
/// whoever hands out the ids must never reuse one for a different surface.
#[derive(Hash, Eq, PartialEq, Copy, Clone)]
pub struct SurfaceId(pub u64);

impl std::fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// Cancellation token for an observer registered in a [`DestroyNotifier`].
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct ObserverToken(u64);

/// Registry of observers interested in the destruction of surfaces.
///
/// The owner of a surface calls [`DestroyNotifier::notify_destroyed`] before the surface goes away;
/// this synchronously hands back every observer that was still connected for that surface,
/// so the observers can drop their references to it. Observers that were disconnected
/// beforehand are never returned.
#[derive(Debug)]
pub struct DestroyNotifier<T> {
    next_token: u64,
    observers: HashMap<SurfaceId, Vec<(ObserverToken, T)>>,
    token_targets: HashMap<ObserverToken, SurfaceId>,
}

impl<T> Default for DestroyNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DestroyNotifier<T> {
    pub fn new() -> Self {
        DestroyNotifier { next_token: 0, observers: HashMap::new(), token_targets: HashMap::new() }
    }

    pub fn connect(&mut self, surface: SurfaceId, observer: T) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.entry(surface).or_default().push((token, observer));
        self.token_targets.insert(token, surface);
        token
    }

    /// Cancel an observer. Returns the observer if it was still connected.
    pub fn disconnect(&mut self, token: ObserverToken) -> Option<T> {
        let surface = self.token_targets.remove(&token)?;
        let observers = self.observers.get_mut(&surface)?;
        let index = observers.iter().position(|(t, _)| *t == token)?;
        let (_, observer) = observers.remove(index);
        if observers.is_empty() {
            self.observers.remove(&surface);
        }
        Some(observer)
    }

    /// Drain all observers of the given surface, in the order they were connected.
    pub fn notify_destroyed(&mut self, surface: SurfaceId) -> Vec<T> {
        let observers = self.observers.remove(&surface).unwrap_or_default();
        observers
            .into_iter()
            .map(|(token, observer)| {
                self.token_targets.remove(&token);
                observer
            })
            .collect()
    }

    pub fn is_observed(&self, surface: SurfaceId) -> bool {
        self.observers.contains_key(&surface)
    }

    pub fn is_empty(&self) -> bool {
        self.token_targets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_disconnected_observers_are_not_notified() {
        let mut notifier = DestroyNotifier::new();
        let a = SurfaceId(1);
        let first = notifier.connect(a, "first");
        notifier.connect(a, "second");
        notifier.connect(SurfaceId(2), "other");

        assert_eq!(notifier.disconnect(first), Some("first"));
        assert_eq!(notifier.disconnect(first), None);
        assert_eq!(notifier.notify_destroyed(a), vec!["second"]);
        assert!(!notifier.is_observed(a));
        assert!(notifier.notify_destroyed(a).is_empty());
        assert!(notifier.is_observed(SurfaceId(2)));
    }

    #[test]
    fn test_notify_drains_tokens() {
        let mut notifier = DestroyNotifier::new();
        let token = notifier.connect(SurfaceId(7), ());
        notifier.notify_destroyed(SurfaceId(7));
        assert_eq!(notifier.disconnect(token), None);
        assert!(notifier.is_empty());
    }
}
