/// A call the host should make on a panel's D-Bus interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Ping,
    InitPanel,
    Show,
    Hide,
    Unload,
}

/// Tracks whether a panel process is up and initialized, and decides which call to make for a request.
///
/// A panel that is not known to be running is never sent `Show` directly. Instead it is pinged,
/// which makes the bus activate it, then initialized, and only shown once `InitPanel` returned.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PanelLink {
    running: bool,
    need_show: bool,
}

impl PanelLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a show request is waiting for the panel to come up.
    pub fn show_pending(&self) -> bool {
        self.need_show
    }

    pub fn show(&mut self) -> Option<LinkAction> {
        if self.running {
            Some(LinkAction::Show)
        } else {
            self.need_show = true;
            Some(LinkAction::Ping)
        }
    }

    pub fn hide(&mut self) -> Option<LinkAction> {
        self.need_show = false;
        self.running.then_some(LinkAction::Hide)
    }

    pub fn unload(&mut self) -> Option<LinkAction> {
        self.need_show = false;
        self.running.then_some(LinkAction::Unload)
    }

    pub fn ping_replied(&mut self) -> Option<LinkAction> {
        Some(LinkAction::InitPanel)
    }

    pub fn initialized(&mut self) -> Option<LinkAction> {
        self.running = true;
        if std::mem::take(&mut self.need_show) {
            Some(LinkAction::Show)
        } else {
            None
        }
    }

    pub fn name_appeared(&mut self) -> Option<LinkAction> {
        Some(LinkAction::InitPanel)
    }

    pub fn name_vanished(&mut self) {
        self.running = false;
    }

    pub fn ready(&mut self) {
        self.running = true;
    }

    /// A call to the panel failed; a pending show will not happen.
    pub fn call_failed(&mut self, action: LinkAction) {
        if matches!(action, LinkAction::Ping | LinkAction::InitPanel) {
            self.need_show = false;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_show_waits_for_initialization() {
        let mut link = PanelLink::new();
        assert_eq!(link.show(), Some(LinkAction::Ping));
        assert!(link.show_pending());
        assert_eq!(link.ping_replied(), Some(LinkAction::InitPanel));
        assert_eq!(link.initialized(), Some(LinkAction::Show));
        assert!(!link.show_pending());

        // once running, showing goes straight through
        assert_eq!(link.show(), Some(LinkAction::Show));
        assert_eq!(link.hide(), Some(LinkAction::Hide));
    }

    #[test]
    fn test_hide_and_unload_need_a_running_panel() {
        let mut link = PanelLink::new();
        assert_eq!(link.hide(), None);
        assert_eq!(link.unload(), None);

        link.ready();
        assert_eq!(link.unload(), Some(LinkAction::Unload));
        link.name_vanished();
        assert_eq!(link.hide(), None);
    }

    #[test]
    fn test_hide_cancels_pending_show() {
        let mut link = PanelLink::new();
        link.show();
        link.hide();
        link.ping_replied();
        assert_eq!(link.initialized(), None);
    }

    #[test]
    fn test_restarted_panel_is_not_shown_again() {
        let mut link = PanelLink::new();
        link.show();
        link.initialized();
        link.name_vanished();
        assert_eq!(link.name_appeared(), Some(LinkAction::InitPanel));
        assert_eq!(link.initialized(), None);
        assert!(link.is_running());
    }

    #[test]
    fn test_failed_ping_drops_pending_show() {
        let mut link = PanelLink::new();
        link.show();
        link.call_failed(LinkAction::Ping);
        assert!(!link.show_pending());
        assert!(!link.is_running());
    }
}
