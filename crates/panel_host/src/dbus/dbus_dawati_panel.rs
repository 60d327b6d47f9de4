//! Proxy for `com.dawati.UX.Shell.Panel`.
//!
//! Panels are addressed by their service name (`X-Dawati-Service` in the panel's `.desktop` file) and
//! export the interface on the object path derived from it, so the proxy has no default destination
//! and must be built with [`PanelProxy::builder`].

use zbus::dbus_proxy;

/// Reply of `InitPanel`: `(panel_name, xid, tooltip, stylesheet, button_style, window_width, window_height)`.
pub type InitPanelReply = (String, u32, String, String, String, i32, i32);

#[dbus_proxy(interface = "com.dawati.UX.Shell.Panel")]
trait Panel {
    /// InitPanel method
    fn init_panel(&self, x: i32, y: i32, max_window_width: i32, max_window_height: i32) -> zbus::Result<InitPanelReply>;

    /// Unload method
    fn unload(&self) -> zbus::Result<()>;

    /// SetMaximumSize method
    fn set_maximum_size(&self, max_window_width: i32, max_window_height: i32) -> zbus::Result<()>;

    /// Show method
    fn show(&self) -> zbus::Result<()>;

    /// ShowBegin method
    fn show_begin(&self) -> zbus::Result<()>;

    /// ShowEnd method
    fn show_end(&self) -> zbus::Result<()>;

    /// Hide method
    fn hide(&self) -> zbus::Result<()>;

    /// HideBegin method
    fn hide_begin(&self) -> zbus::Result<()>;

    /// HideEnd method
    fn hide_end(&self) -> zbus::Result<()>;

    /// Ping method
    fn ping(&self) -> zbus::Result<()>;

    /// RequestButtonStyle signal
    #[dbus_proxy(signal)]
    fn request_button_style(&self, style_id: &str) -> zbus::Result<()>;

    /// RequestTooltip signal
    #[dbus_proxy(signal)]
    fn request_tooltip(&self, tooltip: &str) -> zbus::Result<()>;

    /// RequestButtonState signal
    #[dbus_proxy(signal)]
    fn request_button_state(&self, state: i32) -> zbus::Result<()>;

    /// SizeChanged signal
    #[dbus_proxy(signal)]
    fn size_changed(&self, requested_window_width: i32, requested_window_height: i32) -> zbus::Result<()>;

    /// RequestFocus signal
    #[dbus_proxy(signal)]
    fn request_focus(&self) -> zbus::Result<()>;

    /// RequestModality signal
    #[dbus_proxy(signal)]
    fn request_modality(&self, state: bool) -> zbus::Result<()>;

    /// Ready signal
    #[dbus_proxy(signal)]
    fn ready(&self) -> zbus::Result<()>;
}
