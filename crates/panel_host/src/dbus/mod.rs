//! # DBus interface proxies
//!
//! The panel interface is implemented by every panel process; the shell only ever acts as a client.

mod dbus_dawati_panel;
pub use dbus_dawati_panel::*;
