//! Talking to panels: the out-of-process mini applications behind the toolbar buttons.
//!
//! Each panel is described by a `.desktop` file ([`PanelMetadata`]) and exports the
//! `com.dawati.UX.Shell.Panel` interface on the session bus ([`dbus::PanelProxy`]).
//! [`run_host`] drives all panels of the toolbar from a single task.

pub mod dbus;

mod error;
pub use error::*;

mod host;
pub use host::*;

mod link;
pub use link::*;

mod metadata;
pub use metadata::*;
