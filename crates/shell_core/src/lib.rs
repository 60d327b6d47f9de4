//! Toolkit independent core of the dawati toolbar.
//!
//! [`modal::ModalStack`] serializes exclusive input grabs of transient shell surfaces,
//! [`toolbar::Toolbar`] keeps the toolbar buttons in sync with the configured panel order,
//! and [`panels::apply_panel_change`] ties the two together when a panel changes state.
//! Both talk to the outside world exclusively through the collaborator traits
//! [`modal::InputGrab`] and [`toolbar::ToolbarBackend`].

pub mod error;
pub mod modal;
pub mod panels;
pub mod surface;
pub mod toolbar;

#[cfg(test)]
mod test_util;

pub use error::*;
pub use surface::*;
