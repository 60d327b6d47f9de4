use dawati_shared_util::PanelName;
use thiserror::Error;

use crate::surface::SurfaceId;

/// The toolbar backend could not build a button for a panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to create toolbar button for panel `{name}`: {reason}")]
pub struct ConstructionError {
    pub name: PanelName,
    pub reason: String,
}

impl ConstructionError {
    pub fn new(name: PanelName, reason: impl Into<String>) -> Self {
        Self { name, reason: reason.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModalError {
    /// `release` was called for a surface that holds no modal grab. This always indicates unbalanced
    /// acquire/release calls in the caller.
    #[error("Incorrect modal pop: {0:?} does not hold a modal grab")]
    UnbalancedRelease(SurfaceId),
}
