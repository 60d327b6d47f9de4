use std::path::PathBuf;

use dawati_shared_util::PanelName;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dbus connection error")]
    DbusError(#[from] zbus::Error),
    #[error("Failed to read panel description {}", .path.display())]
    MetadataIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Panel description {} is invalid: {reason}", .path.display())]
    Metadata { path: PathBuf, reason: String },
    #[error("Panel {0} is not loaded")]
    UnknownPanel(PanelName),
}

pub type Result<T> = std::result::Result<T, Error>;
