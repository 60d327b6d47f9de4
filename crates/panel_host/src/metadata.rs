use std::path::{Path, PathBuf};

use dawati_shared_util::{PanelName, ServiceName};
use freedesktop_entry_parser::Entry;

use crate::{Error, Result};

const DESKTOP_GROUP: &str = "Desktop Entry";

/// What the toolbar knows about a panel before talking to it, read from `<panels_dir>/<name>.desktop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelMetadata {
    pub name: PanelName,
    /// Label of the toolbar button.
    pub label: String,
    pub icon: Option<String>,
    /// Well-known bus name the panel process owns.
    pub service: ServiceName,
    /// Style class the button starts out with, until the panel requests another one.
    pub button_style: Option<String>,
}

impl PanelMetadata {
    pub fn path_for(panels_dir: &Path, name: &PanelName) -> PathBuf {
        panels_dir.join(format!("{}.desktop", name))
    }

    pub fn load(panels_dir: &Path, name: &PanelName) -> Result<Self> {
        let path = Self::path_for(panels_dir, name);
        let content = std::fs::read(&path).map_err(|source| Error::MetadataIo { path: path.clone(), source })?;
        Self::parse(name.clone(), &path, &content)
    }

    /// Parse the content of a panel's `.desktop` file. `path` is only used for error messages.
    pub fn parse(name: PanelName, path: &Path, content: &[u8]) -> Result<Self> {
        let invalid = |reason: String| Error::Metadata { path: path.to_path_buf(), reason };

        let entry = Entry::parse(content).map_err(|err| invalid(err.to_string()))?;
        let section = entry.section(DESKTOP_GROUP);

        let label = section.attr("Name").ok_or_else(|| invalid(format!("missing key `Name` in [{}]", DESKTOP_GROUP)))?;
        let service =
            section.attr("X-Dawati-Service").ok_or_else(|| invalid(format!("missing key `X-Dawati-Service` in [{}]", DESKTOP_GROUP)))?;
        if service.is_empty() || service.starts_with('.') || service.ends_with('.') {
            return Err(invalid(format!("`{}` is not a valid service name", service)));
        }

        Ok(PanelMetadata {
            name,
            label: label.to_string(),
            icon: section.attr("Icon").map(str::to_string),
            service: service.into(),
            button_style: section.attr("X-Dawati-Panel-Button-Style").filter(|style| !style.is_empty()).map(str::to_string),
        })
    }
}
