pub mod toolbar_config;
pub use toolbar_config::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Read the user stylesheet. A missing file is not an error, the toolbar then uses the theme's styling.
pub fn read_css_from_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let css = std::fs::read_to_string(path).with_context(|| format!("Failed to read stylesheet {}", path.display()))?;
    Ok(Some(css))
}
