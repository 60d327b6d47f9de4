use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dawati_shared_util::{MonitorIdentifier, PanelName};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PANELS_DIR: &str = "/usr/share/dawati-shell/panels";
pub const DEFAULT_HIDE_TIMEOUT_MS: u64 = 1500;
pub const DEFAULT_TOOLBAR_HEIGHT: i32 = 50;
pub const DEFAULT_TRIGGER_DELAY_MS: u64 = 500;

/// Contents of `toolbar.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolbarConfig {
    /// Panels to show buttons for, in order.
    pub order: Vec<PanelName>,
    /// How long the toolbar stays up after the pointer left it. 0 keeps it up.
    #[serde(default = "default_hide_timeout_ms")]
    pub hide_timeout_ms: u64,
    /// Directory with the `.desktop` files describing the panels.
    #[serde(default = "default_panels_dir")]
    pub panels_dir: PathBuf,
    #[serde(default)]
    pub monitor: Option<MonitorIdentifier>,
    #[serde(default = "default_toolbar_height")]
    pub height: i32,
    /// How long the pointer has to rest at the top screen edge before the hidden toolbar is revealed.
    #[serde(default = "default_trigger_delay_ms")]
    pub trigger_delay_ms: u64,
}

fn default_hide_timeout_ms() -> u64 {
    DEFAULT_HIDE_TIMEOUT_MS
}

fn default_panels_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PANELS_DIR)
}

fn default_toolbar_height() -> i32 {
    DEFAULT_TOOLBAR_HEIGHT
}

fn default_trigger_delay_ms() -> u64 {
    DEFAULT_TRIGGER_DELAY_MS
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        ToolbarConfig {
            order: Vec::new(),
            hide_timeout_ms: DEFAULT_HIDE_TIMEOUT_MS,
            panels_dir: default_panels_dir(),
            monitor: None,
            height: DEFAULT_TOOLBAR_HEIGHT,
            trigger_delay_ms: DEFAULT_TRIGGER_DELAY_MS,
        }
    }
}

impl ToolbarConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ToolbarConfig = serde_json::from_str(content)?;
        if config.height <= 0 {
            anyhow::bail!("Toolbar height must be positive, but is {}", config.height);
        }
        Ok(config)
    }
}

pub fn read_from_file(path: &Path) -> Result<ToolbarConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read toolbar configuration {}", path.display()))?;
    ToolbarConfig::from_json(&content).with_context(|| format!("Invalid toolbar configuration in {}", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ToolbarConfig::from_json(r#"{ "order": ["a11y", "volume", "battery"] }"#).unwrap();
        assert_eq!(
            config,
            ToolbarConfig { order: vec!["a11y".into(), "volume".into(), "battery".into()], ..ToolbarConfig::default() }
        );
        assert_eq!(config.panels_dir, PathBuf::from("/usr/share/dawati-shell/panels"));
        assert_eq!(config.hide_timeout_ms, 1500);
        assert_eq!(config.trigger_delay_ms, 500);
    }

    #[test]
    fn test_all_keys() {
        let config = ToolbarConfig::from_json(
            r#"{
                "order": ["myzone"],
                "hide_timeout_ms": 0,
                "panels_dir": "/opt/panels",
                "monitor": "HDMI-1",
                "height": 64,
                "trigger_delay_ms": 250
            }"#,
        )
        .unwrap();
        assert_eq!(config.hide_timeout_ms, 0);
        assert_eq!(config.panels_dir, PathBuf::from("/opt/panels"));
        assert_eq!(config.monitor, Some(MonitorIdentifier::Name("HDMI-1".to_string())));
        assert_eq!(config.height, 64);
        assert_eq!(config.trigger_delay_ms, 250);

        let config = ToolbarConfig::from_json(r#"{ "order": [], "monitor": 1 }"#).unwrap();
        assert_eq!(config.monitor, Some(MonitorIdentifier::Numeric(1)));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(ToolbarConfig::from_json(r#"{ "hide_timeout_ms": 10 }"#).is_err());
        assert!(ToolbarConfig::from_json(r#"{ "order": ["a"], "hieght": 10 }"#).is_err());
        assert!(ToolbarConfig::from_json(r#"{ "order": ["a"], "height": 0 }"#).is_err());
        assert!(ToolbarConfig::from_json("order = [a]").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(read_from_file(Path::new("/nonexistent/dawati/toolbar.json")).is_err());
    }
}
