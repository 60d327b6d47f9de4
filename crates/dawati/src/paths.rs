use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};

/// Stores references to all the paths relevant to dawati, and abstracts access to these files and directories
#[derive(Debug, Clone)]
pub struct DawatiPaths {
    pub log_file: PathBuf,
    pub ipc_socket_file: PathBuf,
    pub config_dir: PathBuf,
}

impl DawatiPaths {
    pub fn from_config_dir<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        if config_dir.is_file() {
            bail!("Please provide the path to the config directory, not a file within it")
        }

        if !config_dir.exists() {
            log::info!("Creating config dir {}", config_dir.display());
            std::fs::create_dir_all(config_dir)
                .with_context(|| format!("Failed to create configuration directory {}", config_dir.display()))?;
        }

        let config_dir = config_dir.canonicalize()?;

        // the socket path must stay below the 108 bytes limit of unix sockets, so hash the config dir instead of using it directly
        let daemon_id = daemon_id_for(&config_dir);

        let ipc_socket_file = std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join(format!("dawati-server_{}", daemon_id));

        if format!("{}", ipc_socket_file.display()).len() > 100 {
            log::warn!("The IPC socket file's absolute path exceeds 100 bytes, the socket may fail to create.");
        }

        let log_dir = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".cache")))
            .context("Neither XDG_CACHE_HOME nor HOME is set")?
            .join("dawati");

        if !log_dir.exists() {
            log::info!("Creating log dir");
            std::fs::create_dir_all(&log_dir)?;
        }

        Ok(DawatiPaths { config_dir, log_file: log_dir.join(format!("dawati_{}.log", daemon_id)), ipc_socket_file })
    }

    pub fn default() -> Result<Self> {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
            .context("Neither XDG_CONFIG_HOME nor HOME is set")?
            .join("dawati");

        Self::from_config_dir(config_dir)
    }

    pub fn get_log_file(&self) -> &Path {
        self.log_file.as_path()
    }

    pub fn get_ipc_socket_file(&self) -> &Path {
        self.ipc_socket_file.as_path()
    }

    pub fn get_config_dir(&self) -> &Path {
        self.config_dir.as_path()
    }

    pub fn get_toolbar_config_path(&self) -> PathBuf {
        self.config_dir.join("toolbar.json")
    }

    pub fn get_css_path(&self) -> PathBuf {
        self.config_dir.join("dawati.css")
    }
}

fn daemon_id_for(config_dir: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    format!("{}", config_dir.display()).hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

impl std::fmt::Display for DawatiPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "config-dir: {}, ipc-socket: {}, log-file: {}",
            self.config_dir.display(),
            self.ipc_socket_file.display(),
            self.log_file.display()
        )
    }
}
