use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "academicd.toml";
pub const WORKSPACE_ENV: &str = "ACADEMICD_WORKSPACE";
pub const LOG_ENV: &str = "ACADEMICD_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML from config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub seed_sample_students: bool,
    pub default_admin: DefaultAdmin,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultAdmin {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            seed_sample_students: true,
            default_admin: DefaultAdmin::default(),
        }
    }
}

impl Default for DefaultAdmin {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            name: "Default Admin".to_string(),
        }
    }
}

/// Reads `<workspace>/academicd.toml`. A missing file means defaults.
pub fn load_workspace_config(workspace: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let path = workspace.join(CONFIG_FILE);
    tracing::debug!("Attempting to load configuration from: {:?}", path);
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(WorkspaceConfig::default()),
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}
