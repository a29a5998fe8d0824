use crate::InstallError;
use std::path::PathBuf;
use tracing::info;

pub struct NodeUiDirs {
    pub state: PathBuf,
    pub config: PathBuf,
}

impl NodeUiDirs {
    /// Locate platform-specific state/config directories for nodeui.
    ///
    /// # Errors
    /// Returns `InstallError` if standard OS directories cannot be determined.
    pub fn new() -> Result<Self, InstallError> {
        let state = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| InstallError::Directory("state directory not found".into()))?
            .join("nodeui");

        let config = dirs::config_dir()
            .ok_or_else(|| InstallError::Directory("config directory not found".into()))?
            .join("nodeui");

        Ok(Self { state, config })
    }

    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.state.join("logs")
    }

    /// Create the config directory if needed and return it. Installations
    /// are rooted here.
    ///
    /// # Errors
    /// Returns `InstallError::CreateDir` if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> Result<PathBuf, InstallError> {
        std::fs::create_dir_all(&self.config).map_err(|source| InstallError::CreateDir {
            what: "config",
            path: self.config.clone(),
            source,
        })?;
        info!("Using config directory {}", self.config.display());
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodeui_dirs() {
        let dirs = NodeUiDirs::new().unwrap();
        assert!(dirs.config.ends_with("nodeui"));
        assert!(dirs.log_dir().to_string_lossy().contains("nodeui"));
    }

    #[test]
    fn test_ensure_config_dir_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = NodeUiDirs {
            state: tmp.path().join("state"),
            config: tmp.path().join("config").join("nodeui"),
        };

        let first = dirs.ensure_config_dir().unwrap();
        let second = dirs.ensure_config_dir().unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }
}
