use crate::domain::config::SessionGuardConfig;
use crate::domain::error::{SessionGuardError, SessionGuardResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager
///
/// Merges the global configuration under the user's config directory with a
/// project-local `.sessionguard/config.toml` found by walking up from the
/// current directory. Project session settings win over global ones.
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> SessionGuardResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Load configuration from files
    pub fn load_config(&self) -> SessionGuardResult<SessionGuardConfig> {
        // Start with default configuration
        let mut config = SessionGuardConfig::default();

        // Load global configuration if exists
        if self.global_config_path.exists() {
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        // Project configuration overrides session settings
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                config.session = project_config.session;
            }
        }

        config.session.validate()?;
        Ok(config)
    }

    /// Save configuration to the global file
    pub fn save_config(&self, config: &SessionGuardConfig) -> SessionGuardResult<()> {
        if let Some(parent) = self.global_config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionGuardError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        self.save_config_to_path(&self.global_config_path, config)
    }

    /// Get global configuration path
    fn get_global_config_path() -> SessionGuardResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| SessionGuardError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home
            .join(".config")
            .join("sessionguard")
            .join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(".sessionguard").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> SessionGuardResult<SessionGuardConfig> {
        let content = fs::read_to_string(path).map_err(|e| SessionGuardError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| SessionGuardError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(
        &self,
        path: &Path,
        config: &SessionGuardConfig,
    ) -> SessionGuardResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| SessionGuardError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| SessionGuardError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration
    pub fn init_project_config(&self, path: &Path) -> SessionGuardResult<()> {
        let config_dir = path.join(".sessionguard");
        let config_file = config_dir.join("config.toml");

        if config_file.exists() {
            return Err(SessionGuardError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| SessionGuardError::Config {
            message: format!("Failed to create .sessionguard directory: {}", e),
        })?;

        self.save_config_to_path(&config_file, &SessionGuardConfig::default())?;

        Ok(())
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}
