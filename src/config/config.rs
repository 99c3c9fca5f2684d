//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// Name and version reported in logs
    pub agent: AgentConfig,
    /// Session behaviour
    #[serde(default)]
    pub session: SessionConfig,
    /// Log level and session log directory
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Experience saving
    #[serde(default)]
    pub experience: ExperienceConfig,
}

/// Agent identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name
    pub name: String,
    /// Agent version
    pub version: String,
}

/// Session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Mode used when the caller does not pick one ("normal" or "follower")
    #[serde(default = "default_mode")]
    pub default_mode: String,
    /// Evaluate the whole session after its last round
    #[serde(default)]
    pub eva_session: bool,
    /// Evaluate every round after it runs
    #[serde(default)]
    pub eva_round: bool,
    /// Round cap per session, 0 for unlimited
    #[serde(default)]
    pub max_rounds: u32,
    /// Suffix a file must carry to be picked up as a plan in batch mode
    #[serde(default = "default_plan_suffix")]
    pub plan_suffix: String,
}

fn default_mode() -> String {
    "normal".to_string()
}

fn default_plan_suffix() -> String {
    ".json".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            eva_session: false,
            eva_round: false,
            max_rounds: 0,
            plan_suffix: default_plan_suffix(),
        }
    }
}

impl SessionConfig {
    /// Round cap, `None` when unlimited
    pub fn round_limit(&self) -> Option<usize> {
        match self.max_rounds {
            0 => None,
            n => Some(n as usize),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Root for per-session markdown logs. No session logs are written when unset.
    pub log_dir: Option<String>,
    /// Minimum level for console and session logs
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            log_level: default_log_level(),
        }
    }
}

/// Experience persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceConfig {
    /// Ask the user whether to keep the run as experience
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory experience records are written to
    #[serde(default = "default_experience_dir")]
    pub experience_dir: String,
}

fn default_true() -> bool {
    true
}

fn default_experience_dir() -> String {
    "experience".to_string()
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            experience_dir: default_experience_dir(),
        }
    }
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    /// File the configuration was read from, or would be
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None or missing, uses default config.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/sessionkit.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Self::get_default_config()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        let config_path = PathBuf::from("config").join(format!("{}.toml", config.agent.name));
        Self {
            config_path,
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get default configuration.
    pub fn get_default_config() -> Configuration {
        Configuration {
            agent: AgentConfig {
                name: "sessionkit".to_string(),
                version: "0.1.0".to_string(),
            },
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            experience: ExperienceConfig::default(),
        }
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "agent.name" => Some(self.config.agent.name.clone()),
            "agent.version" => Some(self.config.agent.version.clone()),
            "session.default_mode" => Some(self.config.session.default_mode.clone()),
            "session.plan_suffix" => Some(self.config.session.plan_suffix.clone()),
            "logging.log_dir" => self.config.logging.log_dir.clone(),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            "experience.experience_dir" => Some(self.config.experience.experience_dir.clone()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "session.max_rounds" => Some(self.config.session.max_rounds as u64),
            _ => None,
        }
    }

    /// Get boolean configuration value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "session.eva_session" => Some(self.config.session.eva_session),
            "session.eva_round" => Some(self.config.session.eva_round),
            "experience.enabled" => Some(self.config.experience.enabled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigurationLoader::get_default_config();
        assert_eq!(config.agent.name, "sessionkit");
        assert_eq!(config.session.default_mode, "normal");
        assert_eq!(config.session.plan_suffix, ".json");
        assert!(!config.session.eva_session);
        assert!(!config.session.eva_round);
        assert_eq!(config.session.round_limit(), None);
        assert!(config.logging.log_dir.is_none());
        assert!(config.experience.enabled);
    }

    #[test]
    fn test_get_methods() {
        let loader = ConfigurationLoader::from_config(ConfigurationLoader::get_default_config());
        assert_eq!(
            loader.get_string("agent.name"),
            Some("sessionkit".to_string())
        );
        assert_eq!(loader.get_string("logging.log_dir"), None);
        assert_eq!(loader.get_u64("session.max_rounds"), Some(0));
        assert_eq!(loader.get_bool("session.eva_round"), Some(false));
        assert_eq!(loader.get_bool("experience.enabled"), Some(true));
        assert_eq!(loader.get_string("unknown.key"), None);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loader =
            ConfigurationLoader::new(Some(&temp_dir.path().join("absent.toml"))).unwrap();
        assert_eq!(loader.config.agent.name, "sessionkit");
    }

    #[test]
    fn test_session_config_from_toml() {
        use tempfile::NamedTempFile;

        let toml_content = r#"
[agent]
name = "replayer"
version = "0.2.0"

[session]
default_mode = "follower"
eva_session = true
max_rounds = 12

[logging]
log_dir = "/tmp/replayer-logs"
log_level = "DEBUG"

[experience]
enabled = false
"#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).unwrap();

        let loader = ConfigurationLoader::new(Some(temp_file.path())).unwrap();
        assert_eq!(loader.config.session.default_mode, "follower");
        assert!(loader.config.session.eva_session);
        assert!(!loader.config.session.eva_round);
        assert_eq!(loader.config.session.round_limit(), Some(12));
        assert_eq!(loader.config.session.plan_suffix, ".json");
        assert_eq!(
            loader.get_string("logging.log_dir"),
            Some("/tmp/replayer-logs".to_string())
        );
        assert_eq!(loader.get_bool("experience.enabled"), Some(false));
        assert_eq!(loader.config.experience.experience_dir, "experience");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        use tempfile::NamedTempFile;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "[agent\nname = ").unwrap();

        let err = ConfigurationLoader::new(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }
}
