use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use scripted_events::{DisableRule, EventKind};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("disable rule names unknown event '{0}'")]
    UnknownEvent(String),
}

/// Helper function for default true value
fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "info".to_string()
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "scripted")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptingConfig {
    /// Whether event scripts are bound at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory containing scripts (default: <data dir>/scripts)
    #[serde(default)]
    pub script_dir: Option<PathBuf>,

    /// Log per-variable injection and per-dispatch timings
    #[serde(default)]
    pub debug: bool,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_dir: None,
            debug: false,
        }
    }
}

impl ScriptingConfig {
    /// Get the script directory path (use provided or default)
    pub fn script_dir(&self) -> PathBuf {
        self.script_dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|d| d.data_dir().join("scripts"))
                .unwrap_or_else(|| PathBuf::from(".scripts"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file next to the config
    #[serde(default)]
    pub file: bool,

    /// EnvFilter directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            filter: default_filter(),
        }
    }
}

/// `[[disable_rules]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisableRuleConfig {
    pub event: String,

    /// Omit to disable the event for every player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedConfig {
    #[serde(default)]
    pub scripting: ScriptingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub disable_rules: Vec<DisableRuleConfig>,
}

impl ScriptedConfig {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Directory the log file is written to
    pub fn log_dir() -> Result<PathBuf, ConfigError> {
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(&self)?;
        fs::write(path, content).map_err(io_err)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Config written on first run
    pub fn example() -> Self {
        Self {
            disable_rules: vec![DisableRuleConfig {
                event: EventKind::Hurting.name().to_string(),
                user_id: Some("76561198000000000@steam".to_string()),
            }],
            ..Default::default()
        }
    }

    /// Parsed disable rules; event names are case-sensitive
    pub fn disable_rules(&self) -> Result<Vec<DisableRule>, ConfigError> {
        self.disable_rules
            .iter()
            .map(|rule| {
                let event = rule
                    .event
                    .parse::<EventKind>()
                    .map_err(|_| ConfigError::UnknownEvent(rule.event.clone()))?;
                Ok(DisableRule {
                    event,
                    user_id: rule.user_id.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: ScriptedConfig = toml::from_str("").unwrap();
        assert!(config.scripting.enabled);
        assert!(!config.scripting.debug);
        assert_eq!(config.logging.filter, "info");
        assert!(config.disable_rules.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = ScriptedConfig::example();
        config.scripting.script_dir = Some(temp_dir.path().join("scripts"));
        config.save_to(&path).unwrap();

        let loaded = ScriptedConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let err = ScriptedConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_disable_rules_parse_event_names() {
        let config: ScriptedConfig = toml::from_str(
            r#"
[[disable_rules]]
event = "InteractingDoor"

[[disable_rules]]
event = "Hurting"
user_id = "bob@steam"
"#,
        )
        .unwrap();

        let rules = config.disable_rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].event, EventKind::InteractingDoor);
        assert_eq!(rules[0].user_id, None);
        assert_eq!(rules[1].user_id.as_deref(), Some("bob@steam"));

        let bad: ScriptedConfig =
            toml::from_str("[[disable_rules]]\nevent = \"interactingdoor\"\n").unwrap();
        assert!(matches!(
            bad.disable_rules(),
            Err(ConfigError::UnknownEvent(_))
        ));
    }
}
