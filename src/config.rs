//! Configuration module
//!
//! The configuration lives in `~/.series/config.json`. Keys use PascalCase so
//! files written by earlier versions of the tool keep working.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the directory below the home directory holding config and index
pub const CONFIG_DIR_NAME: &str = ".series";

/// Errors that can occur while loading or writing the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine the home directory
    #[error("Failed to determine home directory location")]
    HomeDirectoryNotFound,

    /// Failed to create the configuration directory
    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the configuration file
    #[error("Failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON
    #[error("Failed to deserialize config file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize the configuration
    #[error("Failed to serialize config: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Application configuration
///
/// Keys missing from the file keep the value of the defaults passed to
/// [`Config::load_or_create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// The XML file holding the series index
    pub index_file: PathBuf,
    /// Directory scanned for downloaded episodes
    pub episode_directory: PathBuf,
    /// Shell command run before episodes are processed
    pub pre_processing_hook: String,
    /// Shell command run after all episodes were renamed
    pub post_processing_hook: String,
    /// Shell command run for every renamed episode
    pub episode_hook: String,
    /// Shell commands asked for series names, in order
    pub script_extractors: Vec<String>,
    /// Keys this version does not know, kept when writing the file back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial view of the configuration file used for merging
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ConfigFile {
    index_file: Option<PathBuf>,
    episode_directory: Option<PathBuf>,
    pre_processing_hook: Option<String>,
    post_processing_hook: Option<String>,
    episode_hook: Option<String>,
    script_extractors: Option<Vec<String>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Config {
    /// The configuration directory below the user's home directory
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        let base_dirs = directories::BaseDirs::new().ok_or(ConfigError::HomeDirectoryNotFound)?;
        Ok(base_dirs.home_dir().join(CONFIG_DIR_NAME))
    }

    /// The default location of the configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::default_dir()?.join("config.json"))
    }

    /// Default values: index next to the config, episodes in the download directory
    pub fn defaults() -> Result<Self, ConfigError> {
        let base_dirs = directories::BaseDirs::new().ok_or(ConfigError::HomeDirectoryNotFound)?;
        let episode_directory = directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| base_dirs.home_dir().join("Downloads"));

        Ok(Self {
            index_file: base_dirs.home_dir().join(CONFIG_DIR_NAME).join("index.xml"),
            episode_directory,
            ..Default::default()
        })
    }

    /// Loads the configuration at `path`, creating it from `defaults` if missing
    ///
    /// Values in the file override the defaults. The merged configuration is
    /// written back so keys added in newer versions show up in the file.
    pub fn load_or_create(path: &Path, defaults: Config) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryCreationFailed {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
            }
            debug!(path = %path.display(), "creating config file with defaults");
            defaults.write(path)?;
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::DeserializationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config = defaults.merge(file);
        config.write(path)?;

        Ok(config)
    }

    /// Writes the configuration as pretty printed JSON
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;

        fs::write(path, json).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn merge(self, file: ConfigFile) -> Self {
        Self {
            index_file: file.index_file.unwrap_or(self.index_file),
            episode_directory: file.episode_directory.unwrap_or(self.episode_directory),
            pre_processing_hook: file.pre_processing_hook.unwrap_or(self.pre_processing_hook),
            post_processing_hook: file
                .post_processing_hook
                .unwrap_or(self.post_processing_hook),
            episode_hook: file.episode_hook.unwrap_or(self.episode_hook),
            script_extractors: file.script_extractors.unwrap_or(self.script_extractors),
            extra: {
                let mut extra = self.extra;
                extra.extend(file.extra);
                extra
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_created_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".series/config.json");

        let defaults = Config {
            index_file: PathBuf::from("/tmp/index.xml"),
            ..Default::default()
        };
        let config = Config::load_or_create(&path, defaults.clone()).unwrap();

        assert_eq!(config, defaults);
        assert!(path.is_file());
    }

    #[test]
    fn test_user_changes_win_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".series/config.json");

        let old = Config {
            index_file: PathBuf::from("/not/existing/file.json"),
            ..Default::default()
        };
        Config::load_or_create(&path, old).unwrap();

        let defaults = Config {
            index_file: PathBuf::from("/other/non/existing/file"),
            ..Default::default()
        };
        let config = Config::load_or_create(&path, defaults).unwrap();

        assert_eq!(config.index_file, PathBuf::from("/not/existing/file.json"));
    }

    #[test]
    fn test_missing_keys_are_filled_and_written_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "EpisodeHook": "notify-send" }"#).unwrap();

        let defaults = Config {
            episode_directory: PathBuf::from("/downloads"),
            script_extractors: vec!["/usr/local/bin/names".to_string()],
            ..Default::default()
        };
        let config = Config::load_or_create(&path, defaults).unwrap();

        assert_eq!(config.episode_hook, "notify-send");
        assert_eq!(config.episode_directory, PathBuf::from("/downloads"));
        assert_eq!(config.script_extractors, vec!["/usr/local/bin/names"]);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"EpisodeDirectory\": \"/downloads\""));
        assert!(written.contains("\"ScriptExtractors\""));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_or_create(&path, Config::default()).unwrap_err();
        assert!(matches!(err, ConfigError::DeserializationFailed { .. }));
    }

    #[test]
    fn test_unknown_keys_survive_write_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "StreamsAPIToken": "secret-token", "IndexFile": "/x.xml" }"#,
        )
        .unwrap();

        let config = Config::load_or_create(&path, Config::default()).unwrap();
        assert_eq!(config.index_file, PathBuf::from("/x.xml"));
        assert_eq!(
            config.extra.get("StreamsAPIToken"),
            Some(&Value::String("secret-token".to_string()))
        );

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"StreamsAPIToken\": \"secret-token\""));

        // a second start must not lose it either
        Config::load_or_create(&path, Config::default()).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("secret-token"));
    }
}
