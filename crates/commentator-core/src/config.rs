//! Configuration handling for commentator.
//!
//! Settings come from a TOML file. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration:
//!
//! ```toml
//! [generation]
//! model = "gpt-3.5-turbo"
//! api_base = "https://api.openai.com/v1"
//! timeout_secs = 120
//!
//! [annotate]
//! max_attempts = 3
//! log_file = "commentator.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "commentator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Commentator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Annotation loop settings
    #[serde(default)]
    pub annotate: AnnotateConfig,
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API, without the trailing path
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Overall timeout for one request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature; the service default when absent
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Annotation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotateConfig {
    /// Generation attempts per function before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Where rejected candidates are logged
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Human language to add translations in
    #[serde(default)]
    pub translate: Option<String>,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_log_file() -> PathBuf {
    PathBuf::from("commentator.log")
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
        }
    }
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            log_file: default_log_file(),
            translate: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Find and load the configuration.
    ///
    /// Lookup order: `explicit` (which must exist), `commentator.toml` in
    /// `cwd`, `commentator/config.toml` in the user config directory, then
    /// defaults. Returns the path that was loaded, if any.
    pub fn discover(
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let user_config = dirs::config_dir().map(|dir| dir.join("commentator").join("config.toml"));
        Self::discover_in(explicit, cwd, user_config)
    }

    /// [`Config::discover`] with the user config location supplied by the
    /// caller.
    pub fn discover_in(
        explicit: Option<&Path>,
        cwd: &Path,
        user_config: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let candidates = std::iter::once(cwd.join(PROJECT_CONFIG_FILE)).chain(user_config);
        for path in candidates {
            if path.is_file() {
                return Ok((Self::load(&path)?, Some(path)));
            }
        }
        Ok((Config::default(), None))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.annotate.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "annotate.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.generation.model, "gpt-3.5-turbo");
        assert_eq!(config.generation.timeout_secs, 120);
        assert_eq!(config.annotate.max_attempts, 3);
        assert_eq!(config.annotate.log_file, PathBuf::from("commentator.log"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            "[generation]\nmodel = \"gpt-4o-mini\"\n\n[annotate]\ntranslate = \"Spanish\"\n",
        )
        .unwrap();
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.api_base, "https://api.openai.com/v1");
        assert_eq!(config.annotate.translate.as_deref(), Some("Spanish"));
        assert_eq!(config.annotate.max_attempts, 3);
    }

    #[test]
    fn discover_prefers_project_file() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user.toml");
        std::fs::write(&user, "[annotate]\nmax_attempts = 9\n").unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[annotate]\nmax_attempts = 5\n",
        )
        .unwrap();

        let (config, path) = Config::discover_in(None, temp.path(), Some(user)).unwrap();
        assert_eq!(config.annotate.max_attempts, 5);
        assert_eq!(path, Some(temp.path().join(PROJECT_CONFIG_FILE)));
    }

    #[test]
    fn discover_falls_back_to_user_then_defaults() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join("user.toml");
        std::fs::write(&user, "[annotate]\nmax_attempts = 9\n").unwrap();

        let (config, _) = Config::discover_in(None, temp.path(), Some(user.clone())).unwrap();
        assert_eq!(config.annotate.max_attempts, 9);

        std::fs::remove_file(&user).unwrap();
        let (config, path) = Config::discover_in(None, temp.path(), Some(user)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(path, None);
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let err = Config::discover_in(Some(&missing), temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("c.toml");
        std::fs::write(&path, "[annotate]\nmax_attempts = 0\n").unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("c.toml");
        std::fs::write(&path, "[annotate\n").unwrap();
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }
}
