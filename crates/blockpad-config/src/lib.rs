use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Language tokens registered when the config file does not list any.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "text",
    "math",
    "json",
    "python",
    "html",
    "sql",
    "markdown",
    "java",
    "php",
    "css",
    "xml",
    "cpp",
    "rust",
    "csharp",
    "ruby",
    "shell",
    "yaml",
    "toml",
    "golang",
    "javascript",
    "typescript",
    "jsx",
    "tsx",
    "swift",
    "kotlin",
    "groovy",
    "diff",
    "powershell",
    "dart",
    "lua",
    "clojure",
    "erlang",
    "elixir",
    "scala",
    "dockerfile",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid language token {token:?} in config")]
    InvalidLanguageToken { token: String },

    #[error("Default language {language:?} is not in the language list")]
    UnknownDefaultLanguage { language: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Scratch buffer the CLI opens when no path is given
    pub buffer_path: Option<PathBuf>,
    pub editor: EditorConfig,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Registered language tokens
    pub languages: Vec<String>,
    /// Language of new blocks and of an implicit leading block
    pub default_language: String,
    /// Whether new blocks start out auto-detected
    pub default_auto: bool,
    /// Documents up to this many bytes are reparsed synchronously on every
    /// edit; larger ones wait for an idle reparse
    pub sync_parse_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            default_language: "text".to_string(),
            default_auto: true,
            sync_parse_limit: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Suggestions below this confidence are ignored
    pub min_confidence: f64,
    /// Maximum Levenshtein distance between the content sent for detection
    /// and the current content, as a fraction of the sent content's length
    pub max_edit_ratio: f64,
    /// Quiet period after an edit before a detection request is released
    pub idle_delay_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_edit_ratio: 0.1,
            idle_delay_ms: 1000,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded buffer path
        config.buffer_path = config
            .buffer_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Check language tokens and the default language.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = self
            .editor
            .languages
            .iter()
            .find(|token| !blockpad_syntax::is_valid_token(token))
        {
            return Err(ConfigError::InvalidLanguageToken {
                token: token.clone(),
            });
        }

        if !self
            .editor
            .languages
            .iter()
            .any(|token| *token == self.editor.default_language)
        {
            return Err(ConfigError::UnknownDefaultLanguage {
                language: self.editor.default_language.clone(),
            });
        }

        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/blockpad/config.toml"));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.editor.default_language, "text");
        assert!(config.editor.default_auto);
        assert_eq!(config.detection.max_edit_ratio, 0.1);
        assert!(config.buffer_path.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut original = Config::default();
        original.buffer_path = Some(PathBuf::from("/tmp/buffer.txt"));
        original.editor.languages = vec!["text".to_string(), "json".to_string()];

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[detection]
min_confidence = 0.8
"#,
        )
        .unwrap();

        assert_eq!(config.detection.min_confidence, 0.8);
        assert_eq!(config.detection.idle_delay_ms, 1000);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_token() {
        let mut config = Config::default();
        config.editor.languages.push("c++".to_string());

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLanguageToken { token }) if token == "c++"
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_default_language() {
        let mut config = Config::default();
        config.editor.default_language = "klingon".to_string();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownDefaultLanguage { .. })
        ));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("BLOCKPAD_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$BLOCKPAD_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("BLOCKPAD_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_invalid_toml_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "editor = [").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::default();
        test_config.buffer_path = Some(PathBuf::from("/tmp/scratch.txt"));
        test_config.detection.idle_delay_ms = 250;

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_load_expands_buffer_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "buffer_path = \"~/notes/buffer.txt\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let path = config.buffer_path.unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with("notes/buffer.txt"));
    }
}
