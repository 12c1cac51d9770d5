use patchbay_engine::{LogRangePolicy, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

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
}

/// How widget ranges are checked, as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePolicy {
    #[default]
    Strict,
    AllowInverted,
}

impl From<RangePolicy> for LogRangePolicy {
    fn from(policy: RangePolicy) -> Self {
        match policy {
            RangePolicy::Strict => LogRangePolicy::Strict,
            RangePolicy::AllowInverted => LogRangePolicy::AllowInverted,
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where parsed patches are cached; no caching when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Directories searched for externals by `patchbay deps`
    pub search_paths: Vec<PathBuf>,
    /// Target format used when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_format: Option<String>,
    /// Font size for root canvases created without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    pub log_range_policy: RangePolicy,
    pub tolerant_xml: bool,
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

        // Expand shell variables and tilde in the configured paths
        config.cache_dir = config
            .cache_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));
        config.search_paths = config
            .search_paths
            .into_iter()
            .map(|path| Self::expand_path(&path).unwrap_or(path))
            .collect();

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
        let config_dir = shellexpand::tilde("~/.config/patchbay");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Engine settings with this file's overrides applied to the defaults.
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(font_size) = self.font_size {
            settings.canvas.font = font_size;
        }
        settings.log_range = self.log_range_policy.into();
        settings.tolerant_xml = self.tolerant_xml;
        settings
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
    use patchbay_engine::{CanvasHeader, PatchBuilder};
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/patchbay/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.to_settings(), Settings::default());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            cache_dir: Some(PathBuf::from("/tmp/patchbay-cache")),
            search_paths: vec![PathBuf::from("/usr/lib/pd/extra")],
            default_format: Some("xml".to_string()),
            font_size: Some(10.0),
            log_range_policy: RangePolicy::AllowInverted,
            tolerant_xml: true,
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
        assert!(toml_str.contains("log_range_policy = \"allow-inverted\""));
    }

    #[test]
    fn test_settings_take_overrides() {
        let config: Config = toml::from_str(
            r#"
font_size = 16
log_range_policy = "allow-inverted"
tolerant_xml = true
"#,
        )
        .unwrap();

        let settings = config.to_settings();

        assert_eq!(settings.canvas.font, 16.0);
        assert_eq!(settings.log_range, LogRangePolicy::AllowInverted);
        assert!(settings.tolerant_xml);
    }

    #[test]
    fn test_font_size_reaches_new_root_canvases() {
        let config = Config {
            font_size: Some(16.0),
            ..Config::default()
        };
        let settings = config.to_settings();

        let mut builder = PatchBuilder::new("fresh", &settings);
        builder.open_root(None, None).unwrap();
        let patch = builder.finish().unwrap();

        assert_eq!(patch.canvases[0].header, CanvasHeader::Root { font: 16.0 });
    }

    #[test]
    fn test_unknown_policy_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "log_range_policy = \"lenient\"\n").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
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
    fn test_paths_in_toml_are_expanded_on_load() {
        unsafe {
            env::set_var("PATCHBAY_TEST_ROOT", "/custom/pd");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            r#"
cache_dir = "$PATCHBAY_TEST_ROOT/cache"
search_paths = ["$PATCHBAY_TEST_ROOT/extra", "/opt/externals"]
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.cache_dir, Some(PathBuf::from("/custom/pd/cache")));
        assert_eq!(
            config.search_paths,
            vec![
                PathBuf::from("/custom/pd/extra"),
                PathBuf::from("/opt/externals")
            ]
        );

        unsafe {
            env::remove_var("PATCHBAY_TEST_ROOT");
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
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            cache_dir: Some(PathBuf::from("/tmp/patchbay-cache")),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
