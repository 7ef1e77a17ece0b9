//! File and environment configuration.
//!
//! Precedence, highest first: command-line flags (applied by the binary),
//! environment overrides, the TOML config file, built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::error::PipelineError;
use crate::pipeline::{
    DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_METADATA_TIMEOUT, PipelineSettings, SelectionMode,
};
use crate::query::{DEFAULT_RESULT_LIMIT, MAX_RESULT_LIMIT};
use crate::sink::default_download_dir;
use crate::source::{
    ApiCredentials, CatalogSource, DEFAULT_API_KEY_HEADER, DEFAULT_INDEX_BASE_URL,
    DEFAULT_MIRROR_PAGE_TEMPLATE,
};

/// Environment variable holding the hosted API key.
pub const API_KEY_ENV: &str = "BOOKFETCH_API_KEY";

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "BOOKFETCH_OUTPUT_DIR";

const APP_DIR: &str = "bookfetch";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Directory downloads are written to.
    pub output_dir: Option<PathBuf>,
    /// Base URL of the scraped catalog.
    pub index_base_url: Option<String>,
    /// Base URL of the hosted search API; the API is used only with a key.
    pub api_base_url: Option<String>,
    /// API key. Prefer the `BOOKFETCH_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    /// Mirror page URL with a `{content_id}` placeholder.
    pub mirror_page_template: Option<String>,
    pub metadata_timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    pub max_download_bytes: Option<u64>,
    pub result_limit: Option<u64>,
    pub auto_select: Option<bool>,
    pub auto_open: Option<bool>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("metadata_timeout_secs", self.metadata_timeout_secs)?;
        validate_timeout_secs("download_timeout_secs", self.download_timeout_secs)?;

        if let Some(limit) = self.result_limit
            && !(1..=MAX_RESULT_LIMIT as u64).contains(&limit)
        {
            return Err(ConfigError::Invalid {
                field: "result_limit",
                message: format!("{limit}. Expected range: 1..={MAX_RESULT_LIMIT}"),
            });
        }

        if self.max_download_bytes == Some(0) {
            return Err(ConfigError::Invalid {
                field: "max_download_bytes",
                message: "0. Expected a positive byte count".to_string(),
            });
        }

        if let Some(template) = &self.mirror_page_template
            && !template.contains(crate::mirror::CONTENT_ID_PLACEHOLDER)
        {
            return Err(ConfigError::Invalid {
                field: "mirror_page_template",
                message: format!("'{template}' has no {{content_id}} placeholder"),
            });
        }

        Ok(())
    }
}

fn validate_timeout_secs(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::Invalid {
            field,
            message: format!("{value}. Expected range: 1..=3600"),
        });
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bookfetch/config.toml`
/// 2. `$HOME/.config/bookfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the file exists but cannot be read, parsed, or validated.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    };

    if !path_ref.exists() {
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Reads, parses, and validates one config file.
///
/// # Errors
///
/// Returns a [`ConfigError`] for unreadable, malformed, or invalid files.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = FileConfig::parse(&raw, path)?;
    config.validate()?;
    Ok(config)
}

/// Effective settings after merging file, environment, and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub index_base_url: String,
    pub api_base_url: Option<String>,
    pub api_credentials: Option<ApiCredentials>,
    pub mirror_page_template: String,
    pub metadata_timeout: Duration,
    pub download_timeout: Duration,
    pub max_download_bytes: Option<u64>,
    pub result_limit: usize,
    pub selection_mode: SelectionMode,
    pub auto_open: bool,
}

impl Settings {
    /// Merges `file` with environment lookups from `env_lookup` and defaults.
    ///
    /// `env_lookup` is injected so callers (and tests) control the environment.
    #[must_use]
    pub fn resolve<F>(file: Option<&FileConfig>, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.cloned().unwrap_or_default();
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let output_dir = non_empty(env_lookup(OUTPUT_DIR_ENV))
            .map(PathBuf::from)
            .or(file.output_dir)
            .unwrap_or_else(default_download_dir);

        let api_key = non_empty(env_lookup(API_KEY_ENV)).or(non_empty(file.api_key));
        let api_credentials = api_key.map(|key| {
            ApiCredentials::new(
                file.api_key_header
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                key,
            )
        });

        Self {
            output_dir,
            index_base_url: file
                .index_base_url
                .unwrap_or_else(|| DEFAULT_INDEX_BASE_URL.to_string()),
            api_base_url: non_empty(file.api_base_url),
            api_credentials,
            mirror_page_template: file
                .mirror_page_template
                .unwrap_or_else(|| DEFAULT_MIRROR_PAGE_TEMPLATE.to_string()),
            metadata_timeout: file
                .metadata_timeout_secs
                .map_or(DEFAULT_METADATA_TIMEOUT, Duration::from_secs),
            download_timeout: file
                .download_timeout_secs
                .map_or(DEFAULT_DOWNLOAD_TIMEOUT, Duration::from_secs),
            max_download_bytes: file.max_download_bytes,
            result_limit: file
                .result_limit
                .and_then(|limit| usize::try_from(limit).ok())
                .unwrap_or(DEFAULT_RESULT_LIMIT),
            selection_mode: if file.auto_select.unwrap_or(false) {
                SelectionMode::AutoFirst
            } else {
                SelectionMode::Explicit
            },
            auto_open: file.auto_open.unwrap_or(false),
        }
    }

    /// [`Self::resolve`] against the process environment.
    #[must_use]
    pub fn from_process_env(file: Option<&FileConfig>) -> Self {
        Self::resolve(file, |name| env::var(name).ok())
    }

    /// Pipeline settings derived from these settings.
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            metadata_timeout: self.metadata_timeout,
            download_timeout: self.download_timeout,
            max_download_bytes: self.max_download_bytes,
            selection_mode: self.selection_mode,
            mirror_page_template: Some(self.mirror_page_template.clone()),
        }
    }

    /// Catalog sources in search order: the hosted API first when it has
    /// both a base URL and a key, then the index site.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] for malformed base URLs.
    pub fn sources(&self) -> Result<Vec<CatalogSource>, PipelineError> {
        let mut sources = Vec::with_capacity(2);
        match (&self.api_base_url, &self.api_credentials) {
            (Some(base_url), Some(credentials)) => {
                sources.push(CatalogSource::hosted_api(base_url, credentials.clone())?);
            }
            (None, Some(_)) => {
                warn!("API key configured without `api_base_url`; hosted API disabled");
            }
            _ => {}
        }
        sources.push(CatalogSource::index_site(&self.index_base_url)?);
        Ok(sources)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
            output_dir = "/srv/books"
            index_base_url = "https://catalog.example"
            api_base_url = "https://api.example/v1"
            api_key_header = "Authorization"
            mirror_page_template = "https://mirror.example/main/{content_id}"
            metadata_timeout_secs = 15
            download_timeout_secs = 300
            max_download_bytes = 104857600
            result_limit = 25
            auto_select = true
            auto_open = false
        "#;
        let config = FileConfig::parse(raw, Path::new("config.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.output_dir, Some(PathBuf::from("/srv/books")));
        assert_eq!(config.result_limit, Some(25));
        assert_eq!(config.auto_select, Some(true));
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let err = FileConfig::parse("concurrency = 4", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("c.toml"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let cases = [
            FileConfig {
                metadata_timeout_secs: Some(0),
                ..FileConfig::default()
            },
            FileConfig {
                download_timeout_secs: Some(3601),
                ..FileConfig::default()
            },
            FileConfig {
                result_limit: Some(101),
                ..FileConfig::default()
            },
            FileConfig {
                max_download_bytes: Some(0),
                ..FileConfig::default()
            },
            FileConfig {
                mirror_page_template: Some("https://m.example/main/".to_string()),
                ..FileConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid { .. })),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_load_file_config_reads_and_validates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "result_limit = 0\n").unwrap();
        assert!(matches!(
            load_file_config(&path),
            Err(ConfigError::Invalid { field: "result_limit", .. })
        ));

        std::fs::write(&path, "result_limit = 5\n").unwrap();
        assert_eq!(load_file_config(&path).unwrap().result_limit, Some(5));

        assert!(matches!(
            load_file_config(&temp.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::resolve(None, env_from(&[]));
        assert_eq!(settings.index_base_url, DEFAULT_INDEX_BASE_URL);
        assert_eq!(settings.result_limit, DEFAULT_RESULT_LIMIT);
        assert_eq!(settings.selection_mode, SelectionMode::Explicit);
        assert!(settings.api_credentials.is_none());
        assert!(settings.output_dir.ends_with("bookfetch"));
        assert_eq!(settings.sources().unwrap().len(), 1);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/file")),
            api_key: Some("file-key".to_string()),
            api_base_url: Some("https://api.example".to_string()),
            auto_select: Some(true),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(
            Some(&file),
            env_from(&[(OUTPUT_DIR_ENV, "/from/env"), (API_KEY_ENV, "env-key")]),
        );
        assert_eq!(settings.output_dir, PathBuf::from("/from/env"));
        assert_eq!(settings.api_credentials.as_ref().unwrap().key, "env-key");
        assert_eq!(
            settings.api_credentials.as_ref().unwrap().header,
            DEFAULT_API_KEY_HEADER
        );
        assert_eq!(settings.selection_mode, SelectionMode::AutoFirst);

        let sources = settings.sources().unwrap();
        assert_eq!(
            sources.iter().map(CatalogSource::name).collect::<Vec<_>>(),
            vec!["hosted-api", "index-site"]
        );
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/from/file")),
            ..FileConfig::default()
        };
        let settings = Settings::resolve(Some(&file), env_from(&[(OUTPUT_DIR_ENV, "  ")]));
        assert_eq!(settings.output_dir, PathBuf::from("/from/file"));
    }

    #[test]
    fn test_key_without_api_base_url_keeps_index_only() {
        let settings = Settings::resolve(None, env_from(&[(API_KEY_ENV, "k")]));
        assert_eq!(settings.sources().unwrap().len(), 1);
    }
}
