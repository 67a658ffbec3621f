// Configuration sources and the layered loader
use crate::error::{ConfigError, Result};
use crate::validation::Validate;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Nesting separator inside environment variable names.
pub const ENV_NESTING_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// YAML or TOML file, picked by extension.
    File { path: PathBuf, required: bool },
    /// Environment variables starting with `prefix`.
    Env { prefix: String },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ConfigSource::File {
            path: path.into(),
            required: true,
        }
    }

    pub fn optional_file(path: impl Into<PathBuf>) -> Self {
        ConfigSource::File {
            path: path.into(),
            required: false,
        }
    }

    pub fn env(prefix: impl Into<String>) -> Self {
        ConfigSource::Env {
            prefix: prefix.into(),
        }
    }
}

/// Layers sources on top of the type's defaults; later sources win.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Extract and validate a `T`, starting from `T::default()`.
    pub fn load<T>(&self) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default + Validate,
    {
        let mut figment = Figment::from(Serialized::defaults(T::default()));

        for source in &self.sources {
            figment = match source {
                ConfigSource::File { path, required } => {
                    if !path.exists() {
                        if *required {
                            return Err(ConfigError::SourceNotFound(path.clone()));
                        }
                        tracing::debug!(path = %path.display(), "Optional config file absent");
                        continue;
                    }
                    merge_file(figment, path)?
                }
                ConfigSource::Env { prefix } => {
                    figment.merge(Env::prefixed(prefix).split(ENV_NESTING_SEPARATOR))
                }
            };
        }

        let config: T = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Per-user config file location, e.g. `~/.config/<app>/config.yaml`.
    pub fn default_config_path(app: &str) -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", app)
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
        Some("toml") => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
