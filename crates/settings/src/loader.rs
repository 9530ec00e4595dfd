use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::settings::Settings;
use crate::Result;

pub const DEFAULT_ENV_PREFIX: &str = "DRUID";

enum SettingsSource {
    File { path: PathBuf, required: bool },
    Inline { content: String, format: FileFormat },
}

/// Binds [`Settings`] from files, inline documents and the environment.
///
/// Later sources win: files and inline documents in the order added, then
/// environment variables. Keys are the snake_case field names, e.g.
/// `DRUID_INITIAL_SIZE=30` or `DRUID_STAT_FILTER__SLOW_SQL_MILLIS=1000`.
pub struct SettingsLoader {
    sources: Vec<SettingsSource>,
    env_prefix: Option<String>,
    env_override: Option<HashMap<String, String>>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
            env_override: None,
        }
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settings file; format follows the extension (toml, yaml, json)
    pub fn with_file(mut self, path: impl Into<PathBuf>, required: bool) -> Self {
        self.sources.push(SettingsSource::File {
            path: path.into(),
            required,
        });
        self
    }

    pub fn with_str(mut self, content: impl Into<String>, format: FileFormat) -> Self {
        self.sources.push(SettingsSource::Inline {
            content: content.into(),
            format,
        });
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Read variables from `vars` instead of the process environment
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_override = Some(vars);
        self
    }

    pub fn load(self) -> Result<Settings> {
        let mut builder = Config::builder();

        for source in self.sources {
            builder = match source {
                SettingsSource::File { path, required } => {
                    debug!("Adding settings file {}", path.display());
                    builder.add_source(File::from(path).required(required))
                }
                SettingsSource::Inline { content, format } => {
                    builder.add_source(File::from_str(&content, format))
                }
            };
        }

        if let Some(prefix) = self.env_prefix {
            debug!("Reading settings from {}_* environment variables", prefix);
            builder = builder.add_source(
                Environment::with_prefix(&prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_override),
            );
        }

        let settings: Settings = builder.build()?.try_deserialize()?;

        info!(
            "Settings loaded (enabled: {}, slaves: {})",
            settings.enabled,
            settings.slaves.len()
        );

        Ok(settings)
    }
}
