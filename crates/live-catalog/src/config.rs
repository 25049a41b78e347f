// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use liblive_catalog::{Config, Error, Result, Verbosity};
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "live-catalog.toml";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    release_notes_url: Option<String>,
    proxy_url: Option<String>,
    catalog_url: Option<String>,
    data_dir: Option<PathBuf>,
    verbosity: Option<String>,
    bind: Option<String>,
}

/// cli configuration wrapper that combines toml file parsing with the library's config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub inner: Config,
    pub bind: SocketAddr,
}

impl std::ops::Deref for CliConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl CliConfig {
    pub fn load() -> Result<Self> {
        Self::from_toml(Self::load_toml_config()?)
    }

    fn from_toml(toml_config: TomlConfig) -> Result<Self> {
        let verbosity = match toml_config.verbosity.as_deref() {
            Some(level) => level.parse()?,
            None => Verbosity::Normal,
        };

        let bind = parse_bind(toml_config.bind.as_deref().unwrap_or(DEFAULT_BIND))?;

        let mut inner = Config::new()
            .with_proxy_url(non_empty(toml_config.proxy_url))
            .with_catalog_url(non_empty(toml_config.catalog_url))
            .with_data_dir(toml_config.data_dir)
            .with_verbosity(verbosity);

        if let Some(url) = non_empty(toml_config.release_notes_url) {
            inner = inner.with_release_notes_url(url);
        }

        Ok(Self { inner, bind })
    }

    fn load_toml_config() -> Result<TomlConfig> {
        let Some(path) = config_path() else {
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            return Ok(TomlConfig::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    pub fn edit_config() -> Result<()> {
        let Some(path) = config_path() else {
            return Err(Error::config("could not determine config directory"));
        };

        if !path.exists() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).map_err(|e| {
                    Error::config(format!(
                        "failed to create config directory {}: {e}",
                        dir.display()
                    ))
                })?;
            }

            let default_content = r#"# live-catalog configuration
# release_notes_url = "https://www.ableton.com/en/release-notes/live-12/"
# proxy_url = "https://relay.example.dev/"  # receives the target as ?url=
# catalog_url = "https://catalog.example.dev"  # remote catalog service
# data_dir = "/var/lib/live-catalog"
# verbosity = "normal"  # quiet, normal, verbose
# bind = "127.0.0.1:8787"
"#;
            fs::write(&path, default_content).map_err(|e| {
                Error::config(format!(
                    "failed to create config file {}: {e}",
                    path.display()
                ))
            })?;
        }

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
        std::process::Command::new(&editor)
            .arg(&path)
            .status()
            .map_err(|e| Error::other(format!("failed to open editor {editor}: {e}")))?;

        Ok(())
    }
}

pub fn parse_bind(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| Error::config(format!("invalid bind address '{value}': {e}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
