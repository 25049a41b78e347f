// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

/// release notes page whose first version heading is the latest release.
pub const DEFAULT_RELEASE_NOTES_URL: &str = "https://www.ableton.com/en/release-notes/live-12/";

/// verbosity level for operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// default log filter for this level, used when `RUST_LOG` is unset.
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl std::str::FromStr for Verbosity {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            other => Err(crate::Error::config(format!(
                "unknown verbosity '{other}', expected quiet, normal or verbose"
            ))),
        }
    }
}

/// configuration for catalog operations.
///
/// library consumers can construct this directly; the cli fills it from
/// its toml file.
#[derive(Debug, Clone)]
pub struct Config {
    /// page scraped for the latest release.
    pub release_notes_url: String,

    /// relay that fetches `release_notes_url` on our behalf. it receives the
    /// target in its `url` query parameter.
    pub proxy_url: Option<String>,

    /// base url of a remote catalog service. when unset the catalog lives
    /// in a local file store under `data_dir`.
    pub catalog_url: Option<String>,

    /// directory of the local file store. defaults to `$XDG_DATA_HOME/live-catalog`.
    pub data_dir: Option<PathBuf>,

    /// verbosity level for output.
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            release_notes_url: DEFAULT_RELEASE_NOTES_URL.to_string(),
            proxy_url: None,
            catalog_url: None,
            data_dir: None,
            verbosity: Verbosity::default(),
        }
    }
}

impl Config {
    /// creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release_notes_url(mut self, url: impl Into<String>) -> Self {
        self.release_notes_url = url.into();
        self
    }

    pub fn with_proxy_url(mut self, url: Option<String>) -> Self {
        self.proxy_url = url;
        self
    }

    pub fn with_catalog_url(mut self, url: Option<String>) -> Self {
        self.catalog_url = url;
        self
    }

    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.data_dir = dir;
        self
    }

    /// creates a config with the given verbosity level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// the local store directory in effect.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(crate::paths::default_data_dir)
    }
}
