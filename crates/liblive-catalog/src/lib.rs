// SPDX-License-Identifier: MIT OR Apache-2.0

//! # liblive-catalog
//!
//! Keeps an authoritative, ordered catalog of Ableton Live releases and turns a
//! chosen release into a download link.
//!
//! - **Version ordering**: dotted-numeral versions compared as `(major, minor, patch)`
//!   with missing components treated as 0
//! - **Catalog store**: the whole catalog persisted under one key, seeded when empty
//! - **Latest version detection**: scrapes the release notes page and merges a newly
//!   published release into the catalog exactly once
//! - **Download urls**: deterministic links per release, platform and edition,
//!   including the macOS packaging change after 11.0.12
//! - **Catalog endpoints** (feature `server`): http read/replace of the catalog
//!
//! ```rust,no_run
//! use liblive_catalog::{Config, detect_latest, resolve};
//!
//! # fn main() -> liblive_catalog::Result<()> {
//! let config = Config::new();
//! if let Some(outcome) = detect_latest(&config)? {
//!     println!("latest: {} (new: {})", outcome.version, outcome.is_new());
//! }
//! println!("{}", resolve("12.3.1", "mac_arm", "suite")?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod api;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod error;
pub mod output;
mod paths;
pub mod resolver;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod version;

pub use api::{ApiClient, DocumentSource, HttpDocumentSource};
pub use catalog::{Catalog, MajorGroup, group_by_major};
pub use config::{Config, DEFAULT_RELEASE_NOTES_URL, Verbosity};
pub use detector::{DetectionOutcome, LatestVersionDetector, PersistStatus, scrape_latest_version};
pub use error::{Error, Result};
pub use output::{CatalogListing, GroupListing, JsonOutput, ResolvedDownload};
pub use paths::default_data_dir;
pub use resolver::{DownloadSelector, Edition, MAC_PACKAGING_BOUNDARY, OsClass, resolve};
pub use store::{
    CatalogStore, FileBackend, KvBackend, KvCatalogStore, MemoryBackend, RemoteCatalogStore,
};
pub use version::{Version, compare as compare_versions, parse_prefix as parse_version_prefix};

/// opens the catalog store selected by the config: the remote service when
/// `catalog_url` is set, otherwise the local file store.
pub fn open_store(config: &Config) -> Result<Arc<dyn CatalogStore>> {
    match &config.catalog_url {
        Some(url) => {
            log::debug!("**store:** using remote catalog at {url}");
            Ok(Arc::new(RemoteCatalogStore::new(ApiClient::new()?, url.clone())))
        }
        None => {
            let dir = config.data_dir();
            log::debug!("**store:** using local catalog in {}", dir.display());
            Ok(Arc::new(KvCatalogStore::open(dir)))
        }
    }
}

/// reads the catalog, newest release first. never fails on a backend miss.
pub fn load_catalog(config: &Config) -> Result<Catalog> {
    let store = open_store(config)?;
    let mut catalog = store.read();
    catalog.sort_newest_first();
    Ok(catalog)
}

/// runs one detector pass with the configured store and release notes source.
///
/// `Ok(None)` means nothing was detected. errors are limited to building the
/// http client or an invalid proxy url.
pub fn detect_latest(config: &Config) -> Result<Option<DetectionOutcome>> {
    let store = open_store(config)?;
    let source = HttpDocumentSource::new(ApiClient::new()?).with_proxy(config.proxy_url.clone());

    // surface a bad proxy url instead of a silent "nothing detected"
    source.request_url(&config.release_notes_url)?;

    let detector = LatestVersionDetector::new(store.as_ref(), &source, &config.release_notes_url);
    Ok(detector.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_catalog_from_empty_dir_is_sorted_seed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_data_dir(Some(dir.path().to_path_buf()));

        let catalog = load_catalog(&config).unwrap();
        assert_eq!(catalog.len(), Catalog::seed().len());
        assert_eq!(catalog.as_slice()[0].as_str(), "12.3.1");
    }

    #[test]
    fn test_load_catalog_sorts_stored_entries() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new().with_data_dir(Some(dir.path().to_path_buf()));
        KvCatalogStore::open(dir.path())
            .write_json(r#"["12.3", "12.4", "11.0.12"]"#)
            .unwrap();

        let catalog = load_catalog(&config).unwrap();
        let texts: Vec<&str> = catalog.iter().map(Version::as_str).collect();
        assert_eq!(texts, vec!["12.4", "12.3", "11.0.12"]);
    }

    #[test]
    fn test_detect_latest_rejects_bad_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new()
            .with_data_dir(Some(dir.path().to_path_buf()))
            .with_proxy_url(Some("::not a url::".to_string()));

        assert!(matches!(detect_latest(&config), Err(Error::Config(_))));
    }
}
