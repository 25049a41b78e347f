// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::PathBuf,
};

use parking_lot::Mutex;

use crate::{ApiClient, Catalog, Error, Result};

/// key the whole catalog is stored under.
pub const CATALOG_KEY: &str = "versions_list";

const READ_PATH: &str = "/api/get-versions";
const WRITE_PATH: &str = "/api/update-versions";

/// durable string key-value storage.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// stores each key as `<dir>/<key>.json`. writes go through a temporary
/// file in the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::backend(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::backend(format!("read {}: {e}", path.display()))),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::backend(format!("create dir {}: {e}", self.dir.display())))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::backend(format!("create temp file: {e}")))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| Error::backend(format!("write temp file: {e}")))?;
        tmp.persist(&path)
            .map_err(|e| Error::backend(format!("replace {}: {}", path.display(), e.error)))?;

        Ok(())
    }
}

/// in-process backend, mostly useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// the authoritative catalog. writes replace the whole value and the last
/// writer wins; there is no revision check.
pub trait CatalogStore: Send + Sync {
    /// `Ok(None)` when nothing usable is stored.
    fn load(&self) -> Result<Option<Catalog>>;

    /// replaces the stored catalog.
    fn write(&self, catalog: &Catalog) -> Result<()>;

    /// the stored catalog, or the seed when the backend has nothing usable or fails.
    fn read(&self) -> Catalog {
        match self.load() {
            Ok(Some(catalog)) if !catalog.is_empty() => catalog,
            Ok(_) => {
                log::debug!("**store:** no catalog stored, serving seed");
                Catalog::seed()
            }
            Err(e) => {
                log::warn!("**store:** could not load catalog, serving seed: {e}");
                Catalog::seed()
            }
        }
    }
}

/// catalog persisted as json in a [`KvBackend`].
pub struct KvCatalogStore<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> KvCatalogStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// validates a raw payload and stores it. the stored value is untouched
    /// when validation fails.
    pub fn write_json(&self, payload: &str) -> Result<Catalog> {
        let catalog = Catalog::from_json_str(payload)?;
        self.write(&catalog)?;
        Ok(catalog)
    }
}

impl KvCatalogStore<FileBackend> {
    /// file store under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }
}

impl<B: KvBackend> CatalogStore for KvCatalogStore<B> {
    fn load(&self) -> Result<Option<Catalog>> {
        let Some(content) = self.backend.get(CATALOG_KEY)? else {
            return Ok(None);
        };

        // malformed is not missing: it must never look like an empty slot
        Catalog::from_json_str(&content)
            .map(Some)
            .map_err(|e| Error::backend(format!("stored catalog is malformed: {e}")))
    }

    fn write(&self, catalog: &Catalog) -> Result<()> {
        self.backend.put(CATALOG_KEY, &catalog.to_json())?;
        log::info!("**store:** saved catalog with {} version(s)", catalog.len());
        Ok(())
    }
}

/// catalog held by a remote catalog service.
#[derive(Clone)]
pub struct RemoteCatalogStore {
    client: ApiClient,
    base_url: String,
}

impl RemoteCatalogStore {
    pub fn new(client: ApiClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn read_url(&self) -> String {
        format!("{}{READ_PATH}", self.base_url)
    }

    pub fn write_url(&self) -> String {
        format!("{}{WRITE_PATH}", self.base_url)
    }
}

impl CatalogStore for RemoteCatalogStore {
    fn load(&self) -> Result<Option<Catalog>> {
        self.client.get_json(&self.read_url()).map(Some)
    }

    fn write(&self, catalog: &Catalog) -> Result<()> {
        self.client.post_json(&self.write_url(), catalog.to_json())?;
        log::info!("**store:** posted catalog with {} version(s)", catalog.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Version;

    struct BrokenBackend;

    impl KvBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::backend("unreachable"))
        }

        fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::backend("read-only"))
        }
    }

    fn texts(catalog: &Catalog) -> Vec<&str> {
        catalog.iter().map(Version::as_str).collect()
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested"));

        assert_eq!(backend.get(CATALOG_KEY).unwrap(), None);
        backend.put(CATALOG_KEY, "[\"12.3\"]").unwrap();
        assert_eq!(backend.get(CATALOG_KEY).unwrap().as_deref(), Some("[\"12.3\"]"));

        backend.put(CATALOG_KEY, "[]").unwrap();
        assert_eq!(backend.get(CATALOG_KEY).unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/versions_list.json").is_file());
    }

    #[test]
    fn test_file_backend_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        assert!(backend.put("../escape", "x").is_err());
        assert!(backend.get("").is_err());
    }

    #[test]
    fn test_read_empty_backend_returns_seed() {
        let store = KvCatalogStore::new(MemoryBackend::new());
        let catalog = store.read();
        assert!(!catalog.is_empty());
        assert_eq!(catalog, Catalog::seed());
    }

    #[test]
    fn test_read_empty_array_returns_seed() {
        let store = KvCatalogStore::new(MemoryBackend::new());
        store.write(&Catalog::default()).unwrap();
        assert_eq!(store.read(), Catalog::seed());
    }

    #[test]
    fn test_read_malformed_value_returns_seed() {
        let backend = MemoryBackend::new();
        backend.put(CATALOG_KEY, "{\"oops\": true}").unwrap();
        let store = KvCatalogStore::new(backend);
        assert!(matches!(store.load(), Err(Error::Backend(_))));
        assert_eq!(store.read(), Catalog::seed());
    }

    #[test]
    fn test_read_backend_failure_returns_seed() {
        let store = KvCatalogStore::new(BrokenBackend);
        assert!(store.load().is_err());
        assert_eq!(store.read(), Catalog::seed());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvCatalogStore::open(dir.path());

        let catalog = Catalog::from_json_str(r#"["12.4", "12.3.1"]"#).unwrap();
        store.write(&catalog).unwrap();

        assert_eq!(texts(&store.read()), vec!["12.4", "12.3.1"]);
    }

    #[test]
    fn test_write_json_rejects_without_mutation() {
        let store = KvCatalogStore::new(MemoryBackend::new());
        store.write_json(r#"["12.3.1"]"#).unwrap();

        for payload in [r#"{"list": ["12.4"]}"#, "\"12.4\"", r#"["12.4", null]"#] {
            let err = store.write_json(payload).unwrap_err();
            assert!(err.is_validation());
        }

        assert_eq!(texts(&store.read()), vec!["12.3.1"]);
    }

    #[test]
    fn test_write_is_last_writer_wins() {
        let store = KvCatalogStore::new(MemoryBackend::new());
        store.write_json(r#"["12.3.1", "12.3"]"#).unwrap();
        store.write_json(r#"["9.7"]"#).unwrap();
        assert_eq!(texts(&store.read()), vec!["9.7"]);
    }

    #[test]
    fn test_write_surfaces_backend_error() {
        let store = KvCatalogStore::new(BrokenBackend);
        let err = store.write(&Catalog::seed()).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_remote_store_urls() {
        let store = RemoteCatalogStore::new(ApiClient::new().unwrap(), "https://live.example.dev/");
        assert_eq!(store.read_url(), "https://live.example.dev/api/get-versions");
        assert_eq!(store.write_url(), "https://live.example.dev/api/update-versions");
    }
}
