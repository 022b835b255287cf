//! API key extraction from running containers, with an on-disk cache.
//!
//! Keys are scraped from `/config/config.xml` inside the container, which is
//! slow, so results are cached next to the state document in
//! `.arr-sync-cache.yml`. Every read-modify-write of the cache holds an
//! exclusive lock on `.arr-sync-cache.lock` and replaces the file atomically,
//! so concurrent runs against the same directory cannot lose entries.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;
use crate::runner;

/// Cache file name, relative to the state document's directory
pub const CACHE_FILE: &str = ".arr-sync-cache.yml";

/// Lock file guarding the cache
pub const LOCK_FILE: &str = ".arr-sync-cache.lock";

/// Timeout for `docker exec`
pub const EXTRACT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads an API key out of a running container
pub trait KeyExtractor {
    fn extract(&self, container: &str) -> Result<String>;
}

/// Key-value store for extracted keys, keyed by container
pub trait KeyStore {
    fn get(&self, container: &str) -> Result<Option<String>>;
    fn put(&self, container: &str, key: &str) -> Result<()>;
    /// Remove a cached key; returns whether one was present
    fn invalidate(&self, container: &str) -> Result<bool>;
}

// ============================================================================
// Extraction
// ============================================================================

/// Pull the `<ApiKey>` element out of an *arr `config.xml`
pub fn parse_api_key(config_xml: &str) -> Option<String> {
    let re = Regex::new(r"<ApiKey>([^<]+)</ApiKey>").ok()?;
    re.captures(config_xml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Extracts keys with `docker exec <container> cat /config/config.xml`
#[derive(Debug, Clone)]
pub struct DockerExtractor {
    timeout: Duration,
}

impl Default for DockerExtractor {
    fn default() -> Self {
        Self {
            timeout: EXTRACT_TIMEOUT,
        }
    }
}

impl KeyExtractor for DockerExtractor {
    fn extract(&self, container: &str) -> Result<String> {
        log::info!("Extracting API key from container '{container}'");
        let xml = runner::run_capture_timeout(
            "docker",
            &["exec", container, "cat", "/config/config.xml"],
            self.timeout,
        )
        .map_err(|e| {
            let not_found = e
                .root_cause()
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
            if not_found {
                anyhow::anyhow!("Docker CLI not found. Is Docker installed?")
            } else if e.to_string().starts_with("Timed out") {
                anyhow::anyhow!("Timed out reading config.xml from container '{container}'")
            } else {
                e.context(format!(
                    "Failed to read config.xml from container '{container}'"
                ))
            }
        })?;

        parse_api_key(&xml).with_context(|| {
            format!("No <ApiKey> element found in config.xml from container '{container}'")
        })
    }
}

// ============================================================================
// File-backed store
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    api_keys: BTreeMap<String, String>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_yaml::Value>,
}

/// Key cache persisted as YAML in a directory
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    /// Exclusive lock held until the returned file is dropped
    fn lock(&self) -> Result<File> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;
        file.lock()
            .with_context(|| format!("Failed to lock {}", path.display()))?;
        Ok(file)
    }

    fn read(&self) -> Result<CacheFile> {
        let path = self.path();
        if !path.exists() {
            return Ok(CacheFile::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read key cache: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(CacheFile::default());
        }
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse key cache: {}", path.display()))
    }

    fn write(&self, cache: &CacheFile) -> Result<()> {
        let yaml = serde_yaml::to_string(cache)?;
        paths::write_atomic(&self.path(), yaml.as_bytes())
    }

    fn update<T>(&self, f: impl FnOnce(&mut CacheFile) -> T) -> Result<T> {
        let _guard = self.lock()?;
        let mut cache = self.read()?;
        let out = f(&mut cache);
        self.write(&cache)?;
        Ok(out)
    }
}

impl KeyStore for FileKeyStore {
    fn get(&self, container: &str) -> Result<Option<String>> {
        let _guard = self.lock()?;
        Ok(self
            .read()?
            .api_keys
            .get(container)
            .filter(|k| !k.is_empty())
            .cloned())
    }

    fn put(&self, container: &str, key: &str) -> Result<()> {
        self.update(|cache| {
            cache
                .api_keys
                .insert(container.to_string(), key.to_string());
        })
    }

    fn invalidate(&self, container: &str) -> Result<bool> {
        self.update(|cache| cache.api_keys.remove(container).is_some())
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Cache-first key lookup
pub struct KeyResolver<'a> {
    store: &'a dyn KeyStore,
    extractor: &'a dyn KeyExtractor,
}

impl<'a> KeyResolver<'a> {
    pub fn new(store: &'a dyn KeyStore, extractor: &'a dyn KeyExtractor) -> Self {
        Self { store, extractor }
    }

    /// Cached key for `container`, extracting and caching it on a miss
    pub fn resolve(&self, container: &str) -> Result<String> {
        if let Some(key) = self.store.get(container)? {
            log::debug!("Using cached API key for '{container}'");
            return Ok(key);
        }
        let key = self.extractor.extract(container)?;
        self.store.put(container, &key)?;
        Ok(key)
    }

    pub fn invalidate(&self, container: &str) -> Result<bool> {
        self.store.invalidate(container)
    }
}

/// Store for the state document at `config_path`
pub fn store_for(config_path: &Path) -> FileKeyStore {
    FileKeyStore::new(paths::parent_dir(config_path))
}
