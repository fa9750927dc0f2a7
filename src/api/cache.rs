use async_std::fs;
use async_std::io;
use async_std::path::PathBuf;
use async_std::prelude::*;
use core::mem::size_of;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO failed: {0}")]
    Io(#[from] io::Error),
    #[error("Cached entry could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub enum CacheFile {
    Fresh(Vec<u8>),
    Expired(Vec<u8>),
    None,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum CacheExpiry {
    Never,
    AtUnixTimestamp(Duration),
}

fn now() -> Duration {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}

impl CacheExpiry {
    pub fn expire_in_seconds(seconds: u64) -> Self {
        Self::AtUnixTimestamp(now() + Duration::from_secs(seconds))
    }

    pub fn expire_in(ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Self::expire_in_seconds(ttl.as_secs()),
            None => Self::Never,
        }
    }

    fn is_expired(&self) -> bool {
        match self {
            Self::Never => false,
            Self::AtUnixTimestamp(ref timestamp) => &now() >= timestamp,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CacheManager {
    root: PathBuf,
}

impl CacheManager {
    /// Opens (and creates) a cache rooted at `root`, with one sub directory
    /// per entry in `dirs`.
    pub fn for_dir(root: &Path, dirs: &[&str]) -> Result<Self, CacheError> {
        for &dir in dirs.iter() {
            std::fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self {
            root: root.to_path_buf().into(),
        })
    }

    fn cache_path(&self, resource: &str) -> PathBuf {
        self.root.join(resource)
    }

    fn cache_meta_path(&self, resource: &str) -> PathBuf {
        let full = format!("{}.{}", resource, "expiry");
        self.root.join(&full)
    }
}

impl CacheManager {
    async fn read_expiry_file(&self, resource: &str) -> io::Result<CacheExpiry> {
        let expiry_file = self.cache_meta_path(resource);
        let buffer = fs::read(&expiry_file).await?;
        const OFFSET: usize = size_of::<u64>();

        if buffer.len() < OFFSET {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated expiry file",
            ));
        }

        let mut timestamp: [u8; OFFSET] = Default::default();
        timestamp.copy_from_slice(&buffer[..OFFSET]);
        let timestamp = Duration::from_secs(u64::from_be_bytes(timestamp));

        Ok(CacheExpiry::AtUnixTimestamp(timestamp))
    }

    pub async fn read_cache_file(&self, resource: &str) -> CacheFile {
        let path = self.cache_path(resource);
        let file = match fs::read(&path).await {
            Ok(buf) => buf,
            Err(_) => return CacheFile::None,
        };

        let expiry = match self.read_expiry_file(resource).await {
            Ok(expiry) => expiry,
            Err(e) if e.kind() == io::ErrorKind::NotFound => CacheExpiry::Never,
            Err(e) => {
                warn!("Unreadable expiry for {}: {}", resource, e);
                CacheExpiry::expire_in_seconds(0)
            }
        };

        if expiry.is_expired() {
            debug!("Expired: {}", resource);
            CacheFile::Expired(file)
        } else {
            CacheFile::Fresh(file)
        }
    }
}

impl CacheManager {
    async fn set_expiry_for_path(&self, path: &PathBuf, expiry: CacheExpiry) -> io::Result<()> {
        match expiry {
            CacheExpiry::AtUnixTimestamp(timestamp) => {
                fs::write(path, timestamp.as_secs().to_be_bytes()).await
            }
            CacheExpiry::Never => ignore_missing(fs::remove_file(path).await),
        }
    }

    pub async fn set_expired(&self, resource: &str) -> io::Result<()> {
        let meta_file = self.cache_meta_path(resource);
        self.set_expiry_for_path(&meta_file, CacheExpiry::expire_in_seconds(0))
            .await
    }

    pub async fn remove_cache_file(&self, resource: &str) -> io::Result<()> {
        ignore_missing(fs::remove_file(self.cache_path(resource)).await)?;
        ignore_missing(fs::remove_file(self.cache_meta_path(resource)).await)
    }

    pub async fn clear_cache_pattern(&self, dir: &str, regex: &Regex) -> io::Result<()> {
        let dir_path = self.cache_path(dir);

        let mut entries = fs::read_dir(dir_path).await?;
        while let Some(Ok(entry)) = entries.next().await {
            let matches = entry
                .file_name()
                .to_str()
                .map(|s| regex.is_match(s))
                .unwrap_or(false);
            if matches {
                fs::remove_file(entry.path()).await?;
            }
        }

        Ok(())
    }

    pub async fn write_cache_file(
        &self,
        resource: &str,
        content: &[u8],
        expiry: CacheExpiry,
    ) -> io::Result<()> {
        let file = self.cache_path(resource);
        fs::write(&file, content).await?;
        self.set_expiry_for_path(&self.cache_meta_path(resource), expiry)
            .await?;
        Ok(())
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl CacheManager {
    /// Reads a JSON entry. Expired entries are deleted and read as misses.
    pub async fn get_item<T>(&self, resource: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.read_cache_file(resource).await {
            CacheFile::Fresh(buf) => Ok(Some(serde_json::from_slice(&buf)?)),
            CacheFile::Expired(_) => {
                self.remove_cache_file(resource).await?;
                Ok(None)
            }
            CacheFile::None => Ok(None),
        }
    }

    pub async fn set_item<T>(
        &self,
        resource: &str,
        item: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let content = serde_json::to_vec(item)?;
        self.write_cache_file(resource, &content, CacheExpiry::expire_in(ttl))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {

    use super::*;
    use futures::executor::block_on;
    use serde_json::{json, Value};

    fn manager(dir: &tempfile::TempDir) -> CacheManager {
        CacheManager::for_dir(dir.path(), &["albums"]).unwrap()
    }

    #[test]
    fn test_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        manager(&dir);
        assert!(dir.path().join("albums").is_dir());
    }

    #[test]
    fn test_missing_item() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        let item: Option<Value> = block_on(cache.get_item("albums/nobody.json")).unwrap();
        assert_eq!(item, None);
    }

    #[test]
    fn test_item_without_ttl_never_expires() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        block_on(async {
            cache
                .set_item("albums/u.json", &json!({"albums": [1]}), None)
                .await
                .unwrap();
            let item: Option<Value> = cache.get_item("albums/u.json").await.unwrap();
            assert_eq!(item, Some(json!({"albums": [1]})));
        });
        assert!(!dir.path().join("albums/u.json.expiry").exists());
    }

    #[test]
    fn test_item_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        block_on(async {
            cache
                .set_item("albums/u.json", &json!([1, 2]), Some(Duration::from_secs(600)))
                .await
                .unwrap();
            let item: Option<Value> = cache.get_item("albums/u.json").await.unwrap();
            assert_eq!(item, Some(json!([1, 2])));
        });
    }

    #[test]
    fn test_expired_item_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        block_on(async {
            cache
                .set_item("albums/u.json", &json!([1]), Some(Duration::from_secs(600)))
                .await
                .unwrap();
            cache.set_expired("albums/u.json").await.unwrap();
            let item: Option<Value> = cache.get_item("albums/u.json").await.unwrap();
            assert_eq!(item, None);
        });
        assert!(!dir.path().join("albums/u.json").exists());
        assert!(!dir.path().join("albums/u.json.expiry").exists());
    }

    #[test]
    fn test_rewrite_without_ttl_drops_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        block_on(async {
            cache
                .set_item("albums/u.json", &json!(1), Some(Duration::from_secs(0)))
                .await
                .unwrap();
            cache.set_item("albums/u.json", &json!(2), None).await.unwrap();
            let item: Option<Value> = cache.get_item("albums/u.json").await.unwrap();
            assert_eq!(item, Some(json!(2)));
        });
    }

    #[test]
    fn test_clear_cache_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let cache = manager(&dir);
        let pattern = Regex::new(r"^a\.json(\.expiry)?$").unwrap();
        block_on(async {
            cache
                .set_item("albums/a.json", &json!(1), Some(Duration::from_secs(60)))
                .await
                .unwrap();
            cache.set_item("albums/b.json", &json!(2), None).await.unwrap();
            cache.clear_cache_pattern("albums", &pattern).await.unwrap();
        });
        assert!(!dir.path().join("albums/a.json").exists());
        assert!(!dir.path().join("albums/a.json.expiry").exists());
        assert!(dir.path().join("albums/b.json").exists());
    }
}
