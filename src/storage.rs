//! Access to the staging and destination object stores.
//!
//! The pipeline only ever moves whole files between a bucket/key pair and
//! the local scratch directory, so the `Storage` trait is limited to those
//! two operations.  Implementations are passed into the pipeline explicitly.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::common::s3;

/// Whole-file transfer between an object store and the local file system.
pub trait Storage {
    /// Copy the object at `bucket`/`key` to the local file `dst`.
    fn download(&self, bucket: &str, key: &str, dst: &Path) -> Result<(), anyhow::Error>;
    /// Copy the local file `src` to the object at `bucket`/`key`.
    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), anyhow::Error>;
}

/// Storage backed by the local file system; buckets are directories below `root`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_of(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

impl Storage for LocalStorage {
    fn download(&self, bucket: &str, key: &str, dst: &Path) -> Result<(), anyhow::Error> {
        let src = self.path_of(bucket, key);
        tracing::debug!("copying {:?} to {:?}", &src, dst);
        std::fs::copy(&src, dst)
            .map_err(|e| anyhow::anyhow!("could not copy {:?} to {:?}: {}", &src, dst, e))?;
        Ok(())
    }

    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), anyhow::Error> {
        let dst = self.path_of(bucket, key);
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("could not create {:?}: {}", parent, e))?;
        }
        tracing::debug!("copying {:?} to {:?}", src, &dst);
        std::fs::copy(src, &dst)
            .map_err(|e| anyhow::anyhow!("could not copy {:?} to {:?}: {}", src, &dst, e))?;
        Ok(())
    }
}

/// Storage backed by S3, configured from the environment.
pub struct S3Storage {
    runtime: tokio::runtime::Runtime,
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow::anyhow!("could not build tokio runtime: {}", e))?;
        let config = runtime.block_on(s3::config_from_env());
        let client = aws_sdk_s3::Client::from_conf(config);
        Ok(Self { runtime, client })
    }
}

impl Storage for S3Storage {
    fn download(&self, bucket: &str, key: &str, dst: &Path) -> Result<(), anyhow::Error> {
        self.runtime
            .block_on(s3::download_file(&self.client, bucket, key, dst))
    }

    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), anyhow::Error> {
        self.runtime
            .block_on(s3::upload_file(&self.client, src, bucket, key))
    }
}

/// In-memory storage, mostly useful for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStorage {
    /// Store `data` under `bucket`/`key`, replacing any previous object.
    pub fn put(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.lock()
            .insert((bucket.to_string(), key.to_string()), data);
    }

    /// Return a copy of the object at `bucket`/`key`, if any.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Vec<u8>>> {
        // A poisoned map is still consistent; every mutation is a single insert.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn download(&self, bucket: &str, key: &str, dst: &Path) -> Result<(), anyhow::Error> {
        let data = self
            .get(bucket, key)
            .ok_or_else(|| anyhow::anyhow!("no such object: {}/{}", bucket, key))?;
        std::fs::write(dst, data)
            .map_err(|e| anyhow::anyhow!("could not write {:?}: {}", dst, e))?;
        Ok(())
    }

    fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), anyhow::Error> {
        let data =
            std::fs::read(src).map_err(|e| anyhow::anyhow!("could not read {:?}: {}", src, e))?;
        self.put(bucket, key, data);
        Ok(())
    }
}

/// Select the storage implementation for this run.
///
/// S3 is used when `AWS_ACCESS_KEY_ID` is set, otherwise buckets are
/// directories below `local_root`.
pub fn from_env<P: AsRef<Path>>(local_root: P) -> Result<Box<dyn Storage>, anyhow::Error> {
    if s3::s3_mode() {
        tracing::info!("using S3 storage");
        Ok(Box::new(S3Storage::from_env()?))
    } else {
        tracing::info!("using local storage below {:?}", local_root.as_ref());
        Ok(Box::new(LocalStorage::new(local_root)))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{LocalStorage, MemoryStorage, Storage};

    #[test]
    fn local_roundtrip_creates_key_directories() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let src = tmp_dir.join("src.txt");
        std::fs::write(&src, b"hello")?;

        let storage = LocalStorage::new(tmp_dir.join("root"));
        storage.upload(&src, "bucket", "some/nested/key.txt")?;
        assert!(tmp_dir.join("root/bucket/some/nested/key.txt").exists());

        let dst = tmp_dir.join("dst.txt");
        storage.download("bucket", "some/nested/key.txt", &dst)?;
        assert_eq!(std::fs::read(&dst)?, b"hello".to_vec());

        Ok(())
    }

    #[test]
    fn local_download_missing_fails() {
        let tmp_dir = temp_testdir::TempDir::default();
        let storage = LocalStorage::new(&*tmp_dir);
        assert!(storage
            .download("bucket", "missing.vcf.gz", &tmp_dir.join("x"))
            .is_err());
    }

    #[test]
    fn memory_download_and_upload() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let storage = MemoryStorage::default();
        storage.put("in", "a.txt", b"abc".to_vec());

        let path = tmp_dir.join("a.txt");
        storage.download("in", "a.txt", &path)?;
        storage.upload(&path, "out", "b.txt")?;

        assert_eq!(storage.get("out", "b.txt"), Some(b"abc".to_vec()));
        assert!(storage.download("in", "missing", &path).is_err());

        Ok(())
    }
}
