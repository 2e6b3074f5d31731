//! On-disk blob store for document content
//!
//! Each blob lives in a flat directory under the data dir, named by its
//! document id. Ids are server-generated UUIDs, so keys never contain path
//! separators.

use crate::store::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

/// Flat-file store holding document content bytes
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create (or reopen) the blob directory under `data_dir`
    pub fn new(data_dir: &Path) -> StoreResult<Self> {
        let root = data_dir.join("blobs");
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Write blob content, replacing any previous bytes
    pub fn put(&self, id: &str, bytes: &[u8]) -> StoreResult<()> {
        std::fs::write(self.blob_path(id), bytes)?;
        Ok(())
    }

    /// Read blob content
    pub fn get(&self, id: &str) -> StoreResult<Vec<u8>> {
        match std::fs::read(self.blob_path(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("blob {id}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove blob content; a missing blob is not an error
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.blob_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Directory holding the blobs
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_put_get_delete() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();

        blobs.put("doc-1", b"hello").unwrap();
        assert_eq!(blobs.get("doc-1").unwrap(), b"hello");

        blobs.delete("doc-1").unwrap();
        assert!(matches!(
            blobs.get("doc-1").unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();
        blobs.delete("never-existed").unwrap();
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();
        blobs.put("doc-1", b"old").unwrap();
        blobs.put("doc-1", b"new").unwrap();
        assert_eq!(blobs.get("doc-1").unwrap(), b"new");
    }
}
