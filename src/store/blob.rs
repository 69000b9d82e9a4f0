//! Directory-backed blob store

use crate::error::StoreError;
use crate::model::Digest;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix of in-flight temporary files inside the blob directory
const TEMP_PREFIX: &str = ".tmp-";

/// A content-addressed store backed by one file per digest
#[derive(Clone, Debug)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `dir`
    ///
    /// The directory is created on the first `store()` call if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        BlobStore { dir: dir.into() }
    }

    /// Get the blob directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a blob with this digest lives at
    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        self.dir.join(digest.to_hex())
    }

    /// Check if a blob exists without reading it
    pub fn exists(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    /// Copy the content of `source` into the store under `digest`
    ///
    /// Storing a digest that is already present is a no-op. On failure no
    /// partial blob is left behind.
    pub fn store(&self, digest: &Digest, source: &Path) -> Result<(), StoreError> {
        if self.exists(digest) {
            tracing::debug!(digest = %digest.short(), "blob already stored");
            return Ok(());
        }

        let write_failed = |source: io::Error| StoreError::WriteFailed {
            digest: *digest,
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_failed)?;

        // The temp file is removed on drop unless it is persisted
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(write_failed)?;
        let mut src = File::open(source).map_err(write_failed)?;
        io::copy(&mut src, tmp.as_file_mut()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;

        match tmp.persist_noclobber(self.path_for(digest)) {
            Ok(_) => {
                tracing::debug!(digest = %digest.short(), "blob stored");
                Ok(())
            }
            // Another writer got there first with the same content
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(write_failed(e.error)),
        }
    }

    /// Copy the blob for `digest` to `destination`
    ///
    /// The destination is replaced atomically; it is never left holding
    /// partial content.
    pub fn retrieve(&self, digest: &Digest, destination: &Path) -> Result<(), StoreError> {
        let read_failed = |source: io::Error| StoreError::ReadFailed {
            digest: *digest,
            source,
        };

        let mut blob = match File::open(self.path_for(digest)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*digest))
            }
            Err(e) => return Err(read_failed(e)),
        };

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent).map_err(read_failed)?;
        io::copy(&mut blob, tmp.as_file_mut()).map_err(read_failed)?;
        tmp.as_file().sync_all().map_err(read_failed)?;
        tmp.persist(destination)
            .map_err(|e| read_failed(e.error))?;

        Ok(())
    }

    /// List the digests of all stored blobs
    ///
    /// Entries that are not named by a valid digest (such as in-flight
    /// temporary files) are skipped.
    pub fn digests(&self) -> io::Result<Vec<Digest>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut digests = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(digest) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                digests.push(digest);
            }
        }
        digests.sort();
        Ok(digests)
    }

    /// Get the number of blobs in the store
    pub fn blob_count(&self) -> io::Result<usize> {
        Ok(self.digests()?.len())
    }
}
