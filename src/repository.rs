//! High-level Repository API
//!
//! This module provides the main entry point for interacting with versions_db.

use crate::config::Config;
use crate::error::{AddError, GetError, ListError, StoreError};
use crate::hasher::{Blake3Hasher, ContentHasher};
use crate::lock::RepoLock;
use crate::log::VersionLog;
use crate::model::{Digest, NewVersion, VersionRecord};
use crate::store::BlobStore;
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file version repository
///
/// Combines a content-addressed blob store with an append-only version
/// log. Every digest named by the log has its blob stored first, so a
/// record never points at missing content unless the store was tampered
/// with from outside.
pub struct Repository {
    config: Config,
    blobs: BlobStore,
    log: VersionLog,
    hasher: Arc<dyn ContentHasher>,
}

/// Outcome of [`Repository::verify`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of records in the log
    pub records: usize,
    /// Number of blobs in the store
    pub blobs: usize,
    /// Records whose blob is absent
    pub missing: Vec<VersionRecord>,
    /// Blobs no record references; harmless leftovers of failed adds
    pub orphans: Vec<Digest>,
}

impl VerifyReport {
    /// Whether every record can be retrieved
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Repository {
    /// Create the repository layout if needed and open it
    pub fn init(config: Config) -> Result<Self> {
        std::fs::create_dir_all(config.blobs_dir())?;
        let repo = Self::from_config(config);
        repo.log.create_if_missing()?;
        tracing::info!(root = %repo.config.root.display(), "repository initialized");
        Ok(repo)
    }

    /// Open an existing repository
    pub fn open(config: Config) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(Error::NotARepository(config.root));
        }
        Ok(Self::from_config(config))
    }

    /// Open a repository, initializing it if the root does not exist
    pub fn open_or_init(config: Config) -> Result<Self> {
        if config.root.is_dir() {
            Self::open(config)
        } else {
            Self::init(config)
        }
    }

    fn from_config(config: Config) -> Self {
        Repository {
            blobs: BlobStore::new(config.blobs_dir()),
            log: VersionLog::new(config.log_path()),
            hasher: Arc::new(Blake3Hasher),
            config,
        }
    }

    /// Set the content hasher
    pub fn with_hasher(mut self, hasher: impl ContentHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn log(&self) -> &VersionLog {
        &self.log
    }

    /// Name of the digest algorithm blobs are keyed by
    pub fn hash_algorithm(&self) -> &str {
        self.hasher.algorithm()
    }

    // === Versioning Operations ===

    /// Record a new version of `filename`
    ///
    /// Runs under the repository lock. Content already recorded for this
    /// filename yields `AddError::AlreadyExists`. The blob is stored before
    /// the record is logged; if logging fails the blob stays behind as an
    /// orphan.
    pub fn add(&self, filename: &str, comment: &str) -> std::result::Result<VersionRecord, AddError> {
        let _lock = RepoLock::acquire(&self.config.lock_path()).map_err(AddError::LockFailed)?;

        let path = Path::new(filename);
        validate_file(filename, path)?;

        let digest = self
            .hasher
            .hash_file(path)
            .map_err(|source| AddError::HashFailed {
                path: filename.to_string(),
                source,
            })?;

        if let Some(existing) = self.log.find_by_content(filename, &digest)? {
            tracing::debug!(
                filename,
                version = existing.version,
                digest = %digest.short(),
                "content already recorded"
            );
            return Err(AddError::AlreadyExists(Box::new(existing)));
        }

        self.blobs.store(&digest, path)?;

        let record = self
            .log
            .append(NewVersion::new(filename, digest, comment))
            .map_err(|e| {
                tracing::warn!(digest = %digest.short(), "blob left unreferenced after failed append");
                AddError::LogFailed(e)
            })?;

        tracing::info!(
            filename,
            version = record.version,
            digest = %digest.short(),
            algorithm = self.hasher.algorithm(),
            "version recorded"
        );
        Ok(record)
    }

    /// Restore `version` of `filename` over the file itself
    pub fn get(&self, filename: &str, version: u32) -> std::result::Result<PathBuf, GetError> {
        self.get_to(filename, version, filename)
    }

    /// Write `version` of `filename` to `destination`
    pub fn get_to(
        &self,
        filename: &str,
        version: u32,
        destination: impl AsRef<Path>,
    ) -> std::result::Result<PathBuf, GetError> {
        let destination = destination.as_ref();
        let record = self
            .log
            .find_by_version(filename, version)?
            .ok_or_else(|| GetError::NotFound {
                filename: filename.to_string(),
                version,
            })?;

        match self.blobs.retrieve(&record.digest, destination) {
            Ok(()) => {
                tracing::info!(
                    filename,
                    version,
                    destination = %destination.display(),
                    "version restored"
                );
                Ok(destination.to_path_buf())
            }
            Err(StoreError::NotFound(digest)) => {
                tracing::error!(filename, version, digest = %digest, "logged blob is missing");
                Err(GetError::CorruptStore {
                    filename: filename.to_string(),
                    version,
                    digest,
                })
            }
            Err(e) => Err(GetError::RetrieveFailed(e)),
        }
    }

    /// Records of `filename` in append order, or of every file if `None`
    ///
    /// The sequence is read lazily; call again to start over.
    pub fn list(
        &self,
        filename: Option<&str>,
    ) -> std::result::Result<impl Iterator<Item = std::result::Result<VersionRecord, ListError>>, ListError>
    {
        let records = self.log.records(filename)?;
        Ok(records.map(|r| r.map_err(ListError::from)))
    }

    /// Check log and store against each other without changing either
    pub fn verify(&self) -> std::result::Result<VerifyReport, ListError> {
        let stored: HashSet<Digest> = self
            .blobs
            .digests()
            .map_err(ListError::StoreUnavailable)?
            .into_iter()
            .collect();

        let mut report = VerifyReport {
            blobs: stored.len(),
            ..VerifyReport::default()
        };
        let mut referenced = HashSet::new();

        for record in self.log.records(None)? {
            let record = record?;
            report.records += 1;
            if !stored.contains(&record.digest) {
                report.missing.push(record.clone());
            }
            referenced.insert(record.digest);
        }

        let mut orphans: Vec<Digest> = stored.difference(&referenced).copied().collect();
        orphans.sort();
        for digest in &orphans {
            tracing::warn!(digest = %digest.short(), "orphan blob");
        }
        report.orphans = orphans;
        Ok(report)
    }
}

fn validate_file(filename: &str, path: &Path) -> std::result::Result<(), AddError> {
    let invalid = |reason: String| AddError::InvalidFile {
        path: filename.to_string(),
        reason,
    };

    if filename.is_empty() {
        return Err(invalid("empty filename".into()));
    }
    let metadata = std::fs::metadata(path).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_file() {
        return Err(invalid("not a regular file".into()));
    }
    Ok(())
}
