//! Error types for versions_db
//!
//! Each repository operation has its own error enum so callers can match on
//! the outcome without guessing. Every variant maps to a stable `code()`.

use crate::model::{Digest, VersionRecord};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repository-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from opening, initializing, or configuring a repository
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a repository: {0}")]
    NotARepository(PathBuf),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Add(#[from] AddError),

    #[error(transparent)]
    Get(#[from] GetError),

    #[error(transparent)]
    List(#[from] ListError),
}

/// Errors from the blob store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write blob {digest}: {source}")]
    WriteFailed {
        digest: Digest,
        #[source]
        source: std::io::Error,
    },

    #[error("Blob not found: {0}")]
    NotFound(Digest),

    #[error("Failed to read blob {digest}: {source}")]
    ReadFailed {
        digest: Digest,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the version log
#[derive(Error, Debug)]
pub enum LogError {
    #[error("Failed to append to version log: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to read version log: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Version log corrupted: {0}")]
    Corrupt(String),

    #[error("Version log format mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Record too large: {0} bytes")]
    TooLarge(usize),

    #[error("Record encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Errors from `Repository::add`
#[derive(Error, Debug)]
pub enum AddError {
    #[error("Invalid file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("Failed to hash {path}: {source}")]
    HashFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Version already exists: {} version {}", .0.filename, .0.version)]
    AlreadyExists(Box<VersionRecord>),

    #[error(transparent)]
    StoreFailed(#[from] StoreError),

    #[error(transparent)]
    LogFailed(#[from] LogError),

    #[error("Failed to lock repository: {0}")]
    LockFailed(#[source] std::io::Error),
}

impl AddError {
    pub fn code(&self) -> &'static str {
        match self {
            AddError::InvalidFile { .. } => "invalid_file",
            AddError::HashFailed { .. } => "hash_failed",
            AddError::AlreadyExists(_) => "already_exists",
            AddError::StoreFailed(_) => "store_failed",
            AddError::LogFailed(_) => "log_failed",
            AddError::LockFailed(_) => "lock_failed",
        }
    }
}

/// Errors from `Repository::get`
#[derive(Error, Debug)]
pub enum GetError {
    #[error("Version not found: {filename} version {version}")]
    NotFound { filename: String, version: u32 },

    #[error("Corrupt store: {filename} version {version} references missing blob {digest}")]
    CorruptStore {
        filename: String,
        version: u32,
        digest: Digest,
    },

    #[error(transparent)]
    LogUnavailable(#[from] LogError),

    #[error(transparent)]
    RetrieveFailed(StoreError),
}

impl GetError {
    pub fn code(&self) -> &'static str {
        match self {
            GetError::NotFound { .. } => "not_found",
            GetError::CorruptStore { .. } => "corrupt_store",
            GetError::LogUnavailable(_) => "log_unavailable",
            GetError::RetrieveFailed(_) => "retrieve_failed",
        }
    }
}

/// Errors from `Repository::list` and `Repository::verify`
#[derive(Error, Debug)]
pub enum ListError {
    #[error(transparent)]
    LogUnavailable(#[from] LogError),

    #[error("Failed to read blob store: {0}")]
    StoreUnavailable(#[source] std::io::Error),
}

impl ListError {
    pub fn code(&self) -> &'static str {
        match self {
            ListError::LogUnavailable(_) => "log_unavailable",
            ListError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl Error {
    /// Stable kind of the failure, for tooling built on top of the CLI
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::NotARepository(_) => "not_a_repository",
            Error::Config(_) => "config",
            Error::Log(_) => "log_unavailable",
            Error::Add(e) => e.code(),
            Error::Get(e) => e.code(),
            Error::List(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let io = || std::io::Error::from(std::io::ErrorKind::Other);
        let digest = Digest::digest(b"x");
        let codes = [
            AddError::InvalidFile {
                path: "a".into(),
                reason: "missing".into(),
            }
            .code(),
            AddError::HashFailed {
                path: "a".into(),
                source: io(),
            }
            .code(),
            AddError::StoreFailed(StoreError::NotFound(digest)).code(),
            AddError::LogFailed(LogError::Corrupt("x".into())).code(),
            AddError::LockFailed(io()).code(),
            GetError::NotFound {
                filename: "a".into(),
                version: 1,
            }
            .code(),
            GetError::CorruptStore {
                filename: "a".into(),
                version: 1,
                digest,
            }
            .code(),
            GetError::LogUnavailable(LogError::ReadFailed(io())).code(),
            GetError::RetrieveFailed(StoreError::NotFound(digest)).code(),
            ListError::StoreUnavailable(io()).code(),
        ];

        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_crate_error_forwards_code() {
        let err: Error = GetError::NotFound {
            filename: "a".into(),
            version: 2,
        }
        .into();
        assert_eq!(err.code(), "not_found");
        assert!(err.to_string().contains("version 2"));
    }
}
