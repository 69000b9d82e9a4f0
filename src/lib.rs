//! # versions_db
//!
//! A content-addressed version store for individual files.
//!
//! Each snapshot of a file is hashed; its content is stored once per
//! distinct digest, and an append-only log records which digest each
//! version of each file refers to.
//!
//! ## Core Concepts
//!
//! - **Blobs**: Raw file content, stored once per digest
//! - **Version records**: Log entries binding a filename, a digest, a
//!   comment, and a per-file version number
//! - **Repository**: Orchestrates add/get/list, storing the blob before the
//!   record so the log never references missing content
//!
//! ## Example
//!
//! ```ignore
//! use versions_db::{Config, Repository};
//!
//! let repo = Repository::open_or_init(Config::new(".versions"))?;
//! let record = repo.add("report.txt", "first draft")?;
//! repo.get_to("report.txt", record.version, "report.v1.txt")?;
//! ```

pub mod config;
pub mod hasher;
pub mod log;
pub mod model;
pub mod store;

mod error;
mod lock;
mod repository;

pub use config::Config;
pub use error::{AddError, Error, GetError, ListError, LogError, Result, StoreError};
pub use hasher::{Blake3Hasher, ContentHasher};
pub use lock::RepoLock;
pub use log::{Records, VersionLog};
pub use model::{Digest, NewVersion, VersionRecord};
pub use repository::{Repository, VerifyReport};
pub use store::BlobStore;

/// Version log format version
pub const VERSION: u32 = 1;

/// Magic bytes for version log identification
pub const MAGIC: &[u8; 8] = b"VERSIONS";
