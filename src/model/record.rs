//! Version record - one entry of the version log

use super::Digest;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A recorded snapshot of a file
///
/// Records are created only by a successful add and are never changed
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Repository-wide position in the log, starting at 1
    pub sequence: u64,

    /// 1-based ordinal among the records of `filename`
    pub version: u32,

    /// Logical name of the versioned file
    pub filename: String,

    /// Digest of the snapshot content
    pub digest: Digest,

    /// Free-form description, may be empty
    pub comment: String,

    /// Timestamp (unix millis)
    pub timestamp: u64,
}

/// The caller-supplied part of a record; the log assigns the rest
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub filename: String,
    pub digest: Digest,
    pub comment: String,
}

impl NewVersion {
    pub fn new(filename: impl Into<String>, digest: Digest, comment: impl Into<String>) -> Self {
        NewVersion {
            filename: filename.into(),
            digest,
            comment: comment.into(),
        }
    }

    /// Complete the record with the numbering assigned at append time
    pub(crate) fn into_record(self, sequence: u64, version: u32) -> VersionRecord {
        VersionRecord {
            sequence,
            version,
            filename: self.filename,
            digest: self.digest,
            comment: self.comment,
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
