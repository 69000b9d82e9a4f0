//! Content hasher trait definition

use crate::model::Digest;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Trait for computing the digest of file content
///
/// Implementations must be deterministic: identical bytes always produce
/// the same digest. Collisions are assumed not to happen.
pub trait ContentHasher: Send + Sync {
    /// Digest everything the reader yields
    fn hash_reader(&self, reader: &mut dyn Read) -> io::Result<Digest>;

    /// Digest the full content of a regular file
    ///
    /// Default implementation streams the file through `hash_reader()`
    fn hash_file(&self, path: &Path) -> io::Result<Digest> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let mut reader = BufReader::new(File::open(path)?);
        self.hash_reader(&mut reader)
    }

    /// Get the algorithm name
    fn algorithm(&self) -> &str;
}
