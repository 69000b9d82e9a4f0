//! BLAKE3 content hasher

use super::ContentHasher;
use crate::model::Digest;
use std::io::{self, Read};

/// The default hasher: streaming BLAKE3
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn hash_reader(&self, reader: &mut dyn Read) -> io::Result<Digest> {
        let mut hasher = blake3::Hasher::new();
        io::copy(reader, &mut hasher)?;
        Ok(hasher.finalize().into())
    }

    fn algorithm(&self) -> &str {
        "blake3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_file_hash_matches_buffer_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"v1").unwrap();
        drop(file);

        let digest = Blake3Hasher.hash_file(&path).unwrap();
        assert_eq!(digest, Digest::digest(b"v1"));
    }

    #[test]
    fn test_hash_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = Blake3Hasher
            .hash_file(&dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_hash_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(Blake3Hasher.hash_file(dir.path()).is_err());
    }
}
