//! Content-addressed blob store
//!
//! Blobs are stored as plain files named by the hex digest of their
//! content. Writes go through a temporary file that is renamed into place,
//! so a blob is either fully present or absent.

mod blob;

pub use blob::BlobStore;
