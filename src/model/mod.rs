//! Core data model types for versions_db

mod digest;
mod record;

pub use digest::{Digest, DIGEST_LEN};
pub use record::{NewVersion, VersionRecord};
