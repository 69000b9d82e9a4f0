//! Pluggable content hashing

mod blake;
mod traits;

pub use blake::Blake3Hasher;
pub use traits::ContentHasher;
