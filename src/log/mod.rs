//! Append-only version log
//!
//! File format:
//! ```text
//! [HEADER: 16 bytes]
//!   - magic: 8 bytes ("VERSIONS")
//!   - version: 4 bytes (u32 LE)
//!   - reserved: 4 bytes
//!
//! [FRAMES: variable]
//!   - len: 4 bytes (u32 LE)
//!   - len_check: 4 bytes (!len, u32 LE)
//!   - checksum: 32 bytes (BLAKE3 of payload)
//!   - payload: len bytes (bincode VersionRecord)
//! ```
//!
//! A frame is written with a single `write_all` and synced before the
//! append returns. Readers ignore a torn final frame, so they never observe
//! a half-written record. A frame whose length fields disagree is
//! corruption, reported to the caller and never truncated away.

mod frame;
mod version_log;

pub use version_log::{Records, VersionLog};
