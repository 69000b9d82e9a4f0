//! Frame codec for version log records

use crate::error::LogError;
use crate::model::{Digest, VersionRecord, DIGEST_LEN};
use crate::{MAGIC, VERSION};
use std::io::{self, Read};

pub const HEADER_SIZE: u64 = 16;

/// Length prefix, its complement, and the payload checksum
pub const FRAME_HEADER_SIZE: u64 = 4 + 4 + DIGEST_LEN as u64;

/// Upper bound on a single encoded record
pub const MAX_PAYLOAD: u32 = 16 * 1024 * 1024;

/// Encode the file header
pub fn encode_header() -> [u8; HEADER_SIZE as usize] {
    let mut header = [0u8; HEADER_SIZE as usize];
    header[0..8].copy_from_slice(MAGIC);
    header[8..12].copy_from_slice(&VERSION.to_le_bytes());
    header
}

/// Validate a file header
pub fn check_header(header: &[u8; HEADER_SIZE as usize]) -> Result<(), LogError> {
    if &header[0..8] != MAGIC {
        return Err(LogError::Corrupt("invalid magic bytes".into()));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&header[8..12]);
    let found = u32::from_le_bytes(version);
    if found != VERSION {
        return Err(LogError::VersionMismatch {
            expected: VERSION,
            found,
        });
    }
    Ok(())
}

/// Encode a record into a complete frame
pub fn encode(record: &VersionRecord) -> Result<Vec<u8>, LogError> {
    let payload = bincode::serialize(record)?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD)
        .ok_or(LogError::TooLarge(payload.len()))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE as usize + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&(!len).to_le_bytes());
    frame.extend_from_slice(Digest::digest(&payload).as_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Outcome of reading one frame
pub enum Frame {
    /// A complete, verified record and its encoded size
    Record(VersionRecord, u64),
    /// An incomplete or unverifiable final frame
    Torn,
}

/// Read the frame starting at the reader's position
///
/// `remaining` is the number of bytes left before the scan's end offset.
pub fn read<R: Read>(reader: &mut R, remaining: u64) -> Result<Frame, LogError> {
    if remaining < FRAME_HEADER_SIZE {
        return Ok(Frame::Torn);
    }

    let mut head = [0u8; FRAME_HEADER_SIZE as usize];
    reader.read_exact(&mut head).map_err(LogError::ReadFailed)?;

    let mut len = [0u8; 4];
    len.copy_from_slice(&head[0..4]);
    let len = u32::from_le_bytes(len);
    let mut len_check = [0u8; 4];
    len_check.copy_from_slice(&head[4..8]);

    // A damaged length must never pass for a torn tail
    if u32::from_le_bytes(len_check) != !len {
        return Err(LogError::Corrupt("frame length check failed".into()));
    }
    if len > MAX_PAYLOAD {
        return Err(LogError::Corrupt(format!("frame length {} out of range", len)));
    }

    let frame_size = FRAME_HEADER_SIZE + len as u64;
    if frame_size > remaining {
        return Ok(Frame::Torn);
    }

    let mut checksum = [0u8; DIGEST_LEN];
    checksum.copy_from_slice(&head[8..]);

    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => LogError::Corrupt("log shrank during read".into()),
            _ => LogError::ReadFailed(e),
        })?;

    if Digest::digest(&payload) != Digest::from_bytes(checksum) {
        if frame_size == remaining {
            return Ok(Frame::Torn);
        }
        return Err(LogError::Corrupt("checksum mismatch".into()));
    }

    let record = bincode::deserialize(&payload)?;
    Ok(Frame::Record(record, frame_size))
}
