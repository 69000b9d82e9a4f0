//! Version log backed by a single append-only file

use super::frame::{self, Frame, FRAME_HEADER_SIZE, HEADER_SIZE, MAX_PAYLOAD};
use crate::error::LogError;
use crate::model::{Digest, NewVersion, VersionRecord};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Ordered, durable record of every version ever added
#[derive(Clone, Debug)]
pub struct VersionLog {
    path: PathBuf,
}

/// State of the log as seen by the last complete frame
struct Tail {
    /// Offset just past the last valid frame (0 if there is no header)
    valid_end: u64,
    last_sequence: u64,
    versions: u32,
}

impl VersionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        VersionLog { path: path.into() }
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header if the log does not exist yet
    pub fn create_if_missing(&self) -> Result<(), LogError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                file.write_all(&frame::encode_header())
                    .and_then(|_| file.sync_all())
                    .map_err(LogError::WriteFailed)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(LogError::WriteFailed(e)),
        }
    }

    /// Scan records in append order, optionally only those of `filename`
    ///
    /// The scan is lazy and ends at the log length observed when it
    /// started. Call again to restart from the beginning.
    pub fn records(&self, filename: Option<&str>) -> Result<Records, LogError> {
        let filter = filename.map(str::to_string);

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Records::empty(filter)),
            Err(e) => return Err(LogError::ReadFailed(e)),
        };
        let end = file.metadata().map_err(LogError::ReadFailed)?.len();
        let mut reader = BufReader::new(file);

        // A header shorter than its fixed size can only be a torn creation
        if end < HEADER_SIZE {
            return Ok(Records {
                reader: None,
                filter,
                pos: 0,
                end,
                done: true,
            });
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        reader
            .read_exact(&mut header)
            .map_err(LogError::ReadFailed)?;
        frame::check_header(&header)?;

        Ok(Records {
            reader: Some(reader),
            filter,
            pos: HEADER_SIZE,
            end,
            done: false,
        })
    }

    /// Find the record for this exact (filename, digest) pair
    pub fn find_by_content(
        &self,
        filename: &str,
        digest: &Digest,
    ) -> Result<Option<VersionRecord>, LogError> {
        for record in self.records(Some(filename))? {
            let record = record?;
            if record.digest == *digest {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Resolve the 1-based `version` of `filename` to its record
    pub fn find_by_version(
        &self,
        filename: &str,
        version: u32,
    ) -> Result<Option<VersionRecord>, LogError> {
        for record in self.records(Some(filename))? {
            let record = record?;
            if record.version == version {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Append a record, assigning its sequence and version numbers
    ///
    /// The record is flushed to disk before this returns. On failure the
    /// log is cut back to its previous end, so no partial frame remains.
    pub fn append(&self, entry: NewVersion) -> Result<VersionRecord, LogError> {
        let tail = self.tail(&entry.filename)?;
        let record = entry.into_record(tail.last_sequence + 1, tail.versions + 1);

        let mut buf = Vec::new();
        if tail.valid_end == 0 {
            buf.extend_from_slice(&frame::encode_header());
        }
        buf.extend(frame::encode(&record)?);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(LogError::WriteFailed)?;

        let len = file.metadata().map_err(LogError::WriteFailed)?.len();
        let excess = len.saturating_sub(tail.valid_end);
        // Anything longer than one frame is not a crashed append; leave it be
        if excess > max_torn_tail(tail.valid_end) {
            return Err(LogError::Corrupt(format!(
                "{} unreadable bytes after offset {}",
                excess, tail.valid_end
            )));
        }
        if excess > 0 {
            tracing::warn!(
                log = %self.path.display(),
                discarded = excess,
                "discarding torn tail of version log"
            );
            file.set_len(tail.valid_end)
                .map_err(LogError::WriteFailed)?;
        }

        let written = file
            .seek(SeekFrom::Start(tail.valid_end))
            .and_then(|_| file.write_all(&buf))
            .and_then(|_| file.sync_data());
        if let Err(e) = written {
            // Best effort: readers skip a torn tail anyway
            let _ = file.set_len(tail.valid_end);
            return Err(LogError::WriteFailed(e));
        }

        Ok(record)
    }

    /// Count records, in total
    pub fn len(&self) -> Result<usize, LogError> {
        let mut count = 0;
        for record in self.records(None)? {
            record?;
            count += 1;
        }
        Ok(count)
    }

    /// Check whether the log holds no records
    pub fn is_empty(&self) -> Result<bool, LogError> {
        Ok(self.len()? == 0)
    }

    fn tail(&self, filename: &str) -> Result<Tail, LogError> {
        let mut records = self.records(None)?;
        let mut last_sequence = 0;
        let mut versions = 0;

        for record in records.by_ref() {
            let record = record?;
            last_sequence = record.sequence;
            if record.filename == filename {
                versions += 1;
            }
        }

        Ok(Tail {
            valid_end: records.valid_end(),
            last_sequence,
            versions,
        })
    }
}

/// Most bytes a single interrupted append can leave behind
fn max_torn_tail(valid_end: u64) -> u64 {
    let frame = FRAME_HEADER_SIZE + MAX_PAYLOAD as u64;
    if valid_end == 0 {
        HEADER_SIZE + frame
    } else {
        frame
    }
}

/// A lazy, finite scan over version records
pub struct Records {
    reader: Option<BufReader<File>>,
    filter: Option<String>,
    pos: u64,
    end: u64,
    done: bool,
}

impl Records {
    fn empty(filter: Option<String>) -> Self {
        Records {
            reader: None,
            filter,
            pos: 0,
            end: 0,
            done: true,
        }
    }

    /// Offset just past the last complete frame read so far
    pub fn valid_end(&self) -> u64 {
        self.pos
    }

    /// True once the scan stopped at an incomplete final frame
    pub fn torn_tail(&self) -> bool {
        self.done && self.pos < self.end
    }

    fn next_record(&mut self) -> Result<Option<VersionRecord>, LogError> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };
        if self.pos >= self.end {
            return Ok(None);
        }

        match frame::read(reader, self.end - self.pos)? {
            Frame::Record(record, size) => {
                self.pos += size;
                Ok(Some(record))
            }
            Frame::Torn => Ok(None),
        }
    }
}

impl Iterator for Records {
    type Item = Result<VersionRecord, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.next_record() {
                Ok(Some(record)) => {
                    let wanted = match &self.filter {
                        Some(name) => record.filename == *name,
                        None => true,
                    };
                    if wanted {
                        return Some(Ok(record));
                    }
                }
                Ok(None) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
