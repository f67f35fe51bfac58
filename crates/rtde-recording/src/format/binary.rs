// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary recording format.
//!
//! # Layout
//!
//! ```text
//! +---------------------------------------------------------+
//! | Magic (8) | Version (4) | MetaSize (4)                  |
//! +---------------------------------------------------------+
//! | Metadata (JSON, MetaSize bytes)                         |
//! +---------------------------------------------------------+
//! | Record 0: PayloadLen (4) | Payload | CRC32 (4)          |
//! | Record 1: ...                                           |
//! +---------------------------------------------------------+
//! ```
//!
//! Header integers and record framing are little-endian. Payloads are stored
//! exactly as received from the controller (big-endian, recipe order), so the
//! file can be decoded with the recipe stored in the metadata.

use super::{FormatError, RecordingMetadata, RowWriter};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rtde::{Recipe, Sample};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Magic bytes: "RTDEREC\0"
pub const MAGIC: [u8; 8] = [0x52, 0x54, 0x44, 0x45, 0x52, 0x45, 0x43, 0x00];

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Binary row writer.
pub struct BinaryWriter<W: Write> {
    writer: W,
    metadata: RecordingMetadata,
    payload_len: usize,
    record: Vec<u8>,
    rows: u64,
}

impl BinaryWriter<BufWriter<File>> {
    /// Create (truncate) a binary recording.
    pub fn create<P: AsRef<Path>>(
        path: P,
        recipe: &Recipe,
        metadata: RecordingMetadata,
    ) -> Result<Self, FormatError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), recipe, metadata))
    }
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(writer: W, recipe: &Recipe, metadata: RecordingMetadata) -> Self {
        let payload_len = recipe.payload_len();
        Self {
            writer,
            metadata,
            payload_len,
            record: Vec::with_capacity(payload_len + 8),
            rows: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowWriter for BinaryWriter<W> {
    fn write_header(&mut self) -> Result<(), FormatError> {
        let metadata_json = serde_json::to_vec(&self.metadata)?;
        self.writer.write_all(&MAGIC)?;
        self.writer.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        self.writer
            .write_u32::<LittleEndian>(metadata_json.len() as u32)?;
        self.writer.write_all(&metadata_json)?;
        Ok(())
    }

    fn write_row(&mut self, sample: &Sample) -> Result<(), FormatError> {
        let payload = sample.payload();
        if payload.len() != self.payload_len {
            return Err(FormatError::InvalidFormat(format!(
                "payload is {} bytes, recipe expects {}",
                payload.len(),
                self.payload_len
            )));
        }

        self.record.clear();
        self.record.write_u32::<LittleEndian>(payload.len() as u32)?;
        self.record.extend_from_slice(payload);
        self.record
            .write_u32::<LittleEndian>(crc32fast::hash(payload))?;

        self.writer.write_all(&self.record)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        self.writer.flush()?;
        Ok(())
    }

    fn rows_written(&self) -> u64 {
        self.rows
    }
}

/// Binary recording reader.
pub struct BinaryReader<R: Read> {
    reader: R,
    metadata: RecordingMetadata,
    recipe: Arc<Recipe>,
    records_read: u64,
    truncated: bool,
}

impl BinaryReader<BufReader<File>> {
    /// Open a binary recording.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> BinaryReader<R> {
    /// Validate the header and load the metadata.
    pub fn new(mut reader: R) -> Result<Self, FormatError> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(FormatError::InvalidFormat(
                "Invalid RTDE recording magic".into(),
            ));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(FormatError::VersionMismatch {
                expected: FORMAT_VERSION,
                got: version,
            });
        }

        let metadata_size = reader.read_u32::<LittleEndian>()? as usize;
        let mut metadata_json = vec![0u8; metadata_size];
        reader.read_exact(&mut metadata_json)?;
        let metadata: RecordingMetadata = serde_json::from_slice(&metadata_json)?;
        let recipe = Arc::new(metadata.recipe()?);

        Ok(Self {
            reader,
            metadata,
            recipe,
            records_read: 0,
            truncated: false,
        })
    }

    pub fn metadata(&self) -> &RecordingMetadata {
        &self.metadata
    }

    pub fn recipe(&self) -> &Arc<Recipe> {
        &self.recipe
    }

    /// Whether the last record was cut short (recording interrupted mid-write).
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Read the next sample.
    ///
    /// Returns `Ok(None)` at end of file, including when the final record is
    /// incomplete. A length prefix that does not match the recipe is an error.
    pub fn next_sample(&mut self) -> Result<Option<Sample>, FormatError> {
        let len = match self.reader.read_u32::<LittleEndian>() {
            Ok(len) => len as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if len != self.recipe.payload_len() {
            return Err(FormatError::InvalidFormat(format!(
                "record {} declares {} bytes, recipe expects {}",
                self.records_read,
                len,
                self.recipe.payload_len()
            )));
        }

        let mut payload = vec![0u8; len];
        let crc = match self
            .reader
            .read_exact(&mut payload)
            .and_then(|_| self.reader.read_u32::<LittleEndian>())
        {
            Ok(crc) => crc,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.truncated = true;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if crc32fast::hash(&payload) != crc {
            return Err(FormatError::CrcMismatch {
                record: self.records_read,
            });
        }

        self.records_read += 1;
        let sample = Sample::decode(Arc::clone(&self.recipe), payload)?;
        Ok(Some(sample))
    }
}

impl<R: Read> Iterator for BinaryReader<R> {
    type Item = Result<Sample, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sample().transpose()
    }
}
