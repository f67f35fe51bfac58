// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recording output formats.
//!
//! Supports:
//! - Delimited text (`.csv`, default)
//! - Binary (`RTDEREC`), raw payloads with a JSON metadata header

pub mod binary;
pub mod csv;

pub use binary::{BinaryReader, BinaryWriter, FORMAT_VERSION, MAGIC};
pub use csv::CsvWriter;

use rtde::{FieldType, Recipe, Sample};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Format errors.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("CRC mismatch in record {record}")]
    CrcMismatch { record: u64 },

    #[error("Sample has {got} fields, header declared {expected}")]
    RecipeMismatch { expected: usize, got: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] rtde::RtdeError),
}

/// Destination for accepted samples.
///
/// `write_header` is called once before any row. Rows must be written in call
/// order and each row must be emitted whole.
pub trait RowWriter {
    fn write_header(&mut self) -> Result<(), FormatError>;

    fn write_row(&mut self, sample: &Sample) -> Result<(), FormatError>;

    /// Push buffered rows to the underlying sink.
    fn flush(&mut self) -> Result<(), FormatError>;

    /// Rows written so far (header excluded).
    fn rows_written(&self) -> u64;
}

impl<W: RowWriter + ?Sized> RowWriter for Box<W> {
    fn write_header(&mut self) -> Result<(), FormatError> {
        (**self).write_header()
    }

    fn write_row(&mut self, sample: &Sample) -> Result<(), FormatError> {
        (**self).write_row(sample)
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        (**self).flush()
    }

    fn rows_written(&self) -> u64 {
        (**self).rows_written()
    }
}

impl<W: RowWriter + ?Sized> RowWriter for &mut W {
    fn write_header(&mut self) -> Result<(), FormatError> {
        (**self).write_header()
    }

    fn write_row(&mut self, sample: &Sample) -> Result<(), FormatError> {
        (**self).write_row(sample)
    }

    fn flush(&mut self) -> Result<(), FormatError> {
        (**self).flush()
    }

    fn rows_written(&self) -> u64 {
        (**self).rows_written()
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Delimited text with one header line.
    Csv,
    /// Binary records with JSON metadata.
    Binary,
}

impl OutputFormat {
    /// Detect format from file extension.
    pub fn from_extension(path: &std::path::Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") | Some("txt") => Some(Self::Csv),
            Some("rtde") | Some("bin") => Some(Self::Binary),
            _ => None,
        }
    }
}

/// Recording metadata (stored in the binary header).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// Recording start time (RFC 3339).
    pub start_time: String,

    /// Controller host.
    pub host: String,

    /// Controller software version, if queried.
    pub controller_version: Option<String>,

    /// Requested sampling frequency in Hz.
    pub frequency: f64,

    /// Recipe fields in order.
    pub fields: Vec<FieldInfo>,

    /// Recorder version.
    pub recorder_version: String,
}

/// One recipe field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl RecordingMetadata {
    pub fn new(recipe: &Recipe, host: impl Into<String>, frequency: f64) -> Self {
        Self {
            start_time: chrono::Utc::now().to_rfc3339(),
            host: host.into(),
            controller_version: None,
            frequency,
            fields: recipe
                .fields()
                .map(|(name, ty)| FieldInfo {
                    name: name.to_string(),
                    type_name: ty.name().to_string(),
                })
                .collect(),
            recorder_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn controller_version(mut self, version: impl Into<String>) -> Self {
        self.controller_version = Some(version.into());
        self
    }

    /// Rebuild the recipe described by the field list.
    pub fn recipe(&self) -> Result<Recipe, FormatError> {
        let fields = self
            .fields
            .iter()
            .map(|f| Ok((f.name.clone(), f.type_name.parse::<FieldType>()?)))
            .collect::<Result<Vec<_>, FormatError>>()?;
        Ok(Recipe::new(fields))
    }
}
