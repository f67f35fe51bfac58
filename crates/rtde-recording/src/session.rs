// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session startup.
//!
//! The controller is configured and started before the output file is
//! created, so a rejected setup or start never truncates an earlier
//! recording. Every failure leaves the client disconnected.

use crate::format::{
    BinaryWriter, CsvWriter, FormatError, OutputFormat, RecordingMetadata, RowWriter,
};
use crate::format::csv::DEFAULT_DELIMITER;
use rtde::{Recipe, RtdeClient, RtdeError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output file settings.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Output file path.
    pub path: PathBuf,

    /// Output format.
    pub format: OutputFormat,

    /// CSV column delimiter.
    pub delimiter: char,
}

impl OutputConfig {
    /// Create an output config, detecting the format from the extension (CSV otherwise).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = OutputFormat::from_extension(&path).unwrap_or(OutputFormat::Csv);

        Self {
            path,
            format,
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Set output format.
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set CSV delimiter.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Create (truncate) the output file and write its header.
    pub fn open(
        &self,
        recipe: &Recipe,
        metadata: RecordingMetadata,
    ) -> Result<Box<dyn RowWriter>, FormatError> {
        let mut writer: Box<dyn RowWriter> = match self.format {
            OutputFormat::Binary => Box::new(BinaryWriter::create(&self.path, recipe, metadata)?),
            OutputFormat::Csv => {
                Box::new(CsvWriter::create(&self.path, recipe)?.with_delimiter(self.delimiter))
            }
        };
        writer.write_header()?;
        Ok(writer)
    }
}

/// Startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Unable to read controller version: {0}")]
    Version(#[source] RtdeError),

    #[error("Unable to configure output: {0}")]
    Setup(#[source] RtdeError),

    #[error("Unable to start synchronization: {0}")]
    Start(#[source] RtdeError),

    #[error("Unable to create output: {0}")]
    Output(#[source] FormatError),
}

/// Configure and start a connected client, then open the output.
///
/// Returns the writer with its header already written.
pub fn start_recording(
    client: &mut RtdeClient,
    recipe: &Recipe,
    frequency: u64,
    output: &OutputConfig,
) -> Result<Box<dyn RowWriter>, StartupError> {
    let version = client
        .get_controller_version()
        .map_err(|e| abort(client, StartupError::Version(e)))?;

    client
        .send_output_setup(recipe, frequency as f64)
        .map_err(|e| abort(client, StartupError::Setup(e)))?;

    client
        .send_start()
        .map_err(|e| abort(client, StartupError::Start(e)))?;

    let metadata = RecordingMetadata::new(recipe, client.config().host.as_str(), frequency as f64)
        .controller_version(version.to_string());
    match output.open(recipe, metadata) {
        Ok(writer) => {
            tracing::info!("Recording to {}", output.path.display());
            Ok(writer)
        }
        Err(e) => {
            if let Err(pause) = client.send_pause() {
                tracing::warn!("Unable to pause synchronization: {}", pause);
            }
            Err(abort(client, StartupError::Output(e)))
        }
    }
}

fn abort(client: &mut RtdeClient, err: StartupError) -> StartupError {
    tracing::error!("{}", err);
    client.disconnect();
    err
}
