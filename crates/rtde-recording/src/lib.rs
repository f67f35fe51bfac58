// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTDE Recording
//!
//! Record robot controller telemetry to disk, keeping only samples where the
//! robot actually moved:
//! - Delimited text (`.csv`, default), one column per vector component
//! - Binary `RTDEREC` files with raw payloads and CRC-checked records
//!
//! # Quick Start
//!
//! ```bash
//! # Record until Ctrl+C at 125 Hz
//! rtde-record --host 192.168.1.10
//!
//! # Record 5000 samples at 500 Hz without dropping any
//! rtde-record --host 192.168.1.10 --frequency 500 --samples 5000 --buffered
//!
//! # Binary output
//! rtde-record --host 192.168.1.10 --binary --output robot_data.rtde
//! ```
//!
//! # Format Comparison
//!
//! | Feature | .csv | .rtde |
//! |---------|------|-------|
//! | Human readable | [OK] | [X] |
//! | Exact values | [X] | [OK] |
//! | Record checksums | [X] | [OK] |
//! | Self-describing | header only | [OK] |

pub mod filter;
pub mod format;
pub mod progress;
pub mod recorder;
pub mod session;
pub mod source;

pub use filter::{is_significant, ChangeFilter, FilterError};
pub use format::{
    BinaryReader, BinaryWriter, CsvWriter, FormatError, OutputFormat, RecordingMetadata,
    RowWriter,
};
pub use progress::Progress;
pub use recorder::{
    Recorder, RecorderConfig, RecorderError, RecordingStats, SessionReport, Step, Termination,
};
pub use session::{start_recording, OutputConfig, StartupError};
pub use source::TelemetrySource;
