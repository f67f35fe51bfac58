// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Telemetry recorder.
//!
//! Pulls samples from a started [`TelemetrySource`], keeps the ones whose
//! tracked field moved, and writes them in arrival order. A session ends when
//! the target count is reached, when the stop flag is raised, or on the first
//! transport or output error. Whatever the reason, the source is paused and
//! disconnected once and the output is flushed.

use crate::filter::{ChangeFilter, FilterError, DEFAULT_THRESHOLD, DEFAULT_TRACKED_FIELD};
use crate::format::{FormatError, RowWriter};
use crate::progress::Progress;
use crate::source::TelemetrySource;
use rtde::{Recipe, RtdeError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use thiserror::Error;

/// Default sampling frequency in Hz.
pub const DEFAULT_FREQUENCY: u64 = 125;

/// Recorder configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Samples to process before stopping (0 = until interrupted).
    pub target_count: u64,

    /// Sampling frequency in Hz. Also the progress reporting period.
    pub frequency: u64,

    /// Use buffered receive (no sample is dropped).
    pub buffered: bool,

    /// Change-significance threshold.
    pub threshold: f64,

    /// Field compared between consecutive samples.
    pub tracked_field: String,
}

impl RecorderConfig {
    pub fn new(frequency: u64) -> Self {
        Self {
            target_count: 0,
            frequency,
            buffered: false,
            threshold: DEFAULT_THRESHOLD,
            tracked_field: DEFAULT_TRACKED_FIELD.to_string(),
        }
    }

    /// Set target sample count.
    pub fn target_count(mut self, count: u64) -> Self {
        self.target_count = count;
        self
    }

    /// Enable buffered receive.
    pub fn buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    /// Set significance threshold.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set tracked field.
    pub fn tracked_field(mut self, field: impl Into<String>) -> Self {
        self.tracked_field = field.into();
        self
    }
}

impl RecorderConfig {
    /// Check the settings against `recipe` without touching any connection.
    pub fn validate(&self, recipe: &Recipe) -> Result<(), RecorderError> {
        self.change_filter(recipe).map(|_| ())
    }

    fn change_filter(&self, recipe: &Recipe) -> Result<ChangeFilter, RecorderError> {
        if self.frequency == 0 {
            return Err(RecorderError::InvalidFrequency);
        }
        Ok(ChangeFilter::for_recipe(
            recipe,
            &self.tracked_field,
            self.threshold,
        )?)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY)
    }
}

/// Recorder errors.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Transport error: {0}")]
    Transport(#[from] RtdeError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Frequency must be at least 1 Hz")]
    InvalidFrequency,
}

/// Recording statistics.
#[derive(Debug, Clone, Default)]
pub struct RecordingStats {
    /// Samples processed (written or skipped).
    pub attempts: u64,

    /// Rows written.
    pub rows_written: u64,

    /// Samples dropped by the change filter.
    pub skipped: u64,

    /// Receives that timed out without a sample.
    pub absent: u64,

    /// Recording duration in seconds.
    pub duration_secs: f64,

    /// Processed samples per second (average).
    pub samples_per_second: f64,
}

/// Why a session ended.
#[derive(Debug)]
pub enum Termination {
    /// Target count reached.
    Exhausted,
    /// Stop flag raised.
    Interrupted,
    /// Transport or output error.
    Failed(RecorderError),
}

impl Termination {
    pub fn is_failure(&self) -> bool {
        matches!(self, Termination::Failed(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "sample count reached"),
            Termination::Interrupted => write!(f, "interrupted"),
            Termination::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Outcome of one loop iteration.
#[derive(Debug)]
pub enum Step {
    Continue,
    Stop(Termination),
}

/// Result of [`Recorder::run`].
#[derive(Debug)]
pub struct SessionReport {
    pub termination: Termination,
    pub stats: RecordingStats,
}

/// Recording session.
pub struct Recorder<S: TelemetrySource, W: RowWriter> {
    config: RecorderConfig,
    source: S,
    writer: W,
    filter: ChangeFilter,
    progress: Progress,
    stats: RecordingStats,
}

impl<S: TelemetrySource, W: RowWriter> Recorder<S, W> {
    /// Create a recorder over a started source.
    ///
    /// `writer` must already hold a header for `recipe`.
    pub fn new(
        config: RecorderConfig,
        source: S,
        writer: W,
        recipe: &Recipe,
    ) -> Result<Self, RecorderError> {
        let filter = config.change_filter(recipe)?;

        Ok(Self {
            config,
            source,
            writer,
            filter,
            progress: Progress::disabled(),
            stats: RecordingStats::default(),
        })
    }

    /// Set progress reporter (disabled by default).
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run one iteration.
    pub fn step(&mut self, stop: &AtomicBool) -> Step {
        if stop.load(Ordering::SeqCst) {
            return Step::Stop(Termination::Interrupted);
        }
        if self.config.target_count > 0 && self.stats.attempts >= self.config.target_count {
            return Step::Stop(Termination::Exhausted);
        }

        let received = if self.config.buffered {
            self.source.receive_buffered()
        } else {
            self.source.receive()
        };
        let sample = match received {
            Ok(Some(sample)) => sample,
            Ok(None) => {
                self.stats.absent += 1;
                return Step::Continue;
            }
            Err(e) => return Step::Stop(Termination::Failed(e.into())),
        };

        if self.filter.observe(&sample) {
            if let Err(e) = self.writer.write_row(&sample) {
                return Step::Stop(Termination::Failed(e.into()));
            }
            self.stats.rows_written += 1;
        } else {
            self.stats.skipped += 1;
        }

        self.stats.attempts += 1;
        self.progress.update(self.stats.attempts);
        Step::Continue
    }

    /// Record until the session terminates, then shut down.
    pub fn run(mut self, stop: &AtomicBool) -> SessionReport {
        let start = Instant::now();
        tracing::info!(
            "Recording started (target: {}, frequency: {} Hz, buffered: {}, tracking {} > {})",
            self.config.target_count,
            self.config.frequency,
            self.config.buffered,
            self.filter.field(),
            self.filter.threshold()
        );

        let termination = loop {
            match self.step(stop) {
                Step::Continue => {}
                Step::Stop(termination) => break termination,
            }
        };

        self.shutdown(termination, start)
    }

    fn shutdown(mut self, termination: Termination, start: Instant) -> SessionReport {
        // Progress shares stdout with the log output.
        if termination.is_failure() {
            self.progress.abandon();
        } else {
            self.progress.finish();
        }
        match &termination {
            Termination::Exhausted => tracing::info!("Sample count reached"),
            Termination::Interrupted => tracing::info!("Recording interrupted"),
            Termination::Failed(e) => tracing::error!("Recording failed: {}", e),
        }

        if let Err(e) = self.source.send_pause() {
            tracing::warn!("Unable to pause synchronization: {}", e);
        }
        self.source.disconnect();

        let termination = match self.writer.flush() {
            Ok(()) => termination,
            Err(e) if termination.is_failure() => {
                tracing::error!("Unable to flush output: {}", e);
                termination
            }
            Err(e) => {
                tracing::error!("Unable to flush output: {}", e);
                Termination::Failed(e.into())
            }
        };

        self.stats.duration_secs = start.elapsed().as_secs_f64();
        if self.stats.duration_secs > 0.0 {
            self.stats.samples_per_second = self.stats.attempts as f64 / self.stats.duration_secs;
        }

        tracing::info!(
            "Stopped recording: {} samples, {} rows, {:.1}s",
            self.stats.attempts,
            self.stats.rows_written,
            self.stats.duration_secs
        );

        SessionReport {
            termination,
            stats: self.stats,
        }
    }
}
