// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-line progress reporting.

use std::io::{self, Write};

/// Line written when a session ends.
pub const COMPLETE_LINE: &str = "\rComplete!            \n";

/// Progress reporter.
///
/// Emits one line every `frequency` attempts, roughly once per second of
/// recording. Output errors are ignored: progress never interrupts a session.
pub struct Progress {
    sink: Option<Box<dyn Write + Send>>,
    frequency: u64,
    target: u64,
    line_open: bool,
}

impl Progress {
    /// Report to stdout.
    pub fn stdout(frequency: u64, target: u64) -> Self {
        Self::to_writer(io::stdout(), frequency, target)
    }

    /// Report to an arbitrary sink.
    pub fn to_writer<W: Write + Send + 'static>(sink: W, frequency: u64, target: u64) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            frequency: frequency.max(1),
            target,
            line_open: false,
        }
    }

    /// Quiet mode.
    pub fn disabled() -> Self {
        Self {
            sink: None,
            frequency: 1,
            target: 0,
            line_open: false,
        }
    }

    /// Called after the attempt counter advanced to `attempts`.
    pub fn update(&mut self, attempts: u64) {
        if attempts == 0 || attempts % self.frequency != 0 {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        let _ = if self.target > 0 {
            let percent = attempts as f64 / self.target as f64 * 100.0;
            write!(sink, "\r{:.2}% done.", percent)
        } else {
            write!(sink, "\r{:3} samples.", attempts)
        };
        let _ = sink.flush();
        self.line_open = true;
    }

    /// Replace the progress line with the completion line.
    pub fn finish(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.write_all(COMPLETE_LINE.as_bytes());
            let _ = sink.flush();
        }
        self.line_open = false;
    }

    /// End a pending progress line so later output starts on a fresh line.
    pub fn abandon(&mut self) {
        if !self.line_open {
            return;
        }
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.write_all(b"\n");
            let _ = sink.flush();
        }
        self.line_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock").clone()).expect("utf8")
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bounded_progress_percentage() {
        let buf = SharedBuf::default();
        let mut progress = Progress::to_writer(buf.clone(), 125, 500);

        for attempt in 1..=250 {
            progress.update(attempt);
        }
        assert_eq!(buf.contents(), "\r25.00% done.\r50.00% done.");
    }

    #[test]
    fn test_unbounded_progress_count() {
        let buf = SharedBuf::default();
        let mut progress = Progress::to_writer(buf.clone(), 2, 0);

        for attempt in 1..=4 {
            progress.update(attempt);
        }
        assert_eq!(buf.contents(), "\r  2 samples.\r  4 samples.");
    }

    #[test]
    fn test_finish_line() {
        let buf = SharedBuf::default();
        let mut progress = Progress::to_writer(buf.clone(), 125, 0);
        progress.finish();
        assert_eq!(buf.contents(), COMPLETE_LINE);
    }

    #[test]
    fn test_disabled_is_silent() {
        let mut progress = Progress::disabled();
        progress.update(1);
        progress.abandon();
        progress.finish();
    }

    #[test]
    fn test_abandon_ends_open_line_once() {
        let buf = SharedBuf::default();
        let mut progress = Progress::to_writer(buf.clone(), 1, 0);

        progress.abandon();
        assert_eq!(buf.contents(), "");

        progress.update(1);
        progress.abandon();
        progress.abandon();
        assert_eq!(buf.contents(), "\r  1 samples.\n");
    }

    #[test]
    fn test_zero_frequency_clamped() {
        let buf = SharedBuf::default();
        let mut progress = Progress::to_writer(buf.clone(), 0, 0);
        progress.update(1);
        assert_eq!(buf.contents(), "\r  1 samples.");
    }
}
