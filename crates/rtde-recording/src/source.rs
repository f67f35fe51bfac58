// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample sources driven by the recorder.

use rtde::{RtdeClient, RtdeError, Sample};

/// A started telemetry stream.
///
/// `Ok(None)` means nothing arrived within the read timeout. Any error ends
/// the session.
pub trait TelemetrySource {
    /// Most recent sample, older pending ones are dropped.
    fn receive(&mut self) -> Result<Option<Sample>, RtdeError>;

    /// Next sample in arrival order.
    fn receive_buffered(&mut self) -> Result<Option<Sample>, RtdeError>;

    fn send_pause(&mut self) -> Result<(), RtdeError>;

    /// Close the stream. Must be idempotent.
    fn disconnect(&mut self);
}

impl TelemetrySource for RtdeClient {
    fn receive(&mut self) -> Result<Option<Sample>, RtdeError> {
        RtdeClient::receive(self)
    }

    fn receive_buffered(&mut self) -> Result<Option<Sample>, RtdeError> {
        RtdeClient::receive_buffered(self)
    }

    fn send_pause(&mut self) -> Result<(), RtdeError> {
        RtdeClient::send_pause(self)
    }

    fn disconnect(&mut self) {
        RtdeClient::disconnect(self)
    }
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for &mut S {
    fn receive(&mut self) -> Result<Option<Sample>, RtdeError> {
        (**self).receive()
    }

    fn receive_buffered(&mut self) -> Result<Option<Sample>, RtdeError> {
        (**self).receive_buffered()
    }

    fn send_pause(&mut self) -> Result<(), RtdeError> {
        (**self).send_pause()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}
