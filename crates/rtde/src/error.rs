// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport error type.

use crate::protocol::Command;
use std::io;
use thiserror::Error;

/// Errors raised by the RTDE client.
///
/// Every variant is fatal for a running session: the recorder never retries.
#[derive(Debug, Error)]
pub enum RtdeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not connected to controller")]
    NotConnected,

    #[error("Connection lost with controller")]
    ConnectionLost,

    #[error("Timed out waiting for {0:?} reply")]
    Timeout(Command),

    #[error("Controller rejected protocol version {0}")]
    ProtocolVersionRejected(u16),

    #[error("Output setup rejected: {0}")]
    SetupRejected(String),

    #[error("Controller refused to start synchronization")]
    StartRejected,

    #[error("Controller refused to pause synchronization")]
    PauseRejected,

    #[error("No output recipe configured")]
    NoOutputRecipe,

    #[error("Unknown field type: {0}")]
    UnknownType(String),

    #[error("Malformed {command:?} packet: {reason}")]
    Malformed { command: Command, reason: String },

    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

impl RtdeError {
    pub(crate) fn malformed(command: Command, reason: impl Into<String>) -> Self {
        Self::Malformed {
            command,
            reason: reason.into(),
        }
    }
}
