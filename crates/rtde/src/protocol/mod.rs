// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTDE wire protocol.
//!
//! Every packet starts with a 3-byte header:
//!
//! ```text
//! +----------------+-------------+---------------------+
//! | Size (2B BE)   | Command (1B)| Payload (Size - 3)  |
//! +----------------+-------------+---------------------+
//! ```
//!
//! `Size` counts the header itself. All multi-byte payload fields are
//! big-endian (network byte order).

mod codec;
mod types;

pub use codec::{Packet, PacketCodec, HEADER_SIZE, MAX_PACKET_SIZE};
pub use types::{FieldType, Value};

/// Default RTDE port on the controller.
pub const DEFAULT_PORT: u16 = 30004;

/// Protocol version requested during the handshake.
pub const PROTOCOL_VERSION: u16 = 2;

/// RTDE command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `V` - negotiate protocol version.
    RequestProtocolVersion,
    /// `v` - query controller software version.
    GetControllerVersion,
    /// `M` - text message pushed by the controller.
    TextMessage,
    /// `U` - data package (one sample).
    DataPackage,
    /// `O` - configure the output recipe.
    SetupOutputs,
    /// `I` - configure an input recipe (unused by the recorder).
    SetupInputs,
    /// `S` - start synchronization.
    Start,
    /// `P` - pause synchronization.
    Pause,
    /// Any byte not listed above.
    Unknown(u8),
}

impl Command {
    /// Wire byte for this command.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::RequestProtocolVersion => b'V',
            Self::GetControllerVersion => b'v',
            Self::TextMessage => b'M',
            Self::DataPackage => b'U',
            Self::SetupOutputs => b'O',
            Self::SetupInputs => b'I',
            Self::Start => b'S',
            Self::Pause => b'P',
            Self::Unknown(b) => b,
        }
    }
}

impl From<u8> for Command {
    fn from(b: u8) -> Self {
        match b {
            b'V' => Self::RequestProtocolVersion,
            b'v' => Self::GetControllerVersion,
            b'M' => Self::TextMessage,
            b'U' => Self::DataPackage,
            b'O' => Self::SetupOutputs,
            b'I' => Self::SetupInputs,
            b'S' => Self::Start,
            b'P' => Self::Pause,
            other => Self::Unknown(other),
        }
    }
}
