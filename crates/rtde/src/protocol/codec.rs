// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size-prefixed packet codec.
//!
//! TCP delivers a byte stream; the codec accumulates bytes until a full
//! packet is available and hands packets out in arrival order.

use super::Command;
use crate::error::RtdeError;

/// Header size: size (2) + command (1).
pub const HEADER_SIZE: usize = 3;

/// Largest packet the 16-bit size field can describe.
pub const MAX_PACKET_SIZE: usize = u16::MAX as usize;

/// One decoded RTDE packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: Command,
    pub payload: Vec<u8>,
}

/// Incremental packet decoder.
#[derive(Debug, Default)]
pub struct PacketCodec {
    buffer: Vec<u8>,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Encode a packet: `[size: u16 BE][command][payload]`.
    pub fn encode(command: Command, payload: &[u8]) -> Result<Vec<u8>, RtdeError> {
        let size = HEADER_SIZE + payload.len();
        if size > MAX_PACKET_SIZE {
            return Err(RtdeError::PacketTooLarge(size));
        }

        let mut frame = Vec::with_capacity(size);
        frame.extend_from_slice(&(size as u16).to_be_bytes());
        frame.push(command.as_byte());
        frame.extend_from_slice(payload);
        Ok(frame)
    }

    /// Append raw bytes read from the socket.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pop the next complete packet, if any.
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, RtdeError> {
        if self.buffer.len() < HEADER_SIZE {
            return Ok(None);
        }

        let size = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize;
        let command = Command::from(self.buffer[2]);

        if size < HEADER_SIZE {
            return Err(RtdeError::malformed(
                command,
                format!("declared size {} is smaller than the header", size),
            ));
        }

        if self.buffer.len() < size {
            return Ok(None);
        }

        let payload = self.buffer[HEADER_SIZE..size].to_vec();
        self.buffer.drain(..size);

        Ok(Some(Packet { command, payload }))
    }

    /// Drop buffered bytes (after disconnect).
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header() {
        let frame = PacketCodec::encode(Command::RequestProtocolVersion, &[0, 2]).expect("encode");
        assert_eq!(frame, vec![0, 5, b'V', 0, 2]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = PacketCodec::encode(Command::Start, &[]).expect("encode");
        assert_eq!(frame, vec![0, 3, b'S']);
    }

    #[test]
    fn test_encode_too_large() {
        let payload = vec![0u8; MAX_PACKET_SIZE];
        assert!(matches!(
            PacketCodec::encode(Command::SetupOutputs, &payload),
            Err(RtdeError::PacketTooLarge(_))
        ));
    }

    #[test]
    fn test_decode_partial_then_complete() {
        let frame = PacketCodec::encode(Command::Pause, &[1]).expect("encode");
        let mut codec = PacketCodec::new();

        codec.extend(&frame[..2]);
        assert!(codec.next_packet().expect("decode").is_none());

        codec.extend(&frame[2..]);
        let packet = codec.next_packet().expect("decode").expect("packet");
        assert_eq!(packet.command, Command::Pause);
        assert_eq!(packet.payload, vec![1]);
        assert!(codec.next_packet().expect("decode").is_none());
    }

    #[test]
    fn test_decode_back_to_back() {
        let mut bytes = PacketCodec::encode(Command::Start, &[1]).expect("encode");
        bytes.extend(PacketCodec::encode(Command::DataPackage, &[7, 0xAA]).expect("encode"));

        let mut codec = PacketCodec::new();
        codec.extend(&bytes);

        let first = codec.next_packet().expect("decode").expect("first");
        assert_eq!(first.command, Command::Start);
        let second = codec.next_packet().expect("decode").expect("second");
        assert_eq!(second.command, Command::DataPackage);
        assert_eq!(second.payload, vec![7, 0xAA]);
        assert!(codec.next_packet().expect("decode").is_none());
    }

    #[test]
    fn test_decode_rejects_undersized_header() {
        let mut codec = PacketCodec::new();
        codec.extend(&[0, 1, b'U']);
        assert!(matches!(
            codec.next_packet(),
            Err(RtdeError::Malformed {
                command: Command::DataPackage,
                ..
            })
        ));
    }
}
