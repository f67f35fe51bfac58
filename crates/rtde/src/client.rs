// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking RTDE client.
//!
//! One TCP connection, one output recipe. Control requests (`V`, `v`, `O`,
//! `S`, `P`) block until the matching reply arrives or the receive timeout
//! expires. Data packages are decoded against the negotiated output recipe and
//! handed out either latest-only ([`RtdeClient::receive`]) or in arrival order
//! ([`RtdeClient::receive_buffered`]).

use crate::error::RtdeError;
use crate::protocol::{Command, FieldType, PacketCodec, DEFAULT_PORT, PROTOCOL_VERSION};
use crate::recipe::{Recipe, Sample};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Size of a single socket read.
const READ_CHUNK: usize = 4096;

/// Oldest controller release with a usable RTDE implementation.
const MIN_CONTROLLER_VERSION: (u32, u32, u32) = (3, 2, 19171);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller host name or address.
    pub host: String,

    /// RTDE port.
    pub port: u16,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Maximum time a receive or control request blocks waiting for bytes.
    pub receive_timeout: Duration,

    /// Protocol version requested during the handshake.
    pub protocol_version: u16,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            receive_timeout: Duration::from_secs(1),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Started,
    Paused,
}

/// Controller software version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ControllerVersion {
    pub major: u32,
    pub minor: u32,
    pub bugfix: u32,
    pub build: u32,
}

impl ControllerVersion {
    fn read(mut r: &[u8]) -> io::Result<Self> {
        Ok(Self {
            major: r.read_u32::<BigEndian>()?,
            minor: r.read_u32::<BigEndian>()?,
            bugfix: r.read_u32::<BigEndian>()?,
            build: r.read_u32::<BigEndian>()?,
        })
    }
}

impl fmt::Display for ControllerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.bugfix, self.build
        )
    }
}

#[derive(Debug)]
struct OutputRecipe {
    id: u8,
    recipe: Arc<Recipe>,
}

/// RTDE client over a blocking TCP stream.
pub struct RtdeClient {
    config: ClientConfig,
    stream: Option<TcpStream>,
    codec: PacketCodec,
    state: ConnectionState,
    output: Option<OutputRecipe>,
    pending: VecDeque<Sample>,
    skipped: u64,
}

impl RtdeClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stream: None,
            codec: PacketCodec::new(),
            state: ConnectionState::Disconnected,
            output: None,
            pending: VecDeque::new(),
            skipped: 0,
        }
    }

    /// Open the TCP connection and negotiate the protocol version.
    pub fn connect(&mut self) -> Result<(), RtdeError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let addrs = (self.config.host.as_str(), self.config.port).to_socket_addrs()?;
        let mut last_err = io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address for {}", self.config.host),
        );
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    log::debug!("[rtde] connect to {} failed: {}", addr, e);
                    last_err = e;
                }
            }
        }
        let stream = stream.ok_or(last_err)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.config.receive_timeout))?;

        log::info!(
            "[rtde] connected to {}:{}",
            self.config.host,
            self.config.port
        );

        self.stream = Some(stream);
        self.codec.reset();
        self.pending.clear();
        self.state = ConnectionState::Connected;

        if let Err(e) = self.negotiate_protocol_version() {
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    /// Close the connection. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                log::debug!("[rtde] shutdown: {}", e);
            }
            log::info!("[rtde] disconnected");
        }
        self.codec.reset();
        self.pending.clear();
        self.state = ConnectionState::Disconnected;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Recipe accepted by the last successful output setup.
    pub fn output_recipe(&self) -> Option<&Arc<Recipe>> {
        self.output.as_ref().map(|o| &o.recipe)
    }

    /// Data packages dropped by latest-only receives.
    pub fn skipped_packages(&self) -> u64 {
        self.skipped
    }

    fn negotiate_protocol_version(&mut self) -> Result<(), RtdeError> {
        let version = self.config.protocol_version;
        let reply = self.request(Command::RequestProtocolVersion, &version.to_be_bytes())?;
        match reply.first() {
            Some(&accepted) if accepted != 0 => {
                log::debug!("[rtde] protocol version {} accepted", version);
                Ok(())
            }
            Some(_) => Err(RtdeError::ProtocolVersionRejected(version)),
            None => Err(RtdeError::malformed(
                Command::RequestProtocolVersion,
                "empty reply",
            )),
        }
    }

    /// Query the controller software version.
    pub fn get_controller_version(&mut self) -> Result<ControllerVersion, RtdeError> {
        let reply = self.request(Command::GetControllerVersion, &[])?;
        let version = ControllerVersion::read(&reply[..]).map_err(|_| {
            RtdeError::malformed(
                Command::GetControllerVersion,
                format!("expected 16 bytes, got {}", reply.len()),
            )
        })?;

        log::info!("[rtde] controller version {}", version);
        let (major, minor, bugfix) = MIN_CONTROLLER_VERSION;
        if version.major == major && version.minor <= minor && version.bugfix < bugfix {
            log::warn!(
                "[rtde] controller {} is older than {}.{}.{}, RTDE may misbehave",
                version,
                major,
                minor,
                bugfix
            );
        }

        Ok(version)
    }

    /// Configure the output recipe at `frequency` Hz.
    ///
    /// The controller answers with a recipe id and the type of every requested
    /// field. Unknown or already-claimed fields, or types that differ from the
    /// requested ones, reject the setup.
    pub fn send_output_setup(&mut self, recipe: &Recipe, frequency: f64) -> Result<(), RtdeError> {
        let names = recipe.names_csv();
        let mut payload = Vec::with_capacity(8 + names.len());
        payload.write_f64::<BigEndian>(frequency)?;
        payload.extend_from_slice(names.as_bytes());

        let reply = self.request(Command::SetupOutputs, &payload)?;
        let (&id, types) = reply
            .split_first()
            .ok_or_else(|| RtdeError::malformed(Command::SetupOutputs, "empty reply"))?;
        let types = String::from_utf8_lossy(types);
        let types: Vec<&str> = types.split(',').map(str::trim).collect();

        if types.len() != recipe.len() {
            return Err(RtdeError::SetupRejected(format!(
                "requested {} fields, controller answered {}",
                recipe.len(),
                types.len()
            )));
        }

        for ((name, requested), answered) in recipe.fields().zip(&types) {
            match *answered {
                "NOT_FOUND" => {
                    return Err(RtdeError::SetupRejected(format!(
                        "variable '{}' not found",
                        name
                    )))
                }
                "IN_USE" => {
                    return Err(RtdeError::SetupRejected(format!(
                        "variable '{}' is in use by another client",
                        name
                    )))
                }
                other => {
                    let actual: FieldType = other.parse()?;
                    if actual != requested {
                        return Err(RtdeError::SetupRejected(format!(
                            "variable '{}' is {} on the controller, recipe says {}",
                            name, actual, requested
                        )));
                    }
                }
            }
        }

        log::info!(
            "[rtde] output recipe {} configured: {} field(s) at {} Hz",
            id,
            recipe.len(),
            frequency
        );

        self.pending.clear();
        self.output = Some(OutputRecipe {
            id,
            recipe: Arc::new(recipe.clone()),
        });
        Ok(())
    }

    /// Start data synchronization.
    pub fn send_start(&mut self) -> Result<(), RtdeError> {
        let reply = self.request(Command::Start, &[])?;
        if !Self::success_flag(Command::Start, &reply)? {
            return Err(RtdeError::StartRejected);
        }
        log::info!("[rtde] synchronization started");
        self.state = ConnectionState::Started;
        Ok(())
    }

    /// Pause data synchronization. Queued samples are dropped.
    pub fn send_pause(&mut self) -> Result<(), RtdeError> {
        let reply = self.request(Command::Pause, &[])?;
        self.pending.clear();
        if !Self::success_flag(Command::Pause, &reply)? {
            return Err(RtdeError::PauseRejected);
        }
        log::info!("[rtde] synchronization paused");
        self.state = ConnectionState::Paused;
        Ok(())
    }

    /// Latest available sample.
    ///
    /// Older data packages already received are dropped. Returns `Ok(None)`
    /// when nothing arrives within the receive timeout.
    pub fn receive(&mut self) -> Result<Option<Sample>, RtdeError> {
        self.ensure_receiving()?;
        loop {
            self.drain_packets()?;
            if let Some(latest) = self.pending.pop_back() {
                let dropped = self.pending.len();
                if dropped > 0 {
                    log::debug!("[rtde] skipping {} package(s)", dropped);
                    self.skipped += dropped as u64;
                    self.pending.clear();
                }
                return Ok(Some(latest));
            }
            if !self.fill_buffer()? {
                return Ok(None);
            }
        }
    }

    /// Next sample in arrival order, never skipping any.
    ///
    /// Returns `Ok(None)` when nothing arrives within the receive timeout.
    pub fn receive_buffered(&mut self) -> Result<Option<Sample>, RtdeError> {
        self.ensure_receiving()?;
        loop {
            if let Some(sample) = self.pending.pop_front() {
                return Ok(Some(sample));
            }
            self.drain_packets()?;
            if let Some(sample) = self.pending.pop_front() {
                return Ok(Some(sample));
            }
            if !self.fill_buffer()? {
                return Ok(None);
            }
        }
    }

    fn ensure_receiving(&self) -> Result<(), RtdeError> {
        if self.stream.is_none() {
            return Err(RtdeError::NotConnected);
        }
        if self.output.is_none() {
            return Err(RtdeError::NoOutputRecipe);
        }
        Ok(())
    }

    fn success_flag(command: Command, reply: &[u8]) -> Result<bool, RtdeError> {
        reply
            .first()
            .map(|&b| b != 0)
            .ok_or_else(|| RtdeError::malformed(command, "empty reply"))
    }

    /// Send a control request and wait for the reply with the same command.
    fn request(&mut self, command: Command, payload: &[u8]) -> Result<Vec<u8>, RtdeError> {
        self.send(command, payload)?;
        loop {
            while let Some(packet) = self.codec.next_packet()? {
                if packet.command == command {
                    return Ok(packet.payload);
                }
                self.handle_unsolicited(packet.command, &packet.payload);
            }
            if !self.fill_buffer()? {
                return Err(RtdeError::Timeout(command));
            }
        }
    }

    fn send(&mut self, command: Command, payload: &[u8]) -> Result<(), RtdeError> {
        let frame = PacketCodec::encode(command, payload)?;
        let stream = self.stream.as_mut().ok_or(RtdeError::NotConnected)?;
        if let Err(e) = stream.write_all(&frame) {
            log::error!("[rtde] send {:?} failed: {}", command, e);
            self.close_on_error();
            return Err(e.into());
        }
        Ok(())
    }

    /// Read once from the socket. `Ok(false)` means the receive timeout expired.
    fn fill_buffer(&mut self) -> Result<bool, RtdeError> {
        let stream = self.stream.as_mut().ok_or(RtdeError::NotConnected)?;
        let mut chunk = [0u8; READ_CHUNK];
        match stream.read(&mut chunk) {
            Ok(0) => {
                log::error!("[rtde] connection closed by controller");
                self.close_on_error();
                Err(RtdeError::ConnectionLost)
            }
            Ok(n) => {
                self.codec.extend(&chunk[..n]);
                Ok(true)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(false)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(true),
            Err(e) => {
                log::error!("[rtde] receive failed: {}", e);
                self.close_on_error();
                Err(e.into())
            }
        }
    }

    /// Decode every complete packet in the buffer, queueing data packages.
    fn drain_packets(&mut self) -> Result<(), RtdeError> {
        while let Some(packet) = self.codec.next_packet()? {
            if packet.command == Command::DataPackage {
                if let Some(sample) = self.decode_data(&packet.payload)? {
                    self.pending.push_back(sample);
                }
            } else {
                self.handle_unsolicited(packet.command, &packet.payload);
            }
        }
        Ok(())
    }

    fn decode_data(&self, payload: &[u8]) -> Result<Option<Sample>, RtdeError> {
        let output = self.output.as_ref().ok_or(RtdeError::NoOutputRecipe)?;
        let (&id, body) = payload
            .split_first()
            .ok_or_else(|| RtdeError::malformed(Command::DataPackage, "missing recipe id"))?;
        if id != output.id {
            log::debug!("[rtde] ignoring data package for recipe {}", id);
            return Ok(None);
        }
        Sample::decode(Arc::clone(&output.recipe), body.to_vec()).map(Some)
    }

    fn handle_unsolicited(&self, command: Command, payload: &[u8]) {
        match command {
            Command::TextMessage => log_text_message(payload),
            Command::DataPackage => log::debug!("[rtde] skipping data package"),
            other => log::debug!("[rtde] skipping unexpected {:?} packet", other),
        }
    }

    fn close_on_error(&mut self) {
        self.stream = None;
        self.codec.reset();
        self.state = ConnectionState::Disconnected;
    }
}

impl Drop for RtdeClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Log a controller text message at the level it reports.
///
/// Layout: `msg_len (1) | msg | source_len (1) | source | level (1)`.
fn log_text_message(payload: &[u8]) {
    fn field<'a>(r: &mut &'a [u8]) -> Option<&'a [u8]> {
        let bytes: &'a [u8] = *r;
        let (&len, rest) = bytes.split_first()?;
        let len = len as usize;
        if rest.len() < len {
            return None;
        }
        let (value, rest) = rest.split_at(len);
        *r = rest;
        Some(value)
    }

    let mut r = payload;
    let parsed = field(&mut r).and_then(|msg| {
        let source = field(&mut r)?;
        let level = *r.first()?;
        Some((msg, source, level))
    });

    match parsed {
        Some((msg, source, level)) => {
            let msg = String::from_utf8_lossy(msg);
            let source = String::from_utf8_lossy(source);
            match level {
                0 | 1 => log::error!("[controller] {}: {}", source, msg),
                2 => log::warn!("[controller] {}: {}", source, msg),
                _ => log::info!("[controller] {}: {}", source, msg),
            }
        }
        None => log::info!("[controller] {}", String::from_utf8_lossy(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("robot")
            .port(30005)
            .receive_timeout(Duration::from_millis(250));

        assert_eq!(config.host, "robot");
        assert_eq!(config.port, 30005);
        assert_eq!(config.receive_timeout, Duration::from_millis(250));
        assert_eq!(config.protocol_version, 2);
        assert_eq!(ClientConfig::default().port, DEFAULT_PORT);
    }

    #[test]
    fn test_version_display_and_order() {
        let old = ControllerVersion {
            major: 3,
            minor: 2,
            bugfix: 18000,
            build: 1,
        };
        let new = ControllerVersion {
            major: 5,
            minor: 11,
            bugfix: 0,
            build: 108,
        };
        assert_eq!(new.to_string(), "5.11.0.108");
        assert!(old < new);
    }

    #[test]
    fn test_receive_requires_connection() {
        let mut client = RtdeClient::new(ClientConfig::default());
        assert!(matches!(client.receive(), Err(RtdeError::NotConnected)));
        assert!(matches!(
            client.receive_buffered(),
            Err(RtdeError::NotConnected)
        ));
        assert!(matches!(client.send_start(), Err(RtdeError::NotConnected)));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut client = RtdeClient::new(ClientConfig::default());
        client.disconnect();
        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_text_message_parsing_tolerates_garbage() {
        // Valid v2 message, then a truncated one: neither may panic.
        let mut payload = vec![5];
        payload.extend_from_slice(b"hello");
        payload.push(3);
        payload.extend_from_slice(b"ctl");
        payload.push(2);
        log_text_message(&payload);
        log_text_message(&[9, b'x']);
        log_text_message(&[]);
    }
}
