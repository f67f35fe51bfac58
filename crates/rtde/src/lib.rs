// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTDE client
//!
//! Blocking client for the real-time data exchange (RTDE) interface exposed by
//! robot controllers on TCP port 30004.
//!
//! # Quick Start
//!
//! ```no_run
//! use rtde::{ClientConfig, ConfigFile, RtdeClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::load("record_configuration.xml")?;
//! let recipe = config.get_recipe("out")?;
//!
//! let mut client = RtdeClient::new(ClientConfig::new("192.168.1.10"));
//! client.connect()?;
//! client.send_output_setup(&recipe, 125.0)?;
//! client.send_start()?;
//!
//! if let Some(sample) = client.receive_buffered()? {
//!     println!("{:?}", sample.get("actual_q"));
//! }
//!
//! client.send_pause()?;
//! client.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`protocol`] | Packet framing, commands, field types, value codec |
//! | [`recipe`] | Ordered field lists and decoded samples |
//! | [`config`] | XML recipe files |
//! | [`client`] | TCP connection, handshake, start/pause, receive |

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod recipe;

pub use client::{ClientConfig, ConnectionState, ControllerVersion, RtdeClient};
pub use config::{ConfigError, ConfigFile};
pub use error::RtdeError;
pub use protocol::{Command, FieldType, Packet, PacketCodec, Value};
pub use recipe::{Recipe, Sample};
