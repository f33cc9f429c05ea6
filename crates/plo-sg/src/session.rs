//! Serial session to one PLO module.
//!
//! A session owns the link exclusively and runs one exchange at a time:
//! encode, write, wait for the settle delay, read a fixed-size response and
//! validate it. There is no retry; callers that want one can repeat the
//! exchange. Sharing a session between threads needs external locking.

use std::thread;

use plo_sg_protocol::{decode_frame, encode_frame, Command, DecodedFrame, Payload, ProtocolRevision};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::discovery::DeviceList;
use crate::error::{DriverError, Result};
use crate::link::{SerialLink, SerialPortLink};

/// An open connection to a PLO module.
pub struct Session {
    link: Box<dyn SerialLink>,
    config: SessionConfig,
    port: String,
    serial_number: Option<String>,
}

impl Session {
    /// Open the configured port, or the first discovered device when the
    /// configuration names none.
    pub fn open(config: &SessionConfig, devices: &DeviceList) -> Result<Self> {
        config.validate()?;

        let port = match &config.port {
            Some(port) => normalize_port_name(port),
            None => match devices.default_device() {
                Some(device) => device.port.clone(),
                None => {
                    warn!("no com port selected");
                    return Err(DriverError::NoDevice);
                }
            },
        };

        let link = SerialPortLink::open(&port, config.baud_rate, config.read_timeout())
            .map_err(|source| DriverError::OpenPort {
                port: port.clone(),
                source,
            })?;

        let serial_number = devices.serial_for(&port).map(str::to_owned);
        info!(
            "device opened, port: {}, sn: {}",
            port,
            serial_number.as_deref().unwrap_or("")
        );

        Ok(Session {
            link: Box::new(link),
            config: config.clone(),
            port,
            serial_number,
        })
    }

    /// Build a session over an existing link.
    pub fn with_link(
        link: Box<dyn SerialLink>,
        config: SessionConfig,
        port: impl Into<String>,
    ) -> Self {
        Session {
            link,
            config,
            port: port.into(),
            serial_number: None,
        }
    }

    /// Attach the host-side serial number reported by discovery.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Send one command and decode its response.
    ///
    /// `Err` is returned only when the command is not in the active command
    /// set or the write fails. Read failures and short reads are reported as
    /// `ErrorTimeout` in the decoded frame.
    pub fn exchange(&mut self, command: Command, payload: &Payload) -> Result<DecodedFrame> {
        let descriptor = self.config.revision.lookup(command)?;
        let frame = encode_frame(descriptor.opcode, payload);
        debug!("{} send: {}", self.port, hex::encode(frame));

        self.link.write_all(&frame)?;
        thread::sleep(self.config.settle_delay());

        let expected_len = descriptor.response_frame_len();
        let raw = match self.link.read_frame(expected_len, self.config.read_timeout()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} read failed: {}", self.port, e);
                Vec::new()
            }
        };
        debug!("{} recv: {}", self.port, hex::encode(&raw));

        let decoded = decode_frame(&raw, expected_len, descriptor.response_len);
        if !decoded.code.is_success() {
            warn!(
                "{:?} on {} returned {} (status {:?})",
                command, self.port, decoded.code, decoded.status
            );
        }
        Ok(decoded)
    }

    /// Port this session is bound to.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// SG serial number from discovery, if known.
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Active command set.
    pub fn revision(&self) -> ProtocolRevision {
        self.config.revision
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Windows port names are case-insensitive; `com3` becomes `COM3`.
pub fn normalize_port_name(port: &str) -> String {
    match port.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("com") => port.to_ascii_uppercase(),
        _ => port.to_string(),
    }
}
