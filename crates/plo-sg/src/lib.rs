//! Host driver for PLO signal generators.
//!
//! Finds SG units on the USB serial bus, opens a [`Session`] to one and runs
//! typed operations through [`SignalGenerator`]. Wire encoding lives in
//! [`plo_sg_protocol`]; this crate adds the transport, discovery, a
//! simulated module for testing and the `plo-sg` command-line tool.
//!
//! # Example
//!
//! ```rust
//! use plo_sg::{ResultCode, Session, SessionConfig, SignalGenerator, SimulatedPlo};
//!
//! let config = SessionConfig::default().with_settle_delay_ms(0);
//! let session = Session::with_link(Box::new(SimulatedPlo::default()), config, "SIM0");
//! let mut generator = SignalGenerator::new(session);
//!
//! assert_eq!(generator.set_frequency_khz(250_000, None).unwrap(), ResultCode::Success);
//! assert_eq!(generator.frequency_khz().unwrap().value, Some(250_000));
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod link;
pub mod session;
pub mod sim;

pub use config::SessionConfig;
pub use discovery::{scan, DeviceList, DeviceRecord};
pub use error::{DriverError, Result};
pub use generator::SignalGenerator;
pub use link::{SerialLink, SerialPortLink};
pub use session::Session;
pub use sim::{SimulatedPlo, SimulatedState};

pub use plo_sg_protocol::{
    Command, FirmwareVersion, HardwareVersion, LockStatus, Outcome, OutputConfig,
    PostMultiplier, ProtocolRevision, RefClockSource, ResultCode,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
