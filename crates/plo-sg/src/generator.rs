//! Typed operations on a PLO signal generator.
//!
//! Each operation fills a 13-byte payload, runs one exchange and decodes the
//! response. Protocol failures come back in the [`ResultCode`]; `Err` means
//! the request was rejected before sending, the write failed, or the
//! response payload could not be decoded.

use plo_sg_protocol::*;
use tracing::debug;

use crate::config::SessionConfig;
use crate::discovery::DeviceList;
use crate::error::{DriverError, Result};
use crate::session::Session;

/// Convert a user-supplied save slot index.
pub fn parse_slot(nth: i64) -> Result<u8> {
    u8::try_from(nth).map_err(|_| {
        DriverError::InvalidArgument(format!("save slot {} out of range 0..=255", nth))
    })
}

/// High-level handle to one signal generator.
pub struct SignalGenerator {
    session: Session,
}

impl SignalGenerator {
    /// Wrap an open session.
    pub fn new(session: Session) -> Self {
        SignalGenerator { session }
    }

    /// Open a session and wrap it.
    pub fn connect(config: &SessionConfig, devices: &DeviceList) -> Result<Self> {
        Ok(Self::new(Session::open(config, devices)?))
    }

    /// Underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Give back the session.
    pub fn into_session(self) -> Session {
        self.session
    }

    fn command(&mut self, command: Command, payload: Payload) -> Result<ResultCode> {
        Ok(self.session.exchange(command, &payload)?.code)
    }

    fn query<T>(
        &mut self,
        command: Command,
        payload: Payload,
        decode: impl FnOnce(&[u8]) -> std::result::Result<T, ProtocolError>,
    ) -> Result<Outcome<T>> {
        let frame = self.session.exchange(command, &payload)?;
        if !frame.code.is_success() {
            return Ok(Outcome::failed(frame.code));
        }
        Ok(Outcome::success(decode(&frame.payload)?))
    }

    // ------------------------------------------------------------------------
    // Frequency
    // ------------------------------------------------------------------------

    /// Set the output frequency, optionally storing it in save slot `save_nth`.
    pub fn set_frequency_khz(&mut self, freq_khz: u32, save_nth: Option<u8>) -> Result<ResultCode> {
        let payload = Payload::new().with_u32_le(0, freq_khz);
        let Some(slot) = save_nth else {
            return self.command(Command::SetFrequency, payload);
        };

        let frame = self
            .session
            .exchange(Command::SaveNthFrequency, &payload.with_u8(SAVE_SLOT_OFFSET, slot))?;
        // The warning status only means something for save-nth; set-frequency
        // echoes opcode 1, which is the same byte.
        if frame.code.is_success()
            && frame.status == Some(PLO_RET_WARNING)
            && self.session.config().report_frequency_warning
        {
            return Ok(ResultCode::WarningFrequency);
        }
        Ok(frame.code)
    }

    /// Current output frequency.
    pub fn frequency_khz(&mut self) -> Result<Outcome<u32>> {
        self.query(Command::GetFrequency, Payload::new(), |p| Ok(decode_u32_le(p)))
    }

    /// Frequency stored in save slot `nth`.
    ///
    /// A `0xFF` status means the slot is empty and is reported as
    /// `ErrorNoSavedFrequency` without a value.
    pub fn saved_frequency_khz(&mut self, nth: u8) -> Result<Outcome<u32>> {
        let payload = Payload::new().with_u8(0, nth);
        let frame = self.session.exchange(Command::GetNthFrequency, &payload)?;

        let remappable = matches!(frame.code, ResultCode::Success | ResultCode::Error);
        if remappable && frame.status == Some(PLO_RET_ERROR) {
            debug!("save slot {} is empty", nth);
            return Ok(Outcome::failed(ResultCode::ErrorNoSavedFrequency));
        }
        if !frame.code.is_success() {
            return Ok(Outcome::failed(frame.code));
        }
        Ok(Outcome::success(decode_u32_le(&frame.payload)))
    }

    /// Number of frequency save slots.
    pub fn frequency_count(&mut self) -> Result<Outcome<u8>> {
        self.query(Command::GetFrequencyCount, Payload::new(), decode_u8)
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Module identifier.
    pub fn module_id(&mut self) -> Result<Outcome<String>> {
        self.query(Command::GetId, Payload::new(), decode_string)
    }

    /// Hardware revision.
    pub fn hardware_version(&mut self) -> Result<Outcome<HardwareVersion>> {
        self.query(Command::GetHardwareVersion, Payload::new(), |p| {
            decode_u8(p).map(HardwareVersion)
        })
    }

    /// Firmware version.
    pub fn firmware_version(&mut self) -> Result<Outcome<FirmwareVersion>> {
        self.query(Command::GetFirmwareVersion, Payload::new(), FirmwareVersion::decode)
    }

    /// Host-side SG serial number from discovery. No exchange is made.
    pub fn serial_number(&self) -> Option<&str> {
        self.session.serial_number()
    }

    /// Module internal serial number.
    pub fn module_serial_number(&mut self) -> Result<Outcome<String>> {
        self.query(Command::GetSerialNumber, Payload::new(), decode_string)
    }

    /// DIP switch reading.
    pub fn dip_switch(&mut self) -> Result<Outcome<u8>> {
        self.query(Command::GetDipSwitch, Payload::new(), decode_u8)
    }

    /// Output post multiplier.
    pub fn post_multiplier(&mut self) -> Result<Outcome<PostMultiplier>> {
        self.query(Command::GetPostMultiplier, Payload::new(), |p| {
            PostMultiplier::from_raw(decode_u8(p)?)
        })
    }

    // ------------------------------------------------------------------------
    // Reference clock
    // ------------------------------------------------------------------------

    /// Reference clock frequency.
    pub fn reference_clock_khz(&mut self) -> Result<Outcome<u32>> {
        self.query(Command::GetReferenceClock, Payload::new(), |p| Ok(decode_u32_le(p)))
    }

    /// Set the reference clock frequency.
    pub fn set_reference_clock_khz(&mut self, ref_khz: u32) -> Result<ResultCode> {
        self.command(
            Command::SetReferenceClock,
            Payload::new().with_u32_le(0, ref_khz),
        )
    }

    /// Select the reference clock source.
    pub fn set_reference_config(&mut self, source: RefClockSource) -> Result<ResultCode> {
        self.command(
            Command::SetReferenceConfig,
            Payload::new().with_u8(0, source.into()),
        )
    }

    /// Reference clock source.
    pub fn reference_config(&mut self) -> Result<Outcome<RefClockSource>> {
        self.query(Command::GetReferenceConfig, Payload::new(), |p| {
            RefClockSource::try_from(decode_u8(p)?)
        })
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Set the output power step (0 to 12).
    pub fn set_output_power(&mut self, step: u8) -> Result<ResultCode> {
        if step > MAX_OUTPUT_POWER_STEP {
            return Err(DriverError::InvalidArgument(format!(
                "output power step {} out of range 0..={}",
                step, MAX_OUTPUT_POWER_STEP
            )));
        }
        self.command(Command::SetOutputPower, Payload::new().with_u8(0, step))
    }

    /// Output power step.
    pub fn output_power(&mut self) -> Result<Outcome<u8>> {
        self.query(Command::GetOutputPower, Payload::new(), decode_u8)
    }

    /// Enable or disable outputs A and B.
    pub fn set_output_config(&mut self, config: OutputConfig) -> Result<ResultCode> {
        self.command(
            Command::SetOutputConfig,
            Payload::new().with_u8(0, config.into()),
        )
    }

    /// Output enable configuration.
    pub fn output_config(&mut self) -> Result<Outcome<OutputConfig>> {
        self.query(Command::GetOutputConfig, Payload::new(), |p| {
            OutputConfig::try_from(decode_u8(p)?)
        })
    }

    /// PLL lock status.
    pub fn lock_status(&mut self) -> Result<Outcome<LockStatus>> {
        self.query(Command::GetLockStatus, Payload::new(), |p| {
            decode_u8(p).map(LockStatus)
        })
    }
}
