//! Simulated PLO module.
//!
//! Answers command frames from an in-memory [`SimulatedState`] the same way
//! the module firmware does, so sessions can run without hardware. Faults can
//! be injected into the next response.

use std::io;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use plo_sg_protocol::*;
use tracing::trace;

use crate::link::SerialLink;

/// Device-side state of a simulated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedState {
    /// Current output frequency (kHz).
    pub frequency_khz: u32,
    /// Frequency save slots. `None` is an empty slot.
    pub saved_frequencies: Vec<Option<u32>>,
    /// Frequencies the module accepts without a warning (kHz).
    pub calibrated_range_khz: RangeInclusive<u32>,
    /// Module identifier (8 bytes on the wire).
    pub module_id: String,
    /// Hardware revision.
    pub hardware_version: u8,
    /// Firmware version triple.
    pub firmware_version: [u8; 3],
    /// Raw post multiplier setting.
    pub post_multiplier: u8,
    /// Reference clock (kHz).
    pub reference_clock_khz: u32,
    /// Module internal serial number (23 bytes on the wire).
    pub module_serial: String,
    /// DIP switch reading.
    pub dip_switch: u8,
    /// Output power step.
    pub output_power: u8,
    /// Output enable configuration.
    pub output_config: OutputConfig,
    /// Reference clock source.
    pub ref_clock_source: RefClockSource,
    /// PLL lock.
    pub locked: bool,
}

impl Default for SimulatedState {
    fn default() -> Self {
        let mut saved_frequencies = vec![None; 8];
        saved_frequencies[0] = Some(100_000);
        SimulatedState {
            frequency_khz: 100_000,
            saved_frequencies,
            calibrated_range_khz: 25_000..=6_000_000,
            module_id: "PLO-6G00".to_string(),
            hardware_version: 0x12,
            firmware_version: [1, 2, 0],
            post_multiplier: 1,
            reference_clock_khz: 10_000,
            module_serial: "PLO6G-2024-000000000001".to_string(),
            dip_switch: 0,
            output_power: MAX_OUTPUT_POWER_STEP,
            output_config: OutputConfig::Both,
            ref_clock_source: RefClockSource::Internal,
            locked: true,
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    truncate_to: Option<usize>,
    corrupt_checksum: bool,
    reject_checksum: bool,
    status_override: Option<u8>,
}

#[derive(Debug)]
struct Device {
    state: SimulatedState,
    revision: ProtocolRevision,
    pending: Vec<u8>,
    faults: Faults,
    frames_received: usize,
}

/// In-memory module implementing [`SerialLink`].
///
/// Clones share the same device, so a test can keep a handle while the
/// session owns the link.
#[derive(Debug, Clone)]
pub struct SimulatedPlo {
    device: Arc<Mutex<Device>>,
}

impl Default for SimulatedPlo {
    fn default() -> Self {
        Self::new(SimulatedState::default())
    }
}

impl SimulatedPlo {
    /// Create a module speaking the extended command set.
    pub fn new(state: SimulatedState) -> Self {
        SimulatedPlo {
            device: Arc::new(Mutex::new(Device {
                state,
                revision: ProtocolRevision::Extended,
                pending: Vec::new(),
                faults: Faults::default(),
                frames_received: 0,
            })),
        }
    }

    /// Select the firmware command set.
    pub fn with_revision(self, revision: ProtocolRevision) -> Self {
        if let Ok(mut device) = self.device.lock() {
            device.revision = revision;
        }
        self
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Device>> {
        self.device
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "simulated device lock poisoned"))
    }

    /// Snapshot of the device state.
    pub fn state(&self) -> Option<SimulatedState> {
        self.device.lock().ok().map(|d| d.state.clone())
    }

    /// Modify the device state.
    pub fn update_state(&self, f: impl FnOnce(&mut SimulatedState)) {
        if let Ok(mut device) = self.device.lock() {
            f(&mut device.state);
        }
    }

    /// Number of command frames received.
    pub fn frames_received(&self) -> usize {
        self.device.lock().map(|d| d.frames_received).unwrap_or(0)
    }

    /// Deliver only the first `len` bytes of the next response.
    pub fn truncate_next_response(&self, len: usize) {
        if let Ok(mut device) = self.device.lock() {
            device.faults.truncate_to = Some(len);
        }
    }

    /// Flip the checksum byte of the next response.
    pub fn corrupt_next_checksum(&self) {
        if let Ok(mut device) = self.device.lock() {
            device.faults.corrupt_checksum = true;
        }
    }

    /// Answer the next command as if its checksum were wrong.
    pub fn reject_next_checksum(&self) {
        if let Ok(mut device) = self.device.lock() {
            device.faults.reject_checksum = true;
        }
    }

    /// Send `status` instead of the normal status byte in the next response.
    pub fn override_next_status(&self, status: u8) {
        if let Ok(mut device) = self.device.lock() {
            device.faults.status_override = Some(status);
        }
    }
}

impl SerialLink for SimulatedPlo {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut device = self.lock()?;
        device
            .handle_frame(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn read_frame(&mut self, len: usize, _timeout: Duration) -> io::Result<Vec<u8>> {
        let mut device = self.lock()?;
        let n = len.min(device.pending.len());
        Ok(device.pending.drain(..n).collect())
    }
}

impl Device {
    fn handle_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        self.frames_received += 1;
        // A new command discards anything the host did not read.
        self.pending.clear();

        if frame.len() != COMMAND_FRAME_SIZE
            || frame[0] != FRAME_HEADER_0
            || frame[1] != FRAME_HEADER_1
        {
            trace!("simulated module ignored malformed frame");
            return Ok(());
        }

        let opcode = frame[OPCODE_OFFSET];
        let descriptor = self
            .revision
            .descriptors()
            .into_iter()
            .find(|d| d.opcode == opcode);
        let variant = descriptor
            .map(|d| d.variant)
            .unwrap_or(FrameVariant::Standard);

        let checksum_ok =
            lrc(&frame[LRC_SKIP..COMMAND_FRAME_SIZE - 1]) == frame[COMMAND_FRAME_SIZE - 1];
        let rejected = std::mem::take(&mut self.faults.reject_checksum);
        let (mut status, payload) = if !checksum_ok || rejected {
            (PLO_RET_ERROR_LRC, Vec::new())
        } else {
            match descriptor {
                Some(d) => {
                    let body = &frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + COMMAND_PAYLOAD_SIZE];
                    let (status, mut payload) = self.execute(d.command, opcode, body);
                    payload.resize(d.response_len, 0);
                    (status, payload)
                }
                None => (PLO_RET_ERROR, Vec::new()),
            }
        };
        if let Some(forced) = self.faults.status_override.take() {
            status = forced;
        }

        let mut response = encode_response(status, &payload, variant)?;
        if std::mem::take(&mut self.faults.corrupt_checksum) {
            if let Some(last) = response.last_mut() {
                *last = last.wrapping_add(1);
            }
        }
        if let Some(len) = self.faults.truncate_to.take() {
            response.truncate(len);
        }
        self.pending = response;
        Ok(())
    }

    fn execute(&mut self, command: Command, opcode: u8, body: &[u8]) -> (u8, Vec<u8>) {
        let state = &mut self.state;
        let value = decode_u32_le(&body[..4]);

        match command {
            Command::Response => (opcode, Vec::new()),
            Command::SetFrequency => {
                state.frequency_khz = value;
                (opcode, Vec::new())
            }
            Command::SaveNthFrequency => {
                let slot = body[SAVE_SLOT_OFFSET] as usize;
                match state.saved_frequencies.get_mut(slot) {
                    Some(entry) => {
                        *entry = Some(value);
                        state.frequency_khz = value;
                        if state.calibrated_range_khz.contains(&value) {
                            (opcode, Vec::new())
                        } else {
                            (PLO_RET_WARNING, Vec::new())
                        }
                    }
                    None => (PLO_RET_ERROR, Vec::new()),
                }
            }
            Command::GetFrequencyCount => (opcode, vec![state.saved_frequencies.len() as u8]),
            Command::GetNthFrequency => {
                match state.saved_frequencies.get(body[0] as usize).copied().flatten() {
                    Some(freq) => (opcode, freq.to_le_bytes().to_vec()),
                    None => (PLO_RET_ERROR, Vec::new()),
                }
            }
            Command::GetId => (opcode, state.module_id.as_bytes().to_vec()),
            Command::GetHardwareVersion => (opcode, vec![state.hardware_version]),
            Command::GetFirmwareVersion => (opcode, state.firmware_version.to_vec()),
            Command::GetPostMultiplier => (opcode, vec![state.post_multiplier]),
            Command::GetReferenceClock => {
                (opcode, state.reference_clock_khz.to_le_bytes()[..3].to_vec())
            }
            Command::GetSerialNumber => (opcode, state.module_serial.as_bytes().to_vec()),
            Command::GetDipSwitch => (opcode, vec![state.dip_switch]),
            Command::SetOutputPower => {
                if body[0] > MAX_OUTPUT_POWER_STEP {
                    return (PLO_RET_ERROR, Vec::new());
                }
                state.output_power = body[0];
                (opcode, Vec::new())
            }
            Command::SetOutputConfig => match OutputConfig::try_from(body[0]) {
                Ok(config) => {
                    state.output_config = config;
                    (opcode, Vec::new())
                }
                Err(_) => (PLO_RET_ERROR, Vec::new()),
            },
            Command::SetReferenceClock => {
                state.reference_clock_khz = value;
                (opcode, Vec::new())
            }
            Command::SetReferenceConfig => match RefClockSource::try_from(body[0]) {
                Ok(source) => {
                    state.ref_clock_source = source;
                    (opcode, Vec::new())
                }
                Err(_) => (PLO_RET_ERROR, Vec::new()),
            },
            Command::GetOutputPower => (opcode, vec![state.output_power]),
            Command::GetOutputConfig => (opcode, vec![u8::from(state.output_config)]),
            Command::GetReferenceConfig => (opcode, vec![u8::from(state.ref_clock_source)]),
            Command::GetFrequency => (opcode, state.frequency_khz.to_le_bytes().to_vec()),
            Command::GetLockStatus => (opcode, vec![state.locked as u8]),
        }
    }
}
