//! Command-line front end.
//!
//! Arguments are turned into a single [`Action`] before any port is opened,
//! so malformed values never reach the device. Results go to the supplied
//! writer; diagnostics go to stderr.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use plo_sg_protocol::{OutputConfig, ProtocolError, ProtocolRevision, RefClockSource};
use tracing::{debug, error};

use crate::config::SessionConfig;
use crate::discovery::{self, DeviceList, DeviceRecord};
use crate::error::{DriverError, Result};
use crate::generator::{parse_slot, SignalGenerator};
use crate::session::Session;
use crate::sim::SimulatedPlo;

/// Port name reported for the simulated module.
pub const SIMULATED_PORT: &str = "SIM0";
/// Serial number reported for the simulated module.
pub const SIMULATED_SERIAL: &str = "SG-00000000";

/// PLO signal generator control tool
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "plo-sg")]
#[command(about = "Control PLO signal generators over their USB serial port")]
#[command(version)]
pub struct Args {
    /// Scan SG devices and list them as JSON
    #[arg(short, long)]
    pub scan: bool,

    /// Serial port. Defaults to the first scanned SG device
    #[arg(short, long)]
    pub com: Option<String>,

    /// Set (with KHZ) or get the output frequency. Use --nth for save slots
    #[arg(short, long, value_name = "KHZ", num_args = 0..=1)]
    pub freq: Option<Option<String>>,

    /// Save slot index, used with --freq
    #[arg(short, long, allow_negative_numbers = true)]
    pub nth: Option<i64>,

    /// Get the number of frequency save slots
    #[arg(short = 't', long = "freq-cnt")]
    pub freq_cnt: bool,

    /// Get the PLO module id
    #[arg(long)]
    pub id: bool,

    /// Get the PLO module hardware version
    #[arg(long = "hw-ver")]
    pub hw_ver: bool,

    /// Get the PLO module firmware version
    #[arg(long = "fw-ver")]
    pub fw_ver: bool,

    /// Get the output post multiplier
    #[arg(long = "post-multi")]
    pub post_multi: bool,

    /// Get the SG serial number
    #[arg(long)]
    pub sn: bool,

    /// Get the PLO module internal serial number
    #[arg(long = "plo-sn")]
    pub plo_sn: bool,

    /// Get the DIP switch reading
    #[arg(long = "dip-sw")]
    pub dip_sw: bool,

    /// Set (with STEP, 0-12) or get the output power step
    #[arg(short = 'p', long = "out-pwr", value_name = "STEP", num_args = 0..=1)]
    pub out_pwr: Option<Option<u8>>,

    /// Set or get the output config. 0: off, 1: OUT A, 2: OUT B, 3: OUT A&B
    #[arg(short = 'o', long = "out-cfg", value_name = "CFG", num_args = 0..=1)]
    pub out_cfg: Option<Option<u8>>,

    /// Set (with KHZ) or get the reference clock frequency
    #[arg(short = 'k', long = "ref-clk", value_name = "KHZ", num_args = 0..=1)]
    pub ref_clk: Option<Option<String>>,

    /// Set or get the reference clock config. 0: internal, 1: internal with output, 2: external
    #[arg(short = 'r', long = "ref-cfg", value_name = "CFG", num_args = 0..=1)]
    pub ref_cfg: Option<Option<u8>>,

    /// Get the PLL lock status
    #[arg(short = 'l', long = "get-lock")]
    pub get_lock: bool,

    /// Session configuration file (YAML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the legacy command set (opcodes 0-11)
    #[arg(long)]
    pub legacy: bool,

    /// Talk to a simulated module instead of a serial port
    #[arg(long)]
    pub simulate: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// The one operation a command line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Scan,
    GetFrequency,
    GetSavedFrequency(u8),
    SetFrequency { khz: u32, save_nth: Option<u8> },
    FrequencyCount,
    ModuleId,
    HardwareVersion,
    FirmwareVersion,
    PostMultiplier,
    GetReferenceClock,
    SetReferenceClock(u32),
    SerialNumber,
    ModuleSerialNumber,
    DipSwitch,
    SetOutputPower(u8),
    GetOutputPower,
    SetOutputConfig(OutputConfig),
    GetOutputConfig,
    SetReferenceConfig(RefClockSource),
    GetReferenceConfig,
    LockStatus,
}

impl Action {
    /// Whether the action needs an open device.
    pub fn needs_device(self) -> bool {
        !matches!(self, Action::Scan)
    }
}

fn parse_config<T>(raw: u8) -> Result<T>
where
    T: TryFrom<u8, Error = ProtocolError>,
{
    T::try_from(raw).map_err(|e| DriverError::InvalidArgument(e.to_string()))
}

fn parse_khz(text: &str) -> Result<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DriverError::InvalidArgument(format!(
            "'{}' is not a frequency in kHz",
            text
        )));
    }
    text.parse()
        .map_err(|_| DriverError::InvalidArgument(format!("frequency {} kHz is too large", text)))
}

impl Args {
    /// Pick the action, in fixed precedence order. `None` when nothing was
    /// requested.
    pub fn action(&self) -> Result<Option<Action>> {
        if self.scan {
            return Ok(Some(Action::Scan));
        }

        if let Some(freq) = &self.freq {
            let save_nth = self.nth.map(parse_slot).transpose()?;
            let action = match (freq, save_nth) {
                (None, None) => Action::GetFrequency,
                (None, Some(nth)) => Action::GetSavedFrequency(nth),
                (Some(text), save_nth) => Action::SetFrequency {
                    khz: parse_khz(text)?,
                    save_nth,
                },
            };
            return Ok(Some(action));
        }

        let action = if self.freq_cnt {
            Action::FrequencyCount
        } else if self.id {
            Action::ModuleId
        } else if self.hw_ver {
            Action::HardwareVersion
        } else if self.fw_ver {
            Action::FirmwareVersion
        } else if self.post_multi {
            Action::PostMultiplier
        } else if let Some(ref_clk) = &self.ref_clk {
            match ref_clk {
                Some(text) => Action::SetReferenceClock(parse_khz(text)?),
                None => Action::GetReferenceClock,
            }
        } else if self.sn {
            Action::SerialNumber
        } else if self.plo_sn {
            Action::ModuleSerialNumber
        } else if self.dip_sw {
            Action::DipSwitch
        } else if let Some(out_pwr) = self.out_pwr {
            match out_pwr {
                Some(step) => Action::SetOutputPower(step),
                None => Action::GetOutputPower,
            }
        } else if let Some(out_cfg) = self.out_cfg {
            match out_cfg {
                Some(raw) => Action::SetOutputConfig(parse_config(raw)?),
                None => Action::GetOutputConfig,
            }
        } else if let Some(ref_cfg) = self.ref_cfg {
            match ref_cfg {
                Some(raw) => Action::SetReferenceConfig(parse_config(raw)?),
                None => Action::GetReferenceConfig,
            }
        } else if self.get_lock {
            Action::LockStatus
        } else {
            return Ok(None);
        };
        Ok(Some(action))
    }

    /// Session configuration: the config file if given, then `--com`,
    /// `--legacy` and `--simulate` on top.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_yaml_file(path)?,
            None => SessionConfig::default(),
        };
        if let Some(com) = &self.com {
            config.port = Some(com.clone());
        }
        if self.legacy {
            config.revision = ProtocolRevision::Legacy;
        }
        if self.simulate {
            config.settle_delay_ms = 0;
        }
        Ok(config)
    }

    fn devices(&self) -> DeviceList {
        if self.simulate {
            DeviceList::new(vec![DeviceRecord {
                port: SIMULATED_PORT.to_string(),
                serial_number: SIMULATED_SERIAL.to_string(),
            }])
        } else {
            discovery::scan()
        }
    }

    fn connect(&self, config: SessionConfig, devices: &DeviceList) -> Result<SignalGenerator> {
        if !self.simulate {
            return SignalGenerator::connect(&config, devices);
        }
        let link = SimulatedPlo::default().with_revision(config.revision);
        let port = config.port.clone().unwrap_or_else(|| SIMULATED_PORT.to_string());
        let session =
            Session::with_link(Box::new(link), config, port).with_serial_number(SIMULATED_SERIAL);
        Ok(SignalGenerator::new(session))
    }
}

/// Run one action on a connected generator and format its result.
pub fn perform(generator: &mut SignalGenerator, action: Action) -> Result<String> {
    let line = match action {
        Action::Scan => {
            return Err(DriverError::InvalidArgument(
                "scan does not use a device".to_string(),
            ))
        }
        Action::GetFrequency => generator.frequency_khz()?.to_string(),
        Action::GetSavedFrequency(nth) => generator.saved_frequency_khz(nth)?.to_string(),
        Action::SetFrequency { khz, save_nth } => {
            generator.set_frequency_khz(khz, save_nth)?.to_string()
        }
        Action::FrequencyCount => generator.frequency_count()?.to_string(),
        Action::ModuleId => generator.module_id()?.to_string(),
        Action::HardwareVersion => generator.hardware_version()?.to_string(),
        Action::FirmwareVersion => generator.firmware_version()?.to_string(),
        Action::PostMultiplier => generator.post_multiplier()?.to_string(),
        Action::GetReferenceClock => generator.reference_clock_khz()?.to_string(),
        Action::SetReferenceClock(khz) => generator.set_reference_clock_khz(khz)?.to_string(),
        Action::SerialNumber => generator.serial_number().unwrap_or("None").to_string(),
        Action::ModuleSerialNumber => generator.module_serial_number()?.to_string(),
        Action::DipSwitch => generator.dip_switch()?.to_string(),
        Action::SetOutputPower(step) => generator.set_output_power(step)?.to_string(),
        Action::GetOutputPower => generator.output_power()?.to_string(),
        Action::SetOutputConfig(config) => generator.set_output_config(config)?.to_string(),
        Action::GetOutputConfig => generator.output_config()?.to_string(),
        Action::SetReferenceConfig(source) => {
            generator.set_reference_config(source)?.to_string()
        }
        Action::GetReferenceConfig => generator.reference_config()?.to_string(),
        Action::LockStatus => generator.lock_status()?.to_string(),
    };
    Ok(line)
}

fn execute<W: Write>(args: &Args, out: &mut W) -> Result<bool> {
    let Some(action) = args.action()? else {
        return Ok(false);
    };
    let config = args.session_config()?;
    let devices = args.devices();

    if !action.needs_device() {
        writeln!(out, "{}", devices.to_json())?;
        return Ok(true);
    }

    let mut generator = args.connect(config, &devices)?;
    debug!("running {:?} on {}", action, generator.session().port());
    let line = perform(&mut generator, action)?;
    writeln!(out, "{}", line)?;
    Ok(true)
}

/// Whether the error was caused by the command line rather than the device.
pub fn is_usage_error(error: &DriverError) -> bool {
    matches!(
        error,
        DriverError::InvalidArgument(_)
            | DriverError::Protocol(ProtocolError::UnsupportedCommand { .. })
    )
}

/// Run the tool and return the process exit code.
///
/// 0 once an action has run, whatever its result code; 1 when no device
/// could be opened, an argument was invalid or no action was selected.
pub fn run<W: Write>(args: &Args, out: &mut W) -> i32 {
    match execute(args, out) {
        Ok(true) => 0,
        Ok(false) => {
            eprintln!("please select an action.");
            1
        }
        Err(e) if is_usage_error(&e) => {
            eprintln!("Please enter valid arguments. {}", e);
            1
        }
        Err(DriverError::Protocol(e)) => {
            error!("unexpected response from device: {}", e);
            eprintln!("unexpected response from device: {}", e);
            1
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{} ({})", e, e.result_code());
            1
        }
    }
}
