//! Session exchange behavior: framing on the wire, failure reporting and
//! the command-line entry point.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;

use plo_sg::cli::{self, Args};
use plo_sg::{
    DriverError, Outcome, ResultCode, SerialLink, Session, SessionConfig, SignalGenerator, SimulatedPlo,
};
use plo_sg_protocol::{encode_response, Command, FrameVariant, Payload};

fn config() -> SessionConfig {
    SessionConfig::default().with_settle_delay_ms(0)
}

fn connect() -> (SignalGenerator, SimulatedPlo) {
    let device = SimulatedPlo::default();
    let session = Session::with_link(Box::new(device.clone()), config(), "SIM0");
    (SignalGenerator::new(session), device)
}

/// Link that records written frames and replays canned responses.
#[derive(Clone, Default)]
struct ScriptedLink {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    responses: Arc<Mutex<Vec<io::Result<Vec<u8>>>>>,
    timeouts: Arc<Mutex<Vec<Duration>>>,
    fail_writes: bool,
}

impl ScriptedLink {
    fn respond(&self, response: io::Result<Vec<u8>>) {
        self.responses.lock().unwrap().push(response);
    }

    fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }

    fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().unwrap().clone()
    }
}

impl SerialLink for ScriptedLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        self.written.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn read_frame(&mut self, _len: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        self.timeouts.lock().unwrap().push(timeout);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(Vec::new());
        }
        responses.remove(0)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_set_frequency_frame_on_wire() {
    let link = ScriptedLink::default();
    link.respond(Ok(vec![0xFF, 0xFE, 0x10, 0x01, 0, 0, 0, 0, 0, 0xEF]));
    let mut generator =
        SignalGenerator::new(Session::with_link(Box::new(link.clone()), config(), "SCRIPT"));

    assert_eq!(
        generator.set_frequency_khz(100_000, None).unwrap(),
        ResultCode::Success
    );

    let written = link.written();
    assert_eq!(written.len(), 1);
    let mut expected = vec![0xFF, 0xFE, 0x10, 0x01, 0xA0, 0x86, 0x01, 0x00];
    expected.extend_from_slice(&[0; 9]);
    expected.push(0xC8);
    assert_eq!(written[0], expected);
}

#[test]
fn test_save_slot_and_nth_index_placement() {
    let link = ScriptedLink::default();
    link.respond(Ok(encode_response(0x02, &[], FrameVariant::Standard).unwrap()));
    link.respond(Ok(encode_response(0x04, &[0x40, 0x0D, 0x03, 0x00], FrameVariant::Standard).unwrap()));
    let mut generator =
        SignalGenerator::new(Session::with_link(Box::new(link.clone()), config(), "SCRIPT"));

    generator.set_frequency_khz(200_000, Some(3)).unwrap();
    let out = generator.saved_frequency_khz(6).unwrap();
    assert_eq!(out.value, Some(200_000));

    let written = link.written();
    assert_eq!(written[0][3], 0x02);
    assert_eq!(&written[0][4..8], &200_000u32.to_le_bytes());
    assert_eq!(written[0][16], 3);
    assert_eq!(written[1][3], 0x04);
    assert_eq!(written[1][4], 6);
    assert_eq!(written[1][16], 0);
}

#[test]
fn test_large_response_decoded() {
    let link = ScriptedLink::default();
    link.respond(Ok(encode_response(0x05, b"PLOX\0\0\0\0", FrameVariant::Large).unwrap()));
    let mut generator =
        SignalGenerator::new(Session::with_link(Box::new(link.clone()), config(), "SCRIPT"));

    assert_eq!(generator.module_id().unwrap().value.as_deref(), Some("PLOX"));
}

// ============================================================================
// Failure reporting
// ============================================================================

#[test]
fn test_short_response_is_timeout() {
    let (mut generator, device) = connect();

    device.truncate_next_response(9);
    let out = generator.frequency_khz().unwrap();
    assert_eq!(out.code, ResultCode::ErrorTimeout);
    assert_eq!(out.value, None);

    // Next exchange is unaffected
    assert_eq!(generator.frequency_khz().unwrap().value, Some(100_000));
}

#[test]
fn test_checksum_failures() {
    let (mut generator, device) = connect();

    device.corrupt_next_checksum();
    assert_eq!(
        generator.frequency_khz().unwrap().code,
        ResultCode::ErrorReceiveChecksum
    );

    device.reject_next_checksum();
    assert_eq!(
        generator.set_frequency_khz(300_000, None).unwrap(),
        ResultCode::ErrorSendChecksum
    );
    assert_eq!(device.state().unwrap().frequency_khz, 100_000);
}

#[test]
fn test_receive_checksum_checked_before_status() {
    let (mut generator, device) = connect();

    // Intact frame carrying the device's checksum-rejection status
    device.override_next_status(0xFE);
    assert_eq!(
        generator.frequency_khz().unwrap().code,
        ResultCode::ErrorSendChecksum
    );

    device.override_next_status(0xFE);
    device.corrupt_next_checksum();
    assert_eq!(
        generator.frequency_khz().unwrap().code,
        ResultCode::ErrorReceiveChecksum
    );

    assert_eq!(generator.frequency_khz().unwrap(), Outcome::success(100_000));
}

#[test]
fn test_generic_device_error() {
    let (mut generator, device) = connect();

    device.override_next_status(0xFF);
    let out = generator.frequency_khz().unwrap();
    assert_eq!(out.code, ResultCode::Error);
    assert_eq!(out.value, None);
}

#[test]
fn test_repeated_queries_are_stable() {
    let (mut generator, device) = connect();

    let first = generator.frequency_khz().unwrap();
    assert_eq!(first, Outcome::success(100_000));
    for _ in 0..3 {
        assert_eq!(generator.frequency_khz().unwrap(), first);
    }
    assert_eq!(device.frames_received(), 4);
}

#[test]
fn test_settle_delay_and_read_timeout() {
    let link = ScriptedLink::default();
    link.respond(Ok(encode_response(0x0B, &[0x05], FrameVariant::Standard).unwrap()));
    let mut config = SessionConfig::default().with_settle_delay_ms(100);
    config.read_timeout_ms = 750;
    let mut generator =
        SignalGenerator::new(Session::with_link(Box::new(link.clone()), config.clone(), "SCRIPT"));

    let start = Instant::now();
    let out = generator.dip_switch().unwrap();
    let elapsed = start.elapsed();

    // Response was ready immediately; the settle delay still applies
    assert!(elapsed >= Duration::from_millis(100), "elapsed {:?}", elapsed);
    assert_eq!(out, Outcome::success(5));
    assert_eq!(link.timeouts(), vec![config.read_timeout()]);
    assert_eq!(config.read_timeout(), Duration::from_millis(750));
}

#[test]
fn test_read_error_is_timeout() {
    let link = ScriptedLink::default();
    link.respond(Err(io::Error::new(io::ErrorKind::Other, "device gone")));
    let mut generator =
        SignalGenerator::new(Session::with_link(Box::new(link), config(), "SCRIPT"));

    assert_eq!(generator.dip_switch().unwrap().code, ResultCode::ErrorTimeout);
}

#[test]
fn test_write_error_is_err() {
    let link = ScriptedLink {
        fail_writes: true,
        ..Default::default()
    };
    let mut session = Session::with_link(Box::new(link), config(), "SCRIPT");

    let result = session.exchange(Command::GetDipSwitch, &Payload::new());
    assert!(matches!(result, Err(DriverError::Io(_))));
}

// ============================================================================
// Command line
// ============================================================================

fn run(argv: &[&str]) -> (i32, String) {
    let args = Args::try_parse_from(std::iter::once("plo-sg").chain(argv.iter().copied())).unwrap();
    let mut out = Vec::new();
    let code = cli::run(&args, &mut out);
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn test_cli_get_frequency() {
    assert_eq!(
        run(&["--simulate", "-f"]),
        (0, "(RET_SUCCESS, 100000)\n".to_string())
    );
}

#[test]
fn test_cli_reports_protocol_outcome_with_success_exit() {
    assert_eq!(
        run(&["--simulate", "-f", "-n", "4"]),
        (0, "(RET_ERROR_NO_SAVED_FREQ, None)\n".to_string())
    );
}

#[test]
fn test_cli_scan_and_serial() {
    assert_eq!(
        run(&["--simulate", "-s"]),
        (0, "{\"SIM0\":\"SG-00000000\"}\n".to_string())
    );
    assert_eq!(
        run(&["--simulate", "--sn"]),
        (0, "SG-00000000\n".to_string())
    );
}

#[test]
fn test_cli_failures_exit_one() {
    assert_eq!(run(&["--simulate"]).0, 1);
    assert_eq!(run(&["--simulate", "-p", "13"]).0, 1);
    assert_eq!(run(&["--simulate", "-f", "abc"]).0, 1);
    assert_eq!(run(&["--simulate", "--legacy", "-l"]).0, 1);
}
