//! Byte transport underneath a session.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::SerialPort;

/// A byte stream to a PLO module.
///
/// Implemented by real serial ports and by the simulated device.
pub trait SerialLink: Send {
    /// Write a whole frame.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read up to `len` bytes, waiting at most `timeout` in total.
    ///
    /// Returns fewer than `len` bytes when the timeout expires first.
    fn read_frame(&mut self, len: usize, timeout: Duration) -> io::Result<Vec<u8>>;
}

/// [`SerialLink`] over an operating system serial port.
pub struct SerialPortLink {
    port: Box<dyn SerialPort>,
}

impl SerialPortLink {
    /// Open `port_name` at `baud_rate`.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> serialport::Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()?;
        Ok(SerialPortLink { port })
    }

    /// Wrap an already opened port.
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        SerialPortLink { port }
    }
}

impl SerialLink for SerialPortLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_frame(&mut self, len: usize, timeout: Duration) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; len];
        let mut filled = 0;

        while filled < len {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port.set_timeout(remaining)?;

            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }
}
