//! Device discovery.
//!
//! SG units enumerate as USB serial ports whose serial number is ten
//! characters long and starts with `SG`. The result of a scan is a plain
//! value; the caller decides which device to open.

use serde::Serialize;
use serialport::SerialPortType;
use tracing::{debug, warn};

const SERIAL_PREFIX: &str = "SG";
const SERIAL_LEN: usize = 10;

/// One enumerated serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortListing {
    /// OS port identifier (`/dev/ttyUSB0`, `COM3`).
    pub port_name: String,
    /// USB serial number, if the port reports one.
    pub serial_number: Option<String>,
}

/// A discovered SG device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// OS port identifier.
    pub port: String,
    /// Serial number formatted as `SG-xxxxxxxx`.
    pub serial_number: String,
}

/// Discovered devices, in port order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    devices: Vec<DeviceRecord>,
}

impl DeviceList {
    /// Build from records already in order.
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        DeviceList { devices }
    }

    /// Device used when no port is given.
    pub fn default_device(&self) -> Option<&DeviceRecord> {
        self.devices.first()
    }

    /// Serial number of the device on `port`, if it was discovered.
    pub fn serial_for(&self, port: &str) -> Option<&str> {
        self.devices
            .iter()
            .find(|d| d.port == port)
            .map(|d| d.serial_number.as_str())
    }

    /// All discovered devices.
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Check if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Port → serial number map for display, in port order.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .devices
            .iter()
            .map(|d| (d.port.clone(), serde_json::Value::from(d.serial_number.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Format a raw USB serial as `SG-xxxxxxxx`, or `None` if it is not an SG unit.
pub fn format_serial(raw: &str) -> Option<String> {
    if raw.len() != SERIAL_LEN || !raw.starts_with(SERIAL_PREFIX) || !raw.is_ascii() {
        return None;
    }
    Some(format!("{}-{}", SERIAL_PREFIX, &raw[SERIAL_PREFIX.len()..]))
}

/// Keep SG devices and sort them by port name.
pub fn filter_devices<I>(listings: I) -> DeviceList
where
    I: IntoIterator<Item = PortListing>,
{
    let mut devices: Vec<DeviceRecord> = listings
        .into_iter()
        .filter_map(|listing| {
            let serial = listing.serial_number.as_deref().and_then(format_serial)?;
            Some(DeviceRecord {
                port: listing.port_name,
                serial_number: serial,
            })
        })
        .collect();
    devices.sort_by(|a, b| a.port.cmp(&b.port));
    devices.dedup_by(|a, b| a.port == b.port);
    DeviceList::new(devices)
}

/// Enumerate the system's serial ports and return the SG devices.
pub fn scan() -> DeviceList {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("serial port enumeration failed: {}", e);
            return DeviceList::default();
        }
    };

    let listings = ports.into_iter().map(|p| PortListing {
        serial_number: match p.port_type {
            SerialPortType::UsbPort(info) => info.serial_number,
            _ => None,
        },
        port_name: p.port_name,
    });

    let devices = filter_devices(listings);
    if devices.is_empty() {
        warn!("no SG device found");
    } else {
        debug!("found {} SG device(s): {:?}", devices.len(), devices.devices());
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(port: &str, serial: Option<&str>) -> PortListing {
        PortListing {
            port_name: port.to_string(),
            serial_number: serial.map(str::to_string),
        }
    }

    #[test]
    fn test_format_serial() {
        assert_eq!(format_serial("SG12345678").as_deref(), Some("SG-12345678"));
        assert_eq!(format_serial("SG1234567"), None);
        assert_eq!(format_serial("XX12345678"), None);
    }

    #[test]
    fn test_filter_and_order() {
        let devices = filter_devices(vec![
            listing("/dev/ttyUSB1", Some("SG00000002")),
            listing("/dev/ttyACM0", Some("FT1234ABCD")),
            listing("/dev/ttyS0", None),
            listing("/dev/ttyUSB0", Some("SG00000001")),
        ]);

        assert_eq!(devices.len(), 2);
        let default = devices.default_device().unwrap();
        assert_eq!(default.port, "/dev/ttyUSB0");
        assert_eq!(default.serial_number, "SG-00000001");
        assert_eq!(devices.serial_for("/dev/ttyUSB1"), Some("SG-00000002"));
        assert_eq!(devices.serial_for("/dev/ttyACM0"), None);
    }

    #[test]
    fn test_empty_scan_has_no_default() {
        let devices = filter_devices(Vec::new());
        assert!(devices.is_empty());
        assert!(devices.default_device().is_none());
        assert_eq!(devices.to_json().to_string(), "{}");
    }

    #[test]
    fn test_json_map() {
        let devices = filter_devices(vec![listing("COM3", Some("SG0000ABCD"))]);
        assert_eq!(devices.to_json().to_string(), r#"{"COM3":"SG-0000ABCD"}"#);
    }
}
