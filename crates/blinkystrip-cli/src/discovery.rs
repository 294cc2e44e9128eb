//! Serial device discovery.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use tokio_serial::SerialPortType;
use tracing::debug;

/// Device name prefixes used by USB CDC-ACM and USB-serial bridges on Linux.
const CANDIDATE_PREFIXES: &[&str] = &["ttyACM", "ttyUSB"];

/// A serial port that may have a strip attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortCandidate {
    /// Device path, e.g. /dev/ttyACM0
    pub path: String,
    /// USB product string, when the OS reports one
    pub product: Option<String>,
    /// USB VID:PID, when the OS reports one
    pub usb_id: Option<String>,
}

/// Returns true if a /dev entry name looks like a USB serial device.
pub fn is_candidate_name(name: &str) -> bool {
    CANDIDATE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Lists serial ports that may have a strip attached, sorted by path.
pub fn list_ports() -> Vec<PortCandidate> {
    let mut ports: BTreeMap<String, PortCandidate> = BTreeMap::new();

    match tokio_serial::available_ports() {
        Ok(available) => {
            for info in available {
                if let SerialPortType::UsbPort(usb) = info.port_type {
                    ports.insert(
                        info.port_name.clone(),
                        PortCandidate {
                            path: info.port_name,
                            product: usb.product,
                            usb_id: Some(format!("{:04X}:{:04X}", usb.vid, usb.pid)),
                        },
                    );
                }
            }
        }
        Err(e) => debug!("Serial port enumeration failed: {}", e),
    }

    for path in scan_dev("/dev") {
        ports.entry(path.clone()).or_insert(PortCandidate {
            path,
            product: None,
            usb_id: None,
        });
    }

    ports.into_values().collect()
}

/// Lists candidate device paths under a /dev-style directory.
pub fn scan_dev(dir: &str) -> Vec<String> {
    let mut paths = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_candidate_name(&name) {
                paths.push(entry.path().to_string_lossy().to_string());
            }
        }
    }
    paths.sort();
    paths
}

/// Resolves a configured device into a port path.
///
/// "auto" picks the first candidate; anything else is used as given.
pub fn resolve_port(device: &str) -> Result<String> {
    if !device.eq_ignore_ascii_case("auto") {
        return Ok(device.to_string());
    }

    let ports = list_ports();
    for port in &ports {
        debug!("Found serial candidate: {:?}", port);
    }
    match ports.into_iter().next() {
        Some(port) => Ok(port.path),
        None => anyhow::bail!("No LED strip found (looked for /dev/ttyACM* and /dev/ttyUSB*)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_candidate_name() {
        assert!(is_candidate_name("ttyACM0"));
        assert!(is_candidate_name("ttyUSB12"));
        assert!(!is_candidate_name("ttyS0"));
        assert!(!is_candidate_name("tty"));
        assert!(!is_candidate_name("cu.usbmodem1"));
    }

    #[test]
    fn test_scan_dev() {
        let dir = std::env::temp_dir().join(format!("blinkystrip-dev-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["ttyUSB1", "ttyACM0", "ttyS0", "null"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let found = scan_dev(dir.to_str().unwrap());
        let names: Vec<String> = found
            .iter()
            .map(|p| p.rsplit('/').next().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ttyACM0", "ttyUSB1"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_scan_missing_dir() {
        assert!(scan_dev("/nonexistent/blinkystrip").is_empty());
    }

    #[test]
    fn test_resolve_explicit_port() {
        assert_eq!(resolve_port("/dev/ttyACM3").unwrap(), "/dev/ttyACM3");
    }
}
