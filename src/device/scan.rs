use std::cmp::Ordering;
use log::{debug, info};
use serialport::{SerialPortInfo, SerialPortType};

use crate::device::types::PairedDevice;
use crate::error::DeviceError;

fn base_name(port_name: &str) -> &str {
    port_name.rsplit(['/', '\\']).next().unwrap_or(port_name)
}

// macOS exposes each paired SPP device twice: /dev/tty.<name> and /dev/cu.<name>
fn macos_device_name(base: &str) -> Option<&str> {
    base.strip_prefix("cu.").or_else(|| base.strip_prefix("tty."))
}

fn device_name(info: &SerialPortInfo) -> String {
    let base = base_name(&info.port_name);

    if let Some(name) = macos_device_name(base) {
        return name.to_string();
    }

    if let SerialPortType::UsbPort(usb) = &info.port_type {
        if let Some(product) = &usb.product {
            return product.clone();
        }
    }

    base.to_string()
}

fn is_bluetooth_port(info: &SerialPortInfo) -> bool {
    matches!(info.port_type, SerialPortType::BluetoothPort)
        || base_name(&info.port_name).starts_with("rfcomm")
}

fn is_duplicate_tty(info: &SerialPortInfo, ports: &[SerialPortInfo]) -> bool {
    let base = base_name(&info.port_name);
    match base.strip_prefix("tty.") {
        Some(rest) => ports.iter().any(|other| base_name(&other.port_name) == format!("cu.{}", rest)),
        None => false,
    }
}

/// Turn the serial ports reported by the OS into the device list. Unless `show_all_ports` is
/// set, only Bluetooth ports are kept. Bluetooth ports are listed first.
pub fn paired_devices_from_ports(ports: Vec<SerialPortInfo>, show_all_ports: bool) -> Vec<PairedDevice> {
    let mut devices: Vec<PairedDevice> = ports
        .iter()
        .filter(|info| !is_duplicate_tty(info, &ports))
        .filter_map(|info| {
            let bluetooth = is_bluetooth_port(info);
            if !bluetooth && !show_all_ports {
                debug!("Skipping non bluetooth port {}", info.port_name);
                return None;
            }

            Some(PairedDevice {
                name: device_name(info),
                port_name: info.port_name.clone(),
                bluetooth,
            })
        })
        .collect();

    devices.sort_by(|a, b| match (a.bluetooth, b.bluetooth) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });

    devices
}

pub fn list_paired_devices(show_all_ports: bool) -> Result<Vec<PairedDevice>, DeviceError> {
    let ports = serialport::available_ports()?;
    let devices = paired_devices_from_ports(ports, show_all_ports);
    info!("Found {} paired device(s)", devices.len());
    Ok(devices)
}

/// The device to connect to automatically: its name equals `target`, or its port name contains
/// it.
pub fn find_target<'a>(devices: &'a [PairedDevice], target: &str) -> Option<&'a PairedDevice> {
    if target.is_empty() {
        return None;
    }

    devices
        .iter()
        .find(|device| device.name == target)
        .or_else(|| devices.iter().find(|device| device.port_name.contains(target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, port_type: SerialPortType) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type,
        }
    }

    #[test]
    fn test_only_bluetooth_ports_by_default() {
        let ports = vec![
            port("/dev/ttyS0", SerialPortType::Unknown),
            port("/dev/rfcomm0", SerialPortType::Unknown),
            port("COM7", SerialPortType::BluetoothPort),
        ];

        let devices = paired_devices_from_ports(ports, false);
        let names: Vec<&str> = devices.iter().map(|d| d.port_name.as_str()).collect();
        assert_eq!(names, vec!["COM7", "/dev/rfcomm0"]);
        assert!(devices.iter().all(|d| d.bluetooth));
    }

    #[test]
    fn test_all_ports_lists_bluetooth_first() {
        let ports = vec![
            port("/dev/ttyS0", SerialPortType::Unknown),
            port("/dev/rfcomm0", SerialPortType::Unknown),
        ];

        let devices = paired_devices_from_ports(ports, true);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].port_name, "/dev/rfcomm0");
        assert!(!devices[1].bluetooth);
    }

    #[test]
    fn test_macos_names_and_duplicates() {
        let ports = vec![
            port("/dev/tty.ESP32MesafeOlcer", SerialPortType::BluetoothPort),
            port("/dev/cu.ESP32MesafeOlcer", SerialPortType::BluetoothPort),
        ];

        let devices = paired_devices_from_ports(ports, false);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "ESP32MesafeOlcer");
        assert_eq!(devices[0].port_name, "/dev/cu.ESP32MesafeOlcer");
    }

    #[test]
    fn test_find_target() {
        let devices = vec![
            PairedDevice { name: "rfcomm0".to_string(), port_name: "/dev/rfcomm0".to_string(), bluetooth: true },
            PairedDevice { name: "ESP32MesafeOlcer".to_string(), port_name: "/dev/cu.ESP32MesafeOlcer".to_string(), bluetooth: true },
        ];

        assert_eq!(find_target(&devices, "ESP32MesafeOlcer").map(|d| d.port_name.as_str()), Some("/dev/cu.ESP32MesafeOlcer"));
        assert_eq!(find_target(&devices, "rfcomm0").map(|d| d.name.as_str()), Some("rfcomm0"));
        assert!(find_target(&devices, "Other").is_none());
        assert!(find_target(&devices, "").is_none());
    }
}
