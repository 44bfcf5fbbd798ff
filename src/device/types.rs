use futures::channel::mpsc::Sender;

use crate::device::protocol::{Command, Reply};

/// A paired Bluetooth device, as exposed by the operating system through a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedDevice {
    pub name: String,
    pub port_name: String,
    pub bluetooth: bool,
}

impl PairedDevice {
    /// A device for a port given directly by the user; the port name doubles as device name.
    pub fn from_port_name(port_name: &str) -> Self {
        PairedDevice {
            name: port_name.to_string(),
            port_name: port_name.to_string(),
            bluetooth: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceState {
    Disconnected,
    Scanning,
    Connecting(PairedDevice),
    Connected(PairedDevice),
    Failed(String),
    Lost,
}

#[derive(Debug, Clone)]
pub enum DeviceCommand {
    Scan { show_all_ports: bool },
    Connect { device: PairedDevice, baud_rate: u32 },
    Send(Command),
    Disconnect,
}

#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// The connection task is running and accepts commands on this sender
    Ready(Sender<DeviceCommand>),
    Scanned(Vec<PairedDevice>),
    ScanFailed(String),
    StateChange(DeviceState),
    Reply(Reply),
    Sent(Command),
    WriteFailed(String),
}
