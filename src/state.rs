//! Everything the main window shows, and how device events and button presses change it.
//!
//! All methods run on the GUI thread. Methods that need the device return the [`DeviceCommand`]
//! to forward to the connection task.

use log::{debug, info};

use crate::config::types::Config;
use crate::device::protocol::{Command, Reply};
use crate::device::scan::find_target;
use crate::device::types::{DeviceCommand, DeviceState, PairedDevice};
use crate::measurement::{accepts_radius_input, format_distance, format_radius, is_valid_radius, parse_radius_input, DistanceDisplay};

pub struct MeterState {
    distance_m: f64,
    distance_display: DistanceDisplay,
    wheel_radius_mm: f64,
    status: String,
    device_state: DeviceState,
    devices: Vec<PairedDevice>,
    target_name: String,
    baud_rate: u32,
    show_all_ports: bool,
    // Some(text) while the radius is being edited
    radius_input: Option<String>,
}

impl MeterState {
    pub fn new(config: &Config) -> Self {
        MeterState {
            distance_m: 0.0,
            distance_display: format_distance(0.0),
            wheel_radius_mm: config.wheel_radius_mm,
            status: "Not connected".to_string(),
            device_state: DeviceState::Disconnected,
            devices: Vec::new(),
            target_name: config.device_name.clone(),
            baud_rate: config.baud_rate,
            show_all_ports: config.show_all_ports,
            radius_input: None,
        }
    }

    pub fn apply_config(&mut self, config: &Config) {
        self.wheel_radius_mm = config.wheel_radius_mm;
        self.target_name = config.device_name.clone();
        self.baud_rate = config.baud_rate;
        self.show_all_ports = config.show_all_ports;
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn distance_display(&self) -> &DistanceDisplay {
        &self.distance_display
    }

    pub fn wheel_radius_mm(&self) -> f64 {
        self.wheel_radius_mm
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn device_state(&self) -> &DeviceState {
        &self.device_state
    }

    pub fn devices(&self) -> &[PairedDevice] {
        &self.devices
    }

    pub fn radius_input(&self) -> Option<&str> {
        self.radius_input.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.device_state, DeviceState::Connected(_))
    }

    fn set_status(&mut self, status: String) {
        info!("Status: {}", status);
        self.status = status;
    }

    fn set_distance(&mut self, meters: f64) {
        self.distance_m = meters;
        self.distance_display = format_distance(meters);
    }

    fn connected_device(&self) -> Option<&PairedDevice> {
        match &self.device_state {
            DeviceState::Connected(device) => Some(device),
            _ => None,
        }
    }

    /// Refresh the device list; the result arrives through [`MeterState::devices_scanned`].
    ///
    /// An open connection stays up while scanning.
    pub fn scan(&mut self) -> DeviceCommand {
        self.devices.clear();
        if !self.is_connected() {
            self.device_state = DeviceState::Scanning;
        }
        self.set_status("Searching for devices…".to_string());
        DeviceCommand::Scan { show_all_ports: self.show_all_ports }
    }

    pub fn devices_scanned(&mut self, devices: Vec<PairedDevice>) -> Option<DeviceCommand> {
        self.devices = devices;

        if let Some(device) = find_target(&self.devices, &self.target_name).cloned() {
            if self.connected_device().is_some_and(|current| current.port_name == device.port_name) {
                self.set_status(format!("Connected to {}", device.name));
                return None;
            }
            return Some(self.connect(device));
        }

        if !self.is_connected() {
            self.device_state = DeviceState::Disconnected;
        }

        if self.devices.is_empty() {
            self.set_status("No paired devices found".to_string());
        } else {
            self.set_status("Select or pair a device".to_string());
        }
        None
    }

    pub fn scan_failed(&mut self, error: String) {
        self.set_status(format!("Could not list devices: {}", error));
        self.device_state = DeviceState::Failed(error);
    }

    pub fn connect(&mut self, device: PairedDevice) -> DeviceCommand {
        self.set_status(format!("Connecting to {}…", device.name));
        self.device_state = DeviceState::Connecting(device.clone());
        DeviceCommand::Connect { device, baud_rate: self.baud_rate }
    }

    pub fn device_state_changed(&mut self, state: DeviceState) {
        let status = match &state {
            DeviceState::Disconnected => "Not connected".to_string(),
            DeviceState::Scanning => "Searching for devices…".to_string(),
            DeviceState::Connecting(device) => format!("Connecting to {}…", device.name),
            DeviceState::Connected(device) => format!("Connected to {}", device.name),
            DeviceState::Failed(error) => format!("Connection failed: {}", error),
            DeviceState::Lost => "Connection lost".to_string(),
        };

        if matches!(state, DeviceState::Scanning) && self.is_connected() {
            self.set_status(status);
            return;
        }

        self.device_state = state;
        self.set_status(status);
    }

    pub fn write_failed(&mut self, error: String) {
        self.set_status(format!("Failed to send data: {}", error));
    }

    pub fn apply_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Distance(meters) => {
                self.set_distance(meters);
            },
            Reply::ResetOk => {
                self.set_status("Distance reset".to_string());
                self.set_distance(0.0);
            },
            Reply::Radius(radius) => {
                self.wheel_radius_mm = radius;
                self.set_status(format!("Wheel radius received from device: {} mm", format_radius(radius)));
            },
            Reply::RadiusOk(radius) => {
                self.wheel_radius_mm = radius;
                self.set_status(format!("Wheel radius set on device: {} mm", format_radius(radius)));
            },
            Reply::RadiusAdded(radius) => {
                self.set_status(format!("Added wheel radius to distance: {} mm", format_radius(radius)));
            },
            Reply::RadiusError(message) => {
                self.set_status(format!("Wheel radius error: {}", message));
            },
            Reply::Unrecognized(line) => {
                debug!("Ignoring unrecognized reply: {}", line);
            },
        }
    }

    /// Zero the distance. The local value is reset even when no device is connected.
    pub fn reset(&mut self) -> Option<DeviceCommand> {
        let command = if self.is_connected() {
            self.set_status("Resetting distance…".to_string());
            Some(DeviceCommand::Send(Command::Reset))
        } else {
            self.set_status("Not connected, could not reset the distance".to_string());
            None
        };

        self.set_distance(0.0);
        command
    }

    pub fn add_radius(&mut self) -> Option<DeviceCommand> {
        if !self.is_connected() {
            self.set_status("Not connected, could not add the wheel radius".to_string());
            return None;
        }

        self.set_status(format!("Adding wheel radius ({} mm) to distance…", format_radius(self.wheel_radius_mm)));
        Some(DeviceCommand::Send(Command::AddRadius))
    }

    /// Use a new wheel radius locally and send it to the device when connected.
    pub fn set_radius(&mut self, radius: f64) -> Option<DeviceCommand> {
        if !is_valid_radius(radius) {
            return None;
        }

        self.wheel_radius_mm = radius;

        if !self.is_connected() {
            self.set_status("Not connected, wheel radius not sent to the device".to_string());
            return None;
        }

        self.set_status(format!("Sending wheel radius to device: {} mm", format_radius(radius)));
        Some(DeviceCommand::Send(Command::SetRadius(radius)))
    }

    pub fn begin_radius_edit(&mut self) {
        self.radius_input = Some(format_radius(self.wheel_radius_mm));
    }

    /// Input that is not a plain decimal number is rejected and leaves the field unchanged.
    pub fn radius_input_changed(&mut self, text: String) {
        if let Some(input) = &mut self.radius_input {
            if accepts_radius_input(&text) {
                *input = text;
            }
        }
    }

    /// Apply the edited radius. A field without any digits saves the current radius again. A
    /// number that is not a usable radius puts the current radius back into the field and keeps
    /// editing.
    pub fn save_radius_edit(&mut self) -> Option<DeviceCommand> {
        let text = self.radius_input.as_deref()?;

        let radius = if text.bytes().any(|b| b.is_ascii_digit()) {
            parse_radius_input(text)
        } else {
            Some(self.wheel_radius_mm)
        };

        match radius {
            Some(radius) => {
                self.radius_input = None;
                self.set_radius(radius)
            },
            None => {
                self.radius_input = Some(format_radius(self.wheel_radius_mm));
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::DistanceUnit;

    fn device(name: &str) -> PairedDevice {
        PairedDevice {
            name: name.to_string(),
            port_name: format!("/dev/cu.{}", name),
            bluetooth: true,
        }
    }

    fn connected_state() -> MeterState {
        let mut state = MeterState::new(&Config::default());
        state.device_state_changed(DeviceState::Connected(device("ESP32MesafeOlcer")));
        state
    }

    #[test]
    fn test_initial_state() {
        let state = MeterState::new(&Config::default());
        assert_eq!(state.wheel_radius_mm(), 33.0);
        assert_eq!(state.distance_display().to_string(), "0.0 cm");
        assert!(!state.is_connected());
        assert_eq!(state.status(), "Not connected");
    }

    #[test]
    fn test_distance_replaced_on_each_reply() {
        let mut state = connected_state();
        state.apply_reply(Reply::Distance(0.25));
        assert_eq!(state.distance_display().to_string(), "25.0 cm");
        state.apply_reply(Reply::Distance(3.5));
        assert_eq!(state.distance_m(), 3.5);
        assert_eq!(state.distance_display().unit, DistanceUnit::Meters);
        assert_eq!(state.distance_display().value, "3.50");
    }

    #[test]
    fn test_reset_ok_zeroes_distance() {
        let mut state = connected_state();
        state.apply_reply(Reply::Distance(2.0));
        state.apply_reply(Reply::ResetOk);
        assert_eq!(state.distance_m(), 0.0);
        assert_eq!(state.status(), "Distance reset");
    }

    #[test]
    fn test_radius_replies() {
        let mut state = connected_state();

        state.apply_reply(Reply::Radius(30.0));
        assert_eq!(state.wheel_radius_mm(), 30.0);
        assert_eq!(state.status(), "Wheel radius received from device: 30.0 mm");

        state.apply_reply(Reply::RadiusOk(31.5));
        assert_eq!(state.wheel_radius_mm(), 31.5);
        assert_eq!(state.status(), "Wheel radius set on device: 31.5 mm");

        state.apply_reply(Reply::RadiusAdded(31.5));
        assert_eq!(state.wheel_radius_mm(), 31.5);
        assert_eq!(state.status(), "Added wheel radius to distance: 31.5 mm");

        state.apply_reply(Reply::RadiusError("too small".to_string()));
        assert_eq!(state.status(), "Wheel radius error: too small");
    }

    #[test]
    fn test_unrecognized_reply_changes_nothing() {
        let mut state = connected_state();
        state.apply_reply(Reply::Distance(0.5));
        let status = state.status().to_string();
        state.apply_reply(Reply::Unrecognized("HELLO".to_string()));
        assert_eq!(state.status(), status);
        assert_eq!(state.distance_m(), 0.5);
    }

    #[test]
    fn test_reset_when_connected_sends_command() {
        let mut state = connected_state();
        state.apply_reply(Reply::Distance(1.5));
        let command = state.reset();
        assert!(matches!(command, Some(DeviceCommand::Send(Command::Reset))));
        assert_eq!(state.distance_m(), 0.0);
        assert_eq!(state.status(), "Resetting distance…");
    }

    #[test]
    fn test_reset_when_disconnected_resets_locally() {
        let mut state = MeterState::new(&Config::default());
        state.apply_reply(Reply::Distance(1.5));
        assert!(state.reset().is_none());
        assert_eq!(state.distance_m(), 0.0);
        assert_eq!(state.status(), "Not connected, could not reset the distance");
    }

    #[test]
    fn test_add_radius() {
        let mut state = connected_state();
        assert!(matches!(state.add_radius(), Some(DeviceCommand::Send(Command::AddRadius))));
        assert_eq!(state.status(), "Adding wheel radius (33.0 mm) to distance…");

        let mut state = MeterState::new(&Config::default());
        assert!(state.add_radius().is_none());
    }

    #[test]
    fn test_set_radius() {
        let mut state = connected_state();
        match state.set_radius(40.0) {
            Some(DeviceCommand::Send(Command::SetRadius(radius))) => assert_eq!(radius, 40.0),
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(state.wheel_radius_mm(), 40.0);

        let mut state = MeterState::new(&Config::default());
        assert!(state.set_radius(25.0).is_none());
        assert_eq!(state.wheel_radius_mm(), 25.0);
        assert_eq!(state.status(), "Not connected, wheel radius not sent to the device");

        assert!(state.set_radius(0.0).is_none());
        assert_eq!(state.wheel_radius_mm(), 25.0);
    }

    #[test]
    fn test_radius_edit_flow() {
        let mut state = connected_state();
        assert!(state.radius_input().is_none());

        state.begin_radius_edit();
        assert_eq!(state.radius_input(), Some("33.0"));

        state.radius_input_changed("35.".to_string());
        state.radius_input_changed("35.x".to_string());
        assert_eq!(state.radius_input(), Some("35."));

        state.radius_input_changed("35.5".to_string());
        assert!(matches!(state.save_radius_edit(), Some(DeviceCommand::Send(Command::SetRadius(_)))));
        assert!(state.radius_input().is_none());
        assert_eq!(state.wheel_radius_mm(), 35.5);
    }

    #[test]
    fn test_radius_edit_rejects_zero() {
        let mut state = connected_state();
        state.begin_radius_edit();
        state.radius_input_changed("0".to_string());
        assert!(state.save_radius_edit().is_none());
        assert_eq!(state.radius_input(), Some("33.0"));
        assert_eq!(state.wheel_radius_mm(), 33.0);
    }

    #[test]
    fn test_radius_edit_without_digits_saves_current_radius() {
        for text in ["", "."] {
            let mut state = connected_state();
            state.begin_radius_edit();
            state.radius_input_changed(text.to_string());
            match state.save_radius_edit() {
                Some(DeviceCommand::Send(Command::SetRadius(radius))) => assert_eq!(radius, 33.0),
                other => panic!("unexpected command {:?}", other),
            }
            assert!(state.radius_input().is_none());
            assert_eq!(state.status(), "Sending wheel radius to device: 33.0 mm");
        }
    }

    #[test]
    fn test_rescan_keeps_connection() {
        let mut state = MeterState::new(&Config::default());
        state.connect(device("Wheel"));
        state.device_state_changed(DeviceState::Connected(device("Wheel")));

        state.scan();
        assert!(state.is_connected());
        state.device_state_changed(DeviceState::Scanning);
        assert!(state.is_connected());
        assert_eq!(state.status(), "Searching for devices…");

        assert!(state.devices_scanned(vec![device("Wheel")]).is_none());
        assert!(state.is_connected());
        assert_eq!(state.status(), "Select or pair a device");

        state.apply_reply(Reply::Distance(1.5));
        assert!(matches!(state.reset(), Some(DeviceCommand::Send(Command::Reset))));
        assert!(matches!(state.add_radius(), Some(DeviceCommand::Send(Command::AddRadius))));
    }

    #[test]
    fn test_rescan_finds_connected_target() {
        let mut state = connected_state();
        state.scan();
        assert!(state.devices_scanned(vec![device("Other"), device("ESP32MesafeOlcer")]).is_none());
        assert!(state.is_connected());
        assert_eq!(state.status(), "Connected to ESP32MesafeOlcer");
    }

    #[test]
    fn test_rescan_switches_to_target() {
        let mut state = MeterState::new(&Config::default());
        state.device_state_changed(DeviceState::Connected(device("Wheel")));
        state.scan();
        match state.devices_scanned(vec![device("Wheel"), device("ESP32MesafeOlcer")]) {
            Some(DeviceCommand::Connect { device, .. }) => assert_eq!(device.name, "ESP32MesafeOlcer"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_scan_auto_connects_to_target() {
        let mut state = MeterState::new(&Config::default());
        assert!(matches!(state.scan(), DeviceCommand::Scan { show_all_ports: false }));
        assert_eq!(state.device_state(), &DeviceState::Scanning);

        let command = state.devices_scanned(vec![device("Other"), device("ESP32MesafeOlcer")]);
        match command {
            Some(DeviceCommand::Connect { device, baud_rate }) => {
                assert_eq!(device.name, "ESP32MesafeOlcer");
                assert_eq!(baud_rate, Config::default().baud_rate);
            },
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(state.status(), "Connecting to ESP32MesafeOlcer…");
        assert_eq!(state.devices().len(), 2);
    }

    #[test]
    fn test_scan_without_target() {
        let mut state = MeterState::new(&Config::default());
        state.scan();
        assert!(state.devices_scanned(vec![device("Other")]).is_none());
        assert_eq!(state.status(), "Select or pair a device");

        assert!(state.devices_scanned(Vec::new()).is_none());
        assert_eq!(state.status(), "No paired devices found");
    }

    #[test]
    fn test_connection_states() {
        let mut state = MeterState::new(&Config::default());
        state.device_state_changed(DeviceState::Failed("permission denied".to_string()));
        assert_eq!(state.status(), "Connection failed: permission denied");

        state.device_state_changed(DeviceState::Connected(device("Wheel")));
        assert!(state.is_connected());
        assert_eq!(state.status(), "Connected to Wheel");

        state.device_state_changed(DeviceState::Lost);
        assert!(!state.is_connected());
        assert_eq!(state.status(), "Connection lost");

        state.write_failed("broken pipe".to_string());
        assert_eq!(state.status(), "Failed to send data: broken pipe");
    }
}
