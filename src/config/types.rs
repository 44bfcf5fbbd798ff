use log::warn;
use serde::{Deserialize, Serialize};

use crate::device::constants::{DEFAULT_BAUD_RATE, DEVICE_NAME};
use crate::measurement::is_valid_radius;

/**
 * Wheel radius (millimeters) used until the device or the user reports another one.
 */
pub const DEFAULT_WHEEL_RADIUS: f64 = 33.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub wheel_radius_mm: f64,
    /// Paired device that is connected automatically after a scan
    pub device_name: String,
    pub baud_rate: u32,
    /// List every serial port instead of Bluetooth ports only
    pub show_all_ports: bool,
}

impl Config {
    /// Replace values that can not be used with their defaults.
    pub fn sanitize(&mut self) {
        if !is_valid_radius(self.wheel_radius_mm) {
            warn!("Ignoring invalid wheel radius {} from config", self.wheel_radius_mm);
            self.wheel_radius_mm = DEFAULT_WHEEL_RADIUS;
        }

        if self.baud_rate == 0 {
            self.baud_rate = DEFAULT_BAUD_RATE;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            wheel_radius_mm: DEFAULT_WHEEL_RADIUS,
            device_name: DEVICE_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            show_all_ports: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"wheelRadiusMm": 40.5}"#).unwrap();
        assert_eq!(config.wheel_radius_mm, 40.5);
        assert_eq!(config.device_name, DEVICE_NAME);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert!(!config.show_all_ports);
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("\"wheelRadiusMm\":33.0"));
        assert!(json.contains("\"deviceName\":\"ESP32MesafeOlcer\""));
        assert!(json.contains("\"showAllPorts\":false"));
    }

    #[test]
    fn test_sanitize() {
        let mut config = Config {
            wheel_radius_mm: -2.0,
            device_name: "Wheel".to_string(),
            baud_rate: 0,
            show_all_ports: true,
        };
        config.sanitize();
        assert_eq!(config.wheel_radius_mm, DEFAULT_WHEEL_RADIUS);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.device_name, "Wheel");
    }
}
