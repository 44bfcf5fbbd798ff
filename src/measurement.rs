use std::fmt;

/// Distances of at least this many centimeters are shown in meters.
pub const METERS_THRESHOLD_CM: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Centimeters,
    Meters,
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            DistanceUnit::Centimeters => "cm",
            DistanceUnit::Meters => "m",
        };

        write!(f, "{}", result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceDisplay {
    pub value: String,
    pub unit: DistanceUnit,
}

impl fmt::Display for DistanceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Convert a distance in meters to the text shown on screen: centimeters with one decimal below
/// one meter, meters with two decimals otherwise.
pub fn format_distance(meters: f64) -> DistanceDisplay {
    let centimeters = meters * 100.0;

    if centimeters >= METERS_THRESHOLD_CM {
        DistanceDisplay {
            value: format!("{:.2}", centimeters / 100.0),
            unit: DistanceUnit::Meters,
        }
    } else {
        DistanceDisplay {
            value: format!("{:.1}", centimeters),
            unit: DistanceUnit::Centimeters,
        }
    }
}

/// Shortest text for a radius that always carries a decimal, e.g. `33.0` or `12.75`.
pub fn format_radius(millimeters: f64) -> String {
    if millimeters.fract() == 0.0 && millimeters.abs() < 1e15 {
        format!("{:.1}", millimeters)
    } else {
        format!("{}", millimeters)
    }
}

/// Whether `text` may be typed into the radius field: digits with at most one decimal point.
pub fn accepts_radius_input(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_digit() || c == '.')
        && text.chars().filter(|&c| c == '.').count() <= 1
}

/// Parse the radius field. Only finite values greater than zero are usable.
pub fn parse_radius_input(text: &str) -> Option<f64> {
    if !accepts_radius_input(text) {
        return None;
    }

    match text.parse::<f64>() {
        Ok(radius) if radius.is_finite() && radius > 0.0 => Some(radius),
        _ => None,
    }
}

pub fn is_valid_radius(millimeters: f64) -> bool {
    millimeters.is_finite() && millimeters > 0.0
}
