//! Line protocol spoken with the measuring device.
//!
//! Both directions use one ASCII token per line. The device sends the current distance (meters)
//! as a bare number and answers commands with `RESET_OK` or one of the `RADIUS*` replies.

use std::fmt;

use crate::device::constants::{
    COMMAND_ADD_RADIUS, COMMAND_GET_RADIUS, COMMAND_RESET, COMMAND_SET_RADIUS, REPLY_RADIUS,
    REPLY_RADIUS_ADDED, REPLY_RADIUS_ERROR, REPLY_RADIUS_OK, REPLY_RESET_OK,
};
use crate::error::ProtocolError;
use crate::measurement::format_radius;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Reset,
    GetRadius,
    AddRadius,
    SetRadius(f64),
}

impl Command {
    /// The bytes to put on the wire, including the line terminator.
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Reset => write!(f, "{}", COMMAND_RESET),
            Command::GetRadius => write!(f, "{}", COMMAND_GET_RADIUS),
            Command::AddRadius => write!(f, "{}", COMMAND_ADD_RADIUS),
            Command::SetRadius(radius) => write!(f, "{}{}", COMMAND_SET_RADIUS, format_radius(*radius)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Distance travelled, in meters
    Distance(f64),
    ResetOk,
    /// Wheel radius (mm) currently configured on the device
    Radius(f64),
    /// Wheel radius (mm) the device accepted after SET_RADIUS
    RadiusOk(f64),
    /// Wheel radius (mm) the device added to the distance after ADD_RADIUS
    RadiusAdded(f64),
    RadiusError(String),
    Unrecognized(String),
}

fn parse_radius(line: &str, value: &str) -> Result<f64, ProtocolError> {
    match value.trim().parse::<f64>() {
        Ok(radius) if radius.is_finite() && radius > 0.0 => Ok(radius),
        _ => Err(ProtocolError::InvalidRadius { line: line.to_string() }),
    }
}

/// Classify one trimmed line received from the device.
///
/// A line that looks like a known reply but carries an unusable number is an error; the caller
/// is expected to log and drop it.
pub fn parse_reply(line: &str) -> Result<Reply, ProtocolError> {
    if let Ok(distance) = line.parse::<f64>() {
        if !distance.is_finite() || distance < 0.0 {
            return Err(ProtocolError::InvalidDistance { value: line.to_string() });
        }
        // "-0" would otherwise be shown as "-0.0 cm"
        return Ok(Reply::Distance(distance + 0.0));
    }

    if line == REPLY_RESET_OK {
        return Ok(Reply::ResetOk);
    }

    if let Some(value) = line.strip_prefix(REPLY_RADIUS) {
        return parse_radius(line, value).map(Reply::Radius);
    }

    if let Some(value) = line.strip_prefix(REPLY_RADIUS_OK) {
        return parse_radius(line, value).map(Reply::RadiusOk);
    }

    if let Some(value) = line.strip_prefix(REPLY_RADIUS_ADDED) {
        return parse_radius(line, value).map(Reply::RadiusAdded);
    }

    if let Some(message) = line.strip_prefix(REPLY_RADIUS_ERROR) {
        return Ok(Reply::RadiusError(message.to_string()));
    }

    Ok(Reply::Unrecognized(line.to_string()))
}
