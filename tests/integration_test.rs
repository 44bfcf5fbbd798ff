//! Integration tests for the flow from raw device bytes to what the window shows.

use std::io::{self, Read};

use distance_meter::config::types::Config;
use distance_meter::device::connection::{read_lines, write_line, ReaderEvent};
use distance_meter::device::protocol::Command;
use distance_meter::device::types::{DeviceCommand, DeviceState, PairedDevice};
use distance_meter::state::MeterState;
use tokio_util::sync::CancellationToken;

/// Returns the data in fixed size pieces, then reports a closed connection.
struct SlowDevice {
    data: Vec<u8>,
    position: usize,
    piece: usize,
}

impl Read for SlowDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.data.len() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "socket closed"));
        }

        let end = (self.position + self.piece).min(self.data.len()).min(self.position + buf.len());
        let count = end - self.position;
        buf[..count].copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        Ok(count)
    }
}

fn run_session(state: &mut MeterState, data: &str, piece: usize) {
    let device = SlowDevice { data: data.as_bytes().to_vec(), position: 0, piece };
    let cancel = CancellationToken::new();

    read_lines(device, &cancel, |event| {
        match event {
            ReaderEvent::Reply(reply) => state.apply_reply(reply),
            ReaderEvent::Closed(_) => state.device_state_changed(DeviceState::Lost),
        }
        true
    });
}

fn connected() -> MeterState {
    let mut state = MeterState::new(&Config::default());
    let device = PairedDevice::from_port_name("/dev/rfcomm0");
    state.connect(device.clone());
    state.device_state_changed(DeviceState::Connected(device));
    state
}

#[test]
fn test_session_with_fragmented_reads() {
    let mut state = connected();
    run_session(&mut state, "RADIUS:30.0\r\n0.12\n0.57\n1.034\nRADIUS_ADDED:30.0\n", 3);

    assert_eq!(state.wheel_radius_mm(), 30.0);
    assert_eq!(state.distance_display().to_string(), "1.03 m");
    assert_eq!(state.status(), "Connection lost");
    assert!(!state.is_connected());
}

#[test]
fn test_malformed_lines_do_not_disturb_the_session() {
    let mut state = connected();
    run_session(&mut state, "0.5\nRADIUS_OK:abc\n???\nRADIUS_ERROR:must be positive\n", 64);

    assert_eq!(state.distance_display().to_string(), "50.0 cm");
    assert_eq!(state.wheel_radius_mm(), 33.0);
    assert_eq!(state.status(), "Connection lost");
}

#[test]
fn test_commands_written_for_user_actions() {
    let mut state = connected();
    let mut written: Vec<u8> = Vec::new();

    let commands = vec![state.reset(), state.add_radius(), state.set_radius(34.5)];
    for command in commands {
        match command {
            Some(DeviceCommand::Send(command)) => write_line(&mut written, &command).unwrap(),
            other => panic!("unexpected command {:?}", other),
        }
    }
    write_line(&mut written, &Command::GetRadius).unwrap();

    assert_eq!(
        String::from_utf8(written).unwrap(),
        "RESET\nADD_RADIUS\nSET_RADIUS:34.5\nGET_RADIUS\n",
    );
}
