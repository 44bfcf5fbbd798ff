/**
 * Name the measuring device advertises; a paired device with this name is connected automatically.
 */
pub const DEVICE_NAME: &str = "ESP32MesafeOlcer";

/**
 * The Bluetooth Serial Port Profile service class. The operating system maps SPP devices to a
 * serial port, so this is only used for logging.
 */
pub const SPP_UUID: &str = "00001101-0000-1000-8000-00805f9b34fb";

/**
 * Baud rate used when opening the port. Ignored by rfcomm links, but required by USB serial
 * adapters.
 */
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/**
 * How many bytes to read from the port at once.
 */
pub const READ_BUFFER_SIZE: usize = 1024;

/**
 * Unterminated input longer than this (bytes) is discarded.
 */
pub const MAX_LINE_LENGTH: usize = 1024;

/**
 * How long (milliseconds) a single blocking read may take before the reader checks whether it
 * has been cancelled.
 */
pub const READ_TIMEOUT: u64 = 200;

/**
 * How long (milliseconds) a write to the port may take.
 */
pub const WRITE_DEADLINE: u64 = 2000;

pub const COMMAND_RESET: &str = "RESET";
pub const COMMAND_GET_RADIUS: &str = "GET_RADIUS";
pub const COMMAND_ADD_RADIUS: &str = "ADD_RADIUS";
pub const COMMAND_SET_RADIUS: &str = "SET_RADIUS:";

pub const REPLY_RESET_OK: &str = "RESET_OK";
pub const REPLY_RADIUS: &str = "RADIUS:";
pub const REPLY_RADIUS_OK: &str = "RADIUS_OK:";
pub const REPLY_RADIUS_ADDED: &str = "RADIUS_ADDED:";
pub const REPLY_RADIUS_ERROR: &str = "RADIUS_ERROR:";
