pub mod connection;
pub mod constants;
pub mod line_buffer;
pub mod protocol;
pub mod scan;
pub mod types;
