use std::env;
use clap::Parser;
use crate::gui::application::{run_application, StartupOptions};
use crate::error::AppRunError;

pub mod config;
pub mod device;
pub mod error;
pub mod gui;
pub mod measurement;
pub mod state;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Shows the distance measured by a wheel distance meter over a Bluetooth serial link")]
pub struct Cli {
    /// Serial port to connect to at startup, e.g. /dev/rfcomm0 or COM5
    #[arg(long)]
    pub port: Option<String>,

    /// Name of the paired device to connect to after a scan
    #[arg(long)]
    pub device_name: Option<String>,

    /// Baud rate used to open the port
    #[arg(long)]
    pub baud: Option<u32>,

    /// List every serial port, not only Bluetooth ports
    #[arg(long)]
    pub all_ports: bool,

    /// Log received and sent lines
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn startup_options(&self) -> StartupOptions {
        StartupOptions {
            port: self.port.clone(),
            device_name: self.device_name.clone(),
            baud_rate: self.baud,
            show_all_ports: self.all_ports,
        }
    }
}

pub fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for("distance_meter", level)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        match fern::log_file(&log_file) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(err) => eprintln!("Failed to open LOG_FILE {}: {}", log_file, err),
        }
    }

    if let Err(err) = dispatch.apply() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

pub fn run(cli: Cli) -> Result<(), AppRunError> {
    run_application(cli.startup_options())?;
    Ok(())
}
