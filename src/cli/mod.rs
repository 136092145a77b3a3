pub mod descriptor;
pub mod ports;
pub mod run;
pub mod send;

use std::{error::Error, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};

use crate::{
    config::DigitizerConfig,
    constants::{DEFAULT_SERIAL_TIMEOUT_MS, SERIAL_BAUDRATE},
};

use descriptor::handle_descriptor;
use ports::handle_ports;
use run::run_daemon;
use send::{handle_send, SendCommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the digitizer daemon (default)
    Run,
    /// Print the HID report descriptor for the USB gadget
    Descriptor {
        /// Write the raw descriptor bytes instead of hex
        #[arg(long)]
        binary: bool,
    },
    /// Send a command to a digitizer over a serial port
    Send {
        /// Serial port of the digitizer (e.g. "/dev/ttyACM0")
        port: String,
        #[arg(short, long, default_value_t = SERIAL_BAUDRATE)]
        baud_rate: u32,
        /// How long to wait for the response in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_SERIAL_TIMEOUT_MS)]
        timeout_ms: u64,
        #[command(subcommand)]
        cmd: SendCommand,
    },
    /// List available serial ports
    Ports,
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    match args.cmd.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = DigitizerConfig::load(args.config.as_deref())?;
            run_daemon(config).await?;
        }
        Commands::Descriptor { binary } => handle_descriptor(binary)?,
        Commands::Send {
            port,
            baud_rate,
            timeout_ms,
            cmd,
        } => handle_send(&port, baud_rate, Duration::from_millis(timeout_ms), cmd)?,
        Commands::Ports => handle_ports()?,
    }

    Ok(())
}
