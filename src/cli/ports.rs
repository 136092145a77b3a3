use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::client::list_ports;

#[derive(Tabled)]
struct PortRow {
    device: String,
    description: String,
}

pub fn handle_ports() -> Result<(), Box<dyn Error + Send + Sync>> {
    let ports: Vec<PortRow> = list_ports()?
        .into_iter()
        .map(|port| PortRow {
            device: port.device,
            description: port.description,
        })
        .collect();
    let count = ports.len();

    let mut table = Table::new(ports);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Serial Ports"));
    println!("{table}");
    println!("Found {count} serial port(s)");

    Ok(())
}
