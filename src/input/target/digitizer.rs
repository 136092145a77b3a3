use std::{fs::File, io::Write};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::drivers::digitizer::{driver::Driver, DigitizerError};

use super::{client::DigitizerClient, command::TargetCommand};

const BUFFER_SIZE: usize = 128;

/// Single owner of the HID [Driver]. Every command from the serial loop or
/// the capture loop goes through this device's channel, so reports are
/// written one at a time and the digitizer state has exactly one writer.
#[derive(Debug)]
pub struct DigitizerDevice<W: Write + Send + 'static = File> {
    driver: Driver<W>,
    tx: mpsc::Sender<TargetCommand>,
    rx: mpsc::Receiver<TargetCommand>,
}

impl<W: Write + Send + 'static> DigitizerDevice<W> {
    pub fn new(driver: Driver<W>) -> Self {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        Self { driver, tx, rx }
    }

    /// Returns a client channel that can be used to send commands to this device
    pub fn client(&self) -> DigitizerClient {
        self.tx.clone().into()
    }

    /// Run the device in its own blocking thread. The task resolves to the
    /// driver once the device stops.
    pub fn spawn(self) -> JoinHandle<Driver<W>> {
        tokio::task::spawn_blocking(move || self.run())
    }

    /// Process commands until a [TargetCommand::Stop] is received or every
    /// client is dropped. The digitizer is always reset before returning.
    pub fn run(self) -> Driver<W> {
        let Self {
            mut driver,
            tx,
            mut rx,
        } = self;
        // Only clients keep the channel open
        drop(tx);

        log::debug!("Started listening for digitizer commands");
        while let Some(command) = rx.blocking_recv() {
            match command {
                TargetCommand::Move(x, y, reply) => {
                    Self::reply(reply, driver.move_to(x, y));
                }
                TargetCommand::Click(button, reply) => {
                    Self::reply(reply, driver.click(button));
                }
                TargetCommand::ClickNamed(name, reply) => {
                    Self::reply(reply, driver.click_named(name.as_str()));
                }
                TargetCommand::Release(reply) => {
                    Self::reply(reply, driver.release());
                }
                TargetCommand::Reset(reply) => {
                    Self::reply(reply, driver.reset());
                }
                TargetCommand::GetState(reply) => {
                    if let Err(e) = reply.blocking_send(driver.state()) {
                        log::error!("Failed to send digitizer state: {e:?}");
                    }
                }
                TargetCommand::Stop => break,
            }
        }
        log::debug!("Stopped listening for digitizer commands");

        // Leave the hardware with the cursor parked and no buttons held
        if let Err(e) = driver.reset() {
            log::error!("Error resetting HID device: {e}");
        }

        driver
    }

    fn reply(reply: mpsc::Sender<Result<(), DigitizerError>>, result: Result<(), DigitizerError>) {
        if let Err(e) = &result {
            log::error!("Digitizer command failed: {e}");
        }
        if reply.blocking_send(result).is_err() {
            log::debug!("Client went away before the command finished");
        }
    }
}
