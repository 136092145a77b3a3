use std::{
    error::Error,
    sync::atomic::Ordering,
    time::Duration,
};

use crate::{
    config::DigitizerConfig,
    constants::{DEFAULT_JOIN_TIMEOUT_MS, PROTOCOL_VERSION},
    drivers::digitizer::driver::Driver,
    input::{
        dispatcher::CommandDispatcher, source::serial::SerialListener,
        target::digitizer::DigitizerDevice,
    },
};

/// Run the digitizer daemon: answer serial commands until the link closes or
/// the process is interrupted. The digitizer is reset on startup and again
/// on the way out.
pub async fn run_daemon(config: DigitizerConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting touchless v{VERSION} (protocol v{PROTOCOL_VERSION})");

    let driver = Driver::open(&config.hid_device, config.click_duration())?;
    let device = DigitizerDevice::new(driver);
    let client = device.client();
    let device_task = device.spawn();

    if let Err(e) = client.reset().await {
        log::error!("Failed to reset digitizer: {e}");
        if let Err(e) = client.stop().await {
            log::debug!("Digitizer already stopped: {e}");
        }
        return Err(e.into());
    }

    let listener = match SerialListener::open(
        &config.serial.device,
        config.serial.baud_rate,
        config.serial.timeout(),
    ) {
        Ok(listener) => listener,
        Err(e) => {
            if let Err(e) = client.stop().await {
                log::debug!("Digitizer already stopped: {e}");
            }
            return Err(e.into());
        }
    };
    let running = listener.stop_handle();

    // Frame sources and landmark models are provided by library users; the
    // daemon itself only serves the serial protocol.
    if config.gesture.enabled || config.gaze.enabled {
        log::warn!("Gesture and gaze input need a camera frame source, which this build does not provide");
    }
    let mut dispatcher = CommandDispatcher::new(client.clone(), None);

    let mut serial_task = tokio::task::spawn_blocking(move || {
        let mut listener = listener;
        let result = listener.listen(|line| dispatcher.handle_command(line));
        dispatcher.shutdown();
        result
    });

    let serial_result = tokio::select! {
        result = &mut serial_task => Some(result),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Unable to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
            running.store(false, Ordering::SeqCst);
            None
        }
    };
    let serial_result = match serial_result {
        Some(result) => Some(result),
        None => {
            let timeout = Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS) + config.serial.timeout();
            tokio::time::timeout(timeout, serial_task).await.ok()
        }
    };
    match serial_result {
        Some(Ok(Ok(()))) => log::info!("Serial listener stopped"),
        Some(Ok(Err(e))) => log::error!("Serial listener failed: {e}"),
        Some(Err(e)) => log::error!("Serial listener task failed: {e}"),
        None => log::warn!("Serial listener did not stop within timeout"),
    }

    // Stopping the device always resets it, whatever state the loops left
    if let Err(e) = client.stop().await {
        log::error!("Failed to stop digitizer: {e}");
    }
    match device_task.await {
        Ok(driver) => log::debug!("Final digitizer state: {:?}", driver.state()),
        Err(e) => log::error!("Digitizer task failed: {e}"),
    }

    log::info!("touchless stopped");
    Ok(())
}
