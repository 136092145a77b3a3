use std::{
    error::Error,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    drivers::digitizer::{driver::Driver, DigitizerState, REPORT_SIZE},
    input::{
        dispatcher::CommandDispatcher,
        source::camera::{CaptureError, GestureControl},
        target::digitizer::DigitizerDevice,
    },
};

#[derive(Debug, Default, Clone)]
struct FakeGesture {
    running: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
    fail: bool,
}

impl GestureControl for FakeGesture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::Spawn(io::Error::other("no threads left")));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// HID sink whose writes always fail
struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "gadget unbound"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_handle_command() -> Result<(), Box<dyn Error>> {
    let device = DigitizerDevice::new(Driver::new(Vec::new(), Duration::ZERO));
    let client = device.client();
    let task = device.spawn();

    let gesture = FakeGesture::default();
    let mut dispatcher = CommandDispatcher::new(client.clone(), Some(Box::new(gesture.clone())));
    assert!(dispatcher.has_gesture_control());

    let responses = tokio::task::spawn_blocking(move || {
        [
            "move 100 200",
            "CLICK left",
            "MOVE 40000 1",
            "CLICK middle",
            "",
            "JUMP",
            "RELEASE",
            "GESTURE_START",
            "gesture_stop",
        ]
        .iter()
        .map(|line| dispatcher.handle_command(line))
        .collect::<Vec<_>>()
    })
    .await?;

    assert_eq!(
        responses,
        vec![
            "OK".to_string(),
            "OK".to_string(),
            "ERROR X coordinate 40000 out of range [0, 32767]".to_string(),
            "ERROR Invalid button 'MIDDLE'. Must be one of: left, right".to_string(),
            "ERROR Empty command".to_string(),
            "ERROR Unknown command: JUMP".to_string(),
            "OK".to_string(),
            "OK".to_string(),
            "OK".to_string(),
        ]
    );
    assert_eq!(gesture.starts.load(Ordering::SeqCst), 1);
    assert!(!gesture.is_running());

    // Rejected commands never reach the device
    let state = client.get_state().await?;
    assert_eq!(
        state,
        DigitizerState {
            x: 100,
            y: 200,
            buttons: 0
        }
    );

    client.stop().await?;
    let driver = task.await?;
    // move, press, release, release and the reset on shutdown
    assert_eq!(driver.sink().len(), 5 * REPORT_SIZE);

    Ok(())
}

#[tokio::test]
async fn test_gesture_unavailable() -> Result<(), Box<dyn Error>> {
    let device = DigitizerDevice::new(Driver::new(Vec::new(), Duration::ZERO));
    let client = device.client();
    let task = device.spawn();

    let mut dispatcher = CommandDispatcher::new(client.clone(), None);
    assert!(!dispatcher.has_gesture_control());

    let responses = tokio::task::spawn_blocking(move || {
        let responses = vec![
            dispatcher.handle_command("GESTURE_START"),
            dispatcher.handle_command("GESTURE_STOP"),
            dispatcher.handle_command("MOVE 1 2"),
        ];
        dispatcher.shutdown();
        responses
    })
    .await?;

    assert_eq!(
        responses,
        vec![
            "ERROR Gesture recognition unavailable",
            "ERROR Gesture recognition unavailable",
            "OK"
        ]
    );

    client.stop().await?;
    task.await?;

    Ok(())
}

#[tokio::test]
async fn test_internal_errors_keep_loop_alive() -> Result<(), Box<dyn Error>> {
    let device = DigitizerDevice::new(Driver::new(BrokenSink, Duration::ZERO));
    let client = device.client();
    let task = device.spawn();

    let gesture = FakeGesture {
        fail: true,
        ..Default::default()
    };
    let mut dispatcher = CommandDispatcher::new(client.clone(), Some(Box::new(gesture)));

    let responses = tokio::task::spawn_blocking(move || {
        vec![
            dispatcher.handle_command("MOVE 10 10"),
            dispatcher.handle_command("GESTURE_START"),
            dispatcher.handle_command("CLICK x"),
        ]
    })
    .await?;

    assert_eq!(
        responses,
        vec![
            "ERROR Internal error",
            "ERROR Internal error",
            "ERROR Invalid button 'X'. Must be one of: left, right"
        ]
    );

    // Failed writes never update the state
    assert_eq!(client.get_state().await?, DigitizerState::default());

    client.stop().await?;
    task.await?;

    Ok(())
}
