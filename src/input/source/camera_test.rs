use std::{
    error::Error,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use crate::{
    config::GestureConfig,
    input::source::camera::{
        CaptureError, CaptureLoop, Frame, FrameProcessor, FrameSource, GestureControl,
    },
};

/// Source that fails every `fail_every`-th read
struct TestSource {
    next: u64,
    fail_every: u64,
    delay: Duration,
}

impl TestSource {
    fn new(fail_every: u64) -> Self {
        Self {
            next: 0,
            fail_every,
            delay: Duration::ZERO,
        }
    }
}

impl FrameSource for TestSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        thread::sleep(self.delay);
        self.next += 1;
        if self.fail_every > 0 && self.next % self.fail_every == 0 {
            return Err(CaptureError::Read("camera hiccup".into()));
        }
        Ok(Frame {
            index: self.next,
            width: 2,
            height: 2,
            data: vec![0; 12],
        })
    }
}

type Log = Arc<Mutex<Vec<(String, u64)>>>;

struct Recorder {
    name: String,
    log: Log,
    fail: bool,
}

impl FrameProcessor for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, frame: &Frame) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log.lock().unwrap().push((self.name.clone(), frame.index));
        if self.fail {
            return Err("processor failure".into());
        }
        Ok(())
    }
}

fn wait_for(log: &Log, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while log.lock().unwrap().len() < count {
        assert!(Instant::now() < deadline, "timed out waiting for frames");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_processors_run_in_registration_order() -> Result<(), Box<dyn Error>> {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut capture = CaptureLoop::new(Box::new(TestSource::new(4)), 500.0)?;
    capture.register_processor(Box::new(Recorder {
        name: "gesture".into(),
        log: log.clone(),
        fail: true,
    }));
    capture.register_processor(Box::new(Recorder {
        name: "gaze".into(),
        log: log.clone(),
        fail: false,
    }));
    assert_eq!(capture.processor_count(), 2);

    capture.start()?;
    assert!(capture.is_running());
    wait_for(&log, 20);
    capture.stop()?;
    assert!(!capture.is_running());

    let log = log.lock().unwrap().clone();
    assert!(log.len() % 2 == 0);
    for pair in log.chunks(2) {
        assert_eq!(pair[0].0, "gesture");
        assert_eq!(pair[1].0, "gaze");
        assert_eq!(pair[0].1, pair[1].1);
        // Failed reads never reach the processors
        assert_ne!(pair[0].1 % 4, 0);
    }

    Ok(())
}

#[test]
fn test_start_stop_are_idempotent() -> Result<(), Box<dyn Error>> {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut capture = CaptureLoop::new(Box::new(TestSource::new(0)), 200.0)?;
    capture.register_processor(Box::new(Recorder {
        name: "recorder".into(),
        log: log.clone(),
        fail: false,
    }));

    capture.stop()?;
    capture.start()?;
    capture.start()?;
    wait_for(&log, 3);
    capture.stop()?;
    capture.stop()?;

    // The loop can be restarted after a stop
    let seen = log.lock().unwrap().len();
    capture.start()?;
    wait_for(&log, seen + 3);
    capture.stop()?;

    Ok(())
}

#[test]
fn test_stop_times_out_on_blocked_source() -> Result<(), Box<dyn Error>> {
    let source = TestSource {
        next: 0,
        fail_every: 0,
        delay: Duration::from_millis(500),
    };
    let mut capture =
        CaptureLoop::new(Box::new(source), 30.0)?.with_join_timeout(Duration::from_millis(50));

    capture.start()?;
    thread::sleep(Duration::from_millis(20));
    let started = Instant::now();
    capture.stop()?;
    assert!(started.elapsed() < Duration::from_millis(400));
    assert!(!capture.is_running());

    Ok(())
}

#[test]
fn test_invalid_fps() {
    // 1e-30 fps would need a frame interval longer than a Duration can hold
    for fps in [0.0, -30.0, f64::NAN, 1e-30] {
        let result = CaptureLoop::new(Box::new(TestSource::new(0)), fps);
        assert!(matches!(result, Err(CaptureError::InvalidFps(_))));
    }
}

#[test]
fn test_capture_loop_from_config() -> Result<(), Box<dyn Error>> {
    let config = GestureConfig {
        fps: 60.0,
        join_timeout_ms: 250,
        ..Default::default()
    };
    let capture = CaptureLoop::from_config(Box::new(TestSource::new(0)), &config)?;
    assert_eq!(capture.fps(), 60.0);
    assert!(format!("{capture:?}").contains("250ms"));
    Ok(())
}
