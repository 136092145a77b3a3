use std::{
    error::Error,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{config::GestureConfig, constants::DEFAULT_JOIN_TIMEOUT_MS, sync::join_timeout};

/// Longest uninterrupted sleep inside the capture loop, so stop requests are
/// noticed promptly
const MAX_PAUSE: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("fps must be positive, got {0}")]
    InvalidFps(f64),
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[from] io::Error),
}

/// A single captured camera frame (packed RGB)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Produces camera frames. Reads may block.
pub trait FrameSource: Send {
    fn read(&mut self) -> Result<Frame, CaptureError>;
}

/// Consumes frames on the capture thread. Processors run one after another
/// in registration order, so a slow processor delays the next capture.
pub trait FrameProcessor: Send {
    fn name(&self) -> &str;
    fn process(&mut self, frame: &Frame) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Control surface for a subsystem that can be started and stopped on demand
pub trait GestureControl: Send {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<(), CaptureError>;
    fn is_running(&self) -> bool;
}

type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;
type SharedProcessors = Arc<Mutex<Vec<Box<dyn FrameProcessor>>>>;

/// Delivers frames from a [FrameSource] to the registered [FrameProcessor]s
/// at a target frame rate on a dedicated thread.
pub struct CaptureLoop {
    source: SharedSource,
    processors: SharedProcessors,
    fps: f64,
    interval: Duration,
    join_timeout: Duration,
    running: Option<Arc<AtomicBool>>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CaptureLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureLoop")
            .field("fps", &self.fps)
            .field("join_timeout", &self.join_timeout)
            .field("running", &self.is_running())
            .finish()
    }
}

impl CaptureLoop {
    pub fn new(source: Box<dyn FrameSource>, fps: f64) -> Result<Self, CaptureError> {
        if fps.is_nan() || fps <= 0.0 {
            return Err(CaptureError::InvalidFps(fps));
        }
        let interval =
            Duration::try_from_secs_f64(1.0 / fps).map_err(|_| CaptureError::InvalidFps(fps))?;
        Ok(Self {
            source: Arc::new(Mutex::new(source)),
            processors: Arc::new(Mutex::new(Vec::new())),
            fps,
            interval,
            join_timeout: Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS),
            running: None,
            handle: None,
        })
    }

    /// Create a capture loop with the frame rate and join timeout from the
    /// gesture configuration
    pub fn from_config(
        source: Box<dyn FrameSource>,
        config: &GestureConfig,
    ) -> Result<Self, CaptureError> {
        Ok(Self::new(source, config.fps)?.with_join_timeout(config.join_timeout()))
    }

    /// Set how long [GestureControl::stop] waits for the capture thread
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Add a processor. Processors receive every frame in registration order.
    pub fn register_processor(&mut self, processor: Box<dyn FrameProcessor>) {
        log::debug!("Registered frame processor: {}", processor.name());
        lock(&*self.processors).push(processor);
    }

    pub fn processor_count(&self) -> usize {
        lock(&*self.processors).len()
    }

    fn start_loop(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            log::warn!("Capture loop already started, ignoring start");
            return Ok(());
        }

        // Each run gets its own flag so a worker that outlived a previous
        // stop can never be revived by a later start.
        let running = Arc::new(AtomicBool::new(true));
        let source = self.source.clone();
        let processors = self.processors.clone();
        let interval = self.interval;
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("capture".into())
            .spawn(move || capture_loop(source, processors, interval, flag))?;

        self.running = Some(running);
        self.handle = Some(handle);
        log::info!("Capture started at {} FPS", self.fps);
        Ok(())
    }

    fn stop_loop(&mut self) {
        let Some(running) = self.running.take() else {
            log::debug!("Capture loop not running, ignoring stop");
            return;
        };
        log::info!("Stopping capture...");
        running.store(false, Ordering::SeqCst);

        let Some(handle) = self.handle.take() else {
            return;
        };
        match join_timeout(handle, self.join_timeout) {
            Ok(()) => log::info!("Capture stopped"),
            Err((e, _)) => log::warn!("Capture thread did not stop within timeout: {e}"),
        }
    }
}

impl GestureControl for CaptureLoop {
    fn start(&mut self) -> Result<(), CaptureError> {
        self.start_loop()
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.stop_loop();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| running.load(Ordering::SeqCst))
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop_loop();
    }
}

fn capture_loop(
    shared_source: SharedSource,
    processors: SharedProcessors,
    interval: Duration,
    running: Arc<AtomicBool>,
) {
    log::debug!("Capture loop started (interval: {:.3}s)", interval.as_secs_f64());
    let mut source = lock(&*shared_source);

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        let frame = match source.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Failed to read frame, continuing: {e}");
                pause(&running, interval);
                continue;
            }
        };

        for processor in lock(&*processors).iter_mut() {
            if let Err(e) = processor.process(&frame) {
                log::error!("Frame processor {} failed: {e}", processor.name());
            }
        }

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            pause(&running, remaining);
        }
    }

    log::debug!("Capture loop exited");
}

/// Sleep for `duration` or until the loop is asked to stop
fn pause(running: &AtomicBool, duration: Duration) {
    let deadline = Instant::now() + duration;
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(MAX_PAUSE.min(deadline - now));
    }
}

/// Lock a mutex, recovering the data if a processor panicked while holding it
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
