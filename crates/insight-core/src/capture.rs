//! QR capture: a cancellable polling loop over camera frames.
//!
//! Decoded text either goes to a [`Handoff`] from inside the capture task, or
//! is returned from [`Scanner::stop`] / [`Scanner::decoded`] for the caller.

use crate::status::Status;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Cadence of frame polling while capturing.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("QR scanning not supported: {0}")]
    Unsupported(String),
    #[error("Camera error: access denied ({0})")]
    Denied(String),
    #[error("Camera error: {0}")]
    Device(String),
    /// A single frame could not be grabbed or decoded; polling continues.
    #[error("frame unavailable: {0}")]
    Frame(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// An acquired camera stream.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` when none is ready yet.
    async fn grab_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying device. Called exactly once.
    fn release(&mut self);
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;
}

pub trait BarcodeDecoder: Send + Sync {
    /// Decoded text of the first code in `frame`, `None` when no code is found.
    fn decode(&self, frame: &Frame) -> Result<Option<String>, CaptureError>;
}

/// Receives the decoded text once the camera has been released.
#[async_trait]
pub trait Handoff: Send + Sync {
    async fn deliver(&self, text: String) -> Status;
}

/// How a capture loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEnd {
    /// Cancelled before any code was decoded.
    Stopped,
    /// A code was decoded. `handoff` holds the delivery result when a
    /// [`Handoff`] was attached.
    Decoded {
        text: String,
        handoff: Option<Status>,
    },
}

/// Owns an acquired source and releases it however the loop ends.
struct Acquired(Box<dyn FrameSource>);

impl Drop for Acquired {
    fn drop(&mut self) {
        self.0.release();
        debug!(target: "insight::capture", "camera released");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Capturing,
    Stopping,
}

struct ActiveScan {
    cancel: CancellationToken,
    task: JoinHandle<Result<ScanEnd, CaptureError>>,
}

pub struct Scanner {
    state: ScannerState,
    active: Option<ActiveScan>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            state: ScannerState::Idle,
            active: None,
        }
    }

    /// `Stopping` once the loop has ended but its outcome is not yet collected.
    pub fn state(&self) -> ScannerState {
        match &self.active {
            None => ScannerState::Idle,
            Some(active) if active.task.is_finished() => ScannerState::Stopping,
            Some(_) => self.state,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.state() == ScannerState::Capturing
    }

    /// True when a loop has ended and [`Scanner::decoded`] returns without waiting.
    pub fn is_finished(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.task.is_finished())
    }

    /// Acquire the camera and start polling. A no-op while a loop is active.
    pub async fn start(
        &mut self,
        camera: &dyn Camera,
        decoder: Arc<dyn BarcodeDecoder>,
    ) -> Result<(), CaptureError> {
        self.start_with_handoff(camera, decoder, None).await
    }

    /// Like [`Scanner::start`], delivering the decoded text to `handoff`
    /// from the capture task.
    pub async fn start_with_handoff(
        &mut self,
        camera: &dyn Camera,
        decoder: Arc<dyn BarcodeDecoder>,
        handoff: Option<Arc<dyn Handoff>>,
    ) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Ok(());
        }
        let source = Acquired(camera.open().await?);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_scan(source, decoder, cancel.clone(), handoff));
        self.active = Some(ActiveScan { cancel, task });
        self.state = ScannerState::Capturing;
        debug!(target: "insight::capture", "capture started");
        Ok(())
    }

    /// Wait for the loop to end on its own and return its outcome. Returns to `Idle`.
    pub async fn decoded(&mut self) -> Result<ScanEnd, CaptureError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(ScanEnd::Stopped);
        };
        let joined = (&mut active.task).await;
        self.active = None;
        self.state = ScannerState::Idle;
        joined.unwrap_or_else(|err| Err(task_failed(&err)))
    }

    /// Halt polling, wait until the camera has been released and return the
    /// outcome. A code decoded before the stop is still reported, and a
    /// handoff already in flight runs to completion.
    pub async fn stop(&mut self) -> Result<ScanEnd, CaptureError> {
        let Some(active) = self.active.take() else {
            self.state = ScannerState::Idle;
            return Ok(ScanEnd::Stopped);
        };
        self.state = ScannerState::Stopping;
        active.cancel.cancel();
        let joined = active.task.await;
        self.state = ScannerState::Idle;
        debug!(target: "insight::capture", "capture stopped");
        joined.unwrap_or_else(|err| {
            warn!(target: "insight::capture", error = %err, "capture task ended abnormally");
            Err(task_failed(&err))
        })
    }
}

impl Drop for Scanner {
    // Aborting drops the task future at its next await; `Acquired` goes with it
    // and releases the camera.
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.task.abort();
        }
    }
}

fn task_failed(err: &tokio::task::JoinError) -> CaptureError {
    CaptureError::Device(format!("capture task failed: {err}"))
}

async fn run_scan(
    source: Acquired,
    decoder: Arc<dyn BarcodeDecoder>,
    cancel: CancellationToken,
    handoff: Option<Arc<dyn Handoff>>,
) -> Result<ScanEnd, CaptureError> {
    // `poll_frames` owns the source, so the camera is released before delivery.
    let Some(text) = poll_frames(source, decoder, cancel).await? else {
        return Ok(ScanEnd::Stopped);
    };
    let handoff = match handoff {
        Some(handoff) => Some(handoff.deliver(text.clone()).await),
        None => None,
    };
    Ok(ScanEnd::Decoded { text, handoff })
}

async fn poll_frames(
    mut source: Acquired,
    decoder: Arc<dyn BarcodeDecoder>,
    cancel: CancellationToken,
) -> Result<Option<String>, CaptureError> {
    let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            _ = ticker.tick() => {}
        }
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            attempt = scan_once(&mut source, decoder.as_ref()) => attempt,
        };
        match attempt {
            Ok(Some(text)) => {
                debug!(target: "insight::capture", bytes = text.len(), "code decoded");
                return Ok(Some(text));
            }
            Ok(None) => {}
            Err(CaptureError::Frame(reason)) => {
                trace!(target: "insight::capture", %reason, "frame skipped");
            }
            Err(err) => return Err(err),
        }
    }
}

async fn scan_once(
    source: &mut Acquired,
    decoder: &dyn BarcodeDecoder,
) -> Result<Option<String>, CaptureError> {
    let Some(frame) = source.0.grab_frame().await? else {
        return Ok(None);
    };
    Ok(decoder.decode(&frame)?.filter(|text| !text.is_empty()))
}
