//! Runs the detection scheduler on its own thread.
//!
//! Frames go in over one `mpsc` channel and typed [`WorkerMessage`]s come back
//! over another, so the caller's loop never blocks on inference. The caller
//! is expected to keep at most one frame outstanding (see
//! [`crate::throughput::ThroughputController`]).

use crate::{
    detection::{BodyDetector, Detection, Frame, HandDetector, HybridScheduler},
    tuning::DetectionMode,
    Error, Result,
};
use log::{debug, info, warn};
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

/// A frame submitted for detection
#[derive(Debug, Clone)]
pub struct FrameRequest {
    pub frame: Frame,
    pub timestamp: f64,
}

/// Reply from the worker thread
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    Pose { detection: Detection, timestamp: f64 },
    Error { message: String, retryable: bool },
}

enum Command {
    Detect(FrameRequest),
    SetMode(DetectionMode),
    Reset,
    Shutdown,
}

/// Handle to the detection thread
pub struct DetectionWorker {
    commands: Sender<Command>,
    messages: Receiver<WorkerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    /// Move `scheduler` onto a new thread and start serving frames.
    ///
    /// Detector initialization happens on the worker thread and is retried
    /// lazily on each frame until it succeeds.
    pub fn spawn<H, B>(scheduler: HybridScheduler<H, B>) -> Result<Self>
    where
        H: HandDetector + 'static,
        B: BodyDetector + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (message_tx, message_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("pose-detection".to_string())
            .spawn(move || run(scheduler, &command_rx, &message_tx))?;

        Ok(Self {
            commands: command_tx,
            messages: message_rx,
            handle: Some(handle),
        })
    }

    /// Queue a frame for detection
    pub fn submit(&self, frame: Frame, timestamp: f64) -> Result<()> {
        self.send(Command::Detect(FrameRequest { frame, timestamp }))
    }

    /// Switch scheduler cadence on the worker
    pub fn update_mode(&self, mode: DetectionMode) -> Result<()> {
        self.send(Command::SetMode(mode))
    }

    /// Drop the worker-side detector cache
    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Next reply if one is ready
    pub fn try_recv(&self) -> Result<Option<WorkerMessage>> {
        match self.messages.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::WorkerDisconnected),
        }
    }

    /// Wait up to `timeout` for the next reply
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerMessage>> {
        match self.messages.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerDisconnected),
        }
    }

    /// Stop the thread and wait for it to exit
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::WorkerDisconnected)
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // The thread may already be gone; joining is all that matters
            let _ = self.commands.send(Command::Shutdown);
            if handle.join().is_err() {
                warn!("Detection worker panicked");
            }
            info!("Detection worker stopped");
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<H: HandDetector, B: BodyDetector>(
    mut scheduler: HybridScheduler<H, B>,
    commands: &Receiver<Command>,
    messages: &Sender<WorkerMessage>,
) {
    if let Err(e) = scheduler.initialize() {
        debug!("Initial detector load failed, will retry: {e}");
    }

    while let Ok(command) = commands.recv() {
        let reply = match command {
            Command::Detect(request) => detect(&mut scheduler, &request),
            Command::SetMode(mode) => {
                scheduler.update_mode(mode);
                continue;
            }
            Command::Reset => {
                scheduler.reset();
                continue;
            }
            Command::Shutdown => break,
        };
        if messages.send(reply).is_err() {
            break;
        }
    }
}

fn detect<H: HandDetector, B: BodyDetector>(
    scheduler: &mut HybridScheduler<H, B>,
    request: &FrameRequest,
) -> WorkerMessage {
    if !scheduler.is_ready() {
        if let Err(e) = scheduler.initialize() {
            return WorkerMessage::Error {
                message: e.to_string(),
                retryable: e.is_retryable(),
            };
        }
    }

    match scheduler.detect(&request.frame) {
        Ok(detection) => WorkerMessage::Pose {
            detection,
            timestamp: request.timestamp,
        },
        Err(e) => WorkerMessage::Error {
            message: e.to_string(),
            retryable: e.is_retryable(),
        },
    }
}
