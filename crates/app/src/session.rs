//! One select-capture-save run

use crate::clipboard;
use crate::config::Config;
use crate::state::StateMachine;
use capture_x11::{CaptureError, FrameGrabber, Rect, RootSurface, X11Display, SETTLE_DELAY};
use export::{ExportError, PngEncoder};
use overlay::{
    is_valid_selection, CancellationToken, OverlayError, OverlayResult, PointerEventLoop,
    SelectionOutcome, SelectionOverlay,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot use X display: {0}")]
    Connection(String),

    #[error("cannot create selection overlay: {0}")]
    SurfaceCreation(String),

    #[error("selection is empty ({width}x{height}), nothing captured")]
    EmptySelection { width: u32, height: u32 },

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("writing {} failed: {source}", .path.display())]
    Encoding { path: PathBuf, source: ExportError },

    #[error("selection cancelled")]
    Cancelled,
}

impl SessionError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionError::Connection(_) | SessionError::SurfaceCreation(_) => 1,
            SessionError::EmptySelection { .. } => 2,
            SessionError::Capture(_) => 3,
            SessionError::Encoding { .. } => 4,
            SessionError::Cancelled => 130,
        }
    }
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Connect(_) | CaptureError::Connection(_) => {
                SessionError::Connection(err.to_string())
            }
            CaptureError::EmptySelection { width, height } => {
                SessionError::EmptySelection { width, height }
            }
            CaptureError::Read(_) | CaptureError::UnsupportedFormat(_) => {
                SessionError::Capture(err.to_string())
            }
        }
    }
}

impl From<OverlayError> for SessionError {
    fn from(err: OverlayError) -> Self {
        match err {
            OverlayError::SurfaceCreation(msg) => SessionError::SurfaceCreation(msg),
            OverlayError::Connection(_) | OverlayError::PointerGrab(_) => {
                SessionError::Connection(err.to_string())
            }
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Combine the event loop result with the overlay teardown.
///
/// The loop's own error wins; a teardown failure after it is only logged.
fn finish_selection(
    outcome: OverlayResult<SelectionOutcome>,
    closed: OverlayResult<()>,
) -> SessionResult<Rect> {
    let outcome = match (outcome, closed) {
        (Ok(outcome), Ok(())) => outcome,
        (Ok(_), Err(e)) => return Err(e.into()),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                log::warn!("Overlay teardown failed after selection error: {}", close_err);
            }
            return Err(e.into());
        }
    };

    match outcome {
        SelectionOutcome::Region(rect) if is_valid_selection(&rect) => {
            log::info!(
                "Selected {}x{} at ({}, {})",
                rect.width,
                rect.height,
                rect.x,
                rect.y
            );
            Ok(rect)
        }
        SelectionOutcome::Region(rect) => Err(SessionError::EmptySelection {
            width: rect.width,
            height: rect.height,
        }),
        SelectionOutcome::Cancelled => Err(SessionError::Cancelled),
    }
}

pub struct CaptureSession {
    config: Config,
    cancel: CancellationToken,
    machine: StateMachine,
    settle_delay: Duration,
}

impl CaptureSession {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            machine: StateMachine::new(),
            settle_delay: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that aborts the selection wait from another thread
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Select, capture and save; returns the written file
    pub fn run(&mut self) -> SessionResult<PathBuf> {
        let display = X11Display::open(self.config.display.as_deref())?;
        log::debug!("Connected to X screen {:?}", display.bounds());

        let rect = self.select(&display)?;
        let path = self.save(&display, rect)?;

        if !self.config.save {
            log::debug!("Clipboard-only capture, file kept in {}", self.config.output_dir.display());
        }
        if self.config.clipboard {
            if let Err(e) = clipboard::copy_png(&path) {
                log::warn!("Clipboard copy failed: {:#}", e);
            }
        }

        Ok(path)
    }

    fn select(&mut self, display: &X11Display) -> SessionResult<Rect> {
        if !self.machine.start_selecting() {
            log::warn!(
                "Selection started while {}",
                self.machine.state().display_text()
            );
        }

        let mut overlay = SelectionOverlay::show(display, display.bounds())?;
        let outcome = PointerEventLoop::new(self.cancel.clone()).run(&mut overlay);
        let closed = overlay.close();

        let selected = finish_selection(outcome, closed);
        if selected.is_err() {
            self.machine.reset();
        }
        selected
    }

    /// Capture `rect` from `surface` and write it to the configured destination
    pub fn save<S: RootSurface>(&mut self, surface: &S, rect: Rect) -> SessionResult<PathBuf> {
        if !self.machine.start_capturing(rect) {
            log::warn!("Capture started while {}", self.machine.state().display_text());
        }

        let grabber = FrameGrabber::new(surface)?.with_settle_delay(self.settle_delay);
        let buffer = match grabber.capture(rect) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.machine.reset();
                return Err(e.into());
            }
        };
        log::info!("Captured {}x{} pixels", buffer.width(), buffer.height());

        self.machine.start_encoding();
        let dest = self.config.destination();
        let started = Instant::now();

        let written = export::prepare_directory(&self.config.output_dir)
            .and_then(|()| PngEncoder::encode(buffer, &grabber.format(), &dest));
        if let Err(source) = written {
            self.machine.reset();
            return Err(SessionError::Encoding { path: dest, source });
        }

        log::info!(
            "Saved {} in {}ms",
            dest.display(),
            started.elapsed().as_millis()
        );
        self.machine.finish(dest.clone());
        Ok(dest)
    }
}
