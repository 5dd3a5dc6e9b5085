//! X11 screen capture module for sct
//!
//! Provides the display handle, pixel layout descriptors and root-window
//! frame grabbing.

pub mod display;
pub mod format;
pub mod frame;
pub mod grabber;

pub use display::X11Display;
pub use format::{ChannelMask, PixelFormat};
pub use frame::{ByteOrder, PixelBuffer};
pub use grabber::{FrameGrabber, RootSurface, SETTLE_DELAY};

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Unable to open X display: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Empty selection ({width}x{height})")]
    EmptySelection { width: u32, height: u32 },

    #[error("Failed to capture image: {0}")]
    Read(String),

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),
}

impl From<ReplyError> for CaptureError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(e) => CaptureError::Connection(e),
            ReplyError::X11Error(e) => CaptureError::Read(format!("{:?}", e.error_kind)),
        }
    }
}

impl From<ReplyOrIdError> for CaptureError {
    fn from(err: ReplyOrIdError) -> Self {
        match err {
            ReplyOrIdError::ConnectionError(e) => CaptureError::Connection(e),
            ReplyOrIdError::X11Error(e) => CaptureError::Read(format!("{:?}", e.error_kind)),
            ReplyOrIdError::IdsExhausted => CaptureError::Read("X resource ids exhausted".into()),
        }
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;

/// Point in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x &&
        self.y < other.bottom() && self.bottom() > other.y
    }

    /// Overlapping area of two rectangles, `None` when they do not overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
    }

    /// Same rectangle expressed relative to `origin`
    pub fn relative_to(&self, origin: Point) -> Rect {
        Rect::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}
