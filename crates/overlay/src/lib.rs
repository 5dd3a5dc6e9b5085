//! Overlay module for sct
//!
//! Provides the translucent full-screen overlay and drag-to-select region
//! selection.

pub mod region;
pub mod selection;
pub mod window;
pub mod x11;

#[cfg(test)]
mod testing;

pub use region::{is_valid_selection, normalize, RegionModel};
pub use selection::{CancellationToken, InputEvent, PointerEventLoop, SelectionState, PRIMARY_BUTTON};
pub use window::{MaskMode, OverlaySurface, SelectionOverlay};
pub use x11::X11Surface;

use capture_x11::Rect;
use thiserror::Error;
use x11rb::errors::{ConnectionError, ReplyError, ReplyOrIdError};

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("X connection error: {0}")]
    Connection(String),

    #[error("Pointer grab failed: {0}")]
    PointerGrab(String),

    #[error("Overlay surface creation failed: {0}")]
    SurfaceCreation(String),
}

impl From<ConnectionError> for OverlayError {
    fn from(err: ConnectionError) -> Self {
        OverlayError::Connection(err.to_string())
    }
}

impl From<ReplyError> for OverlayError {
    fn from(err: ReplyError) -> Self {
        OverlayError::Connection(err.to_string())
    }
}

impl From<ReplyOrIdError> for OverlayError {
    fn from(err: ReplyOrIdError) -> Self {
        OverlayError::Connection(err.to_string())
    }
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Selection outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// User dragged out a region
    Region(Rect),
    /// User cancelled
    Cancelled,
}
