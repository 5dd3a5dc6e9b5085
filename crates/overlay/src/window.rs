//! Selection overlay window and its visibility mask

use crate::selection::InputEvent;
use crate::OverlayResult;
use capture_x11::Rect;
use std::time::Duration;

/// How a mask rectangle combines with the current shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    /// Cut the rectangle out of the surface so the desktop shows through
    Carve,
    /// Reset the surface to cover exactly the rectangle
    Restore,
}

/// Window-system side of the overlay
pub trait OverlaySurface {
    /// Screen area covered by the surface
    fn bounds(&self) -> Rect;

    /// Apply `rect` (screen coordinates) to the surface's visible region
    fn apply_mask(&mut self, rect: Rect, mode: MaskMode) -> OverlayResult<()>;

    /// Next relevant input event, or `None` if nothing arrived within `timeout`
    fn poll_event(&mut self, timeout: Duration) -> OverlayResult<Option<InputEvent>>;

    /// Release input grabs and destroy the surface
    fn release(&mut self) -> OverlayResult<()>;
}

/// Dimmed full-screen overlay with a hole over the current selection
pub struct SelectionOverlay<S: OverlaySurface> {
    surface: S,
    closed: bool,
}

impl<S: OverlaySurface> SelectionOverlay<S> {
    /// Take ownership of an already mapped surface
    pub fn with_surface(surface: S) -> Self {
        Self {
            surface,
            closed: false,
        }
    }

    /// Recompute the mask so the hole is exactly `rect`.
    ///
    /// Full coverage is restored before carving, so no earlier hole survives.
    pub fn update_hole(&mut self, rect: Rect) -> OverlayResult<()> {
        let bounds = self.surface.bounds();
        self.surface.apply_mask(bounds, MaskMode::Restore)?;
        self.surface.apply_mask(rect, MaskMode::Carve)?;
        Ok(())
    }

    pub(crate) fn poll_event(&mut self, timeout: Duration) -> OverlayResult<Option<InputEvent>> {
        self.surface.poll_event(timeout)
    }

    /// Release the pointer grab and tear the surface down
    pub fn close(mut self) -> OverlayResult<()> {
        self.closed = true;
        self.surface.release()
    }
}

impl<S: OverlaySurface> Drop for SelectionOverlay<S> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.surface.release() {
                log::warn!("Failed to release overlay surface: {}", e);
            }
        }
    }
}
