//! Press/drag/release state machine for region selection

use crate::region::RegionModel;
use crate::window::{OverlaySurface, SelectionOverlay};
use crate::{OverlayResult, SelectionOutcome};
use capture_x11::{Point, Rect};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Button that starts and ends a drag (X11 button 1)
pub const PRIMARY_BUTTON: u8 = 1;

/// Input delivered by the overlay surface, positions in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press { button: u8, position: Point },
    Motion { position: Point },
    Release { button: u8, position: Point },
    /// User asked to abort (Escape)
    Cancel,
}

/// Selection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    AwaitingPress,
    Dragging { region: RegionModel, button: u8 },
    Released(Rect),
}

/// Shared flag that interrupts the selection wait
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of feeding one event to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Finished(Rect),
    Cancelled,
}

/// Drives the overlay from pointer input until the drag is released
pub struct PointerEventLoop {
    state: SelectionState,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl PointerEventLoop {
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            state: SelectionState::Idle,
            cancel,
            poll_interval: Self::POLL_INTERVAL,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Wait for a complete drag on `overlay`.
    ///
    /// Returns `Cancelled` if the token fires or the user aborts; the overlay
    /// is left open either way so the caller can close it.
    pub fn run<S: OverlaySurface>(
        &mut self,
        overlay: &mut SelectionOverlay<S>,
    ) -> OverlayResult<SelectionOutcome> {
        if self.state != SelectionState::Idle {
            log::warn!("Selection loop restarted from {:?}", self.state);
        }
        self.transition(SelectionState::AwaitingPress);

        loop {
            if self.cancel.is_cancelled() {
                log::info!("Selection cancelled");
                return Ok(SelectionOutcome::Cancelled);
            }

            let Some(event) = overlay.poll_event(self.poll_interval)? else {
                continue;
            };

            match self.handle(event, overlay)? {
                Step::Continue => {}
                Step::Finished(rect) => return Ok(SelectionOutcome::Region(rect)),
                Step::Cancelled => {
                    log::info!("Selection aborted by user");
                    return Ok(SelectionOutcome::Cancelled);
                }
            }
        }
    }

    fn handle<S: OverlaySurface>(
        &mut self,
        event: InputEvent,
        overlay: &mut SelectionOverlay<S>,
    ) -> OverlayResult<Step> {
        if event == InputEvent::Cancel {
            return Ok(Step::Cancelled);
        }

        match (self.state, event) {
            (SelectionState::AwaitingPress, InputEvent::Press { button, position })
                if button == PRIMARY_BUTTON =>
            {
                let region = RegionModel::begin(position);
                overlay.update_hole(region.rect())?;
                self.transition(SelectionState::Dragging { region, button });
            }

            (SelectionState::Dragging { mut region, button }, InputEvent::Motion { position }) => {
                let rect = region.update(position);
                overlay.update_hole(rect)?;
                self.state = SelectionState::Dragging { region, button };
            }

            (
                SelectionState::Dragging { region, button },
                InputEvent::Release {
                    button: released,
                    position,
                },
            ) if released == button => {
                let rect = region.finalize(position);
                overlay.update_hole(rect)?;
                self.transition(SelectionState::Released(rect));
                return Ok(Step::Finished(rect));
            }

            // Other buttons, stray motion and events after release are ignored
            _ => {}
        }

        Ok(Step::Continue)
    }

    fn transition(&mut self, next: SelectionState) {
        log::debug!("Selection state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
