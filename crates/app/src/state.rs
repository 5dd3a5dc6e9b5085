//! State machine for a capture session

use capture_x11::Rect;
use std::path::PathBuf;

/// Session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Nothing started yet
    Idle,
    /// Overlay shown, waiting for a drag
    Selecting,
    /// Reading pixels of the selected region
    Capturing(Rect),
    /// Writing the PNG file
    Encoding(Rect),
    /// File written
    Saved(PathBuf),
}

impl AppState {
    pub fn display_text(&self) -> &'static str {
        match self {
            AppState::Idle => "idle",
            AppState::Selecting => "selecting region",
            AppState::Capturing(_) => "capturing",
            AppState::Encoding(_) => "encoding",
            AppState::Saved(_) => "saved",
        }
    }

    pub fn can_select(&self) -> bool {
        matches!(self, AppState::Idle)
    }

    /// A region may come from the overlay or be supplied directly
    pub fn can_capture(&self) -> bool {
        matches!(self, AppState::Idle | AppState::Selecting)
    }
}

/// State machine transitions
pub struct StateMachine {
    state: AppState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::Idle,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Transition to selecting state
    pub fn start_selecting(&mut self) -> bool {
        if self.state.can_select() {
            self.transition(AppState::Selecting);
            true
        } else {
            false
        }
    }

    /// Selection finished with `rect`
    pub fn start_capturing(&mut self, rect: Rect) -> bool {
        if self.state.can_capture() {
            self.transition(AppState::Capturing(rect));
            true
        } else {
            false
        }
    }

    /// Pixels read, start writing the file
    pub fn start_encoding(&mut self) -> bool {
        match self.state {
            AppState::Capturing(rect) => {
                self.transition(AppState::Encoding(rect));
                true
            }
            _ => false,
        }
    }

    /// File written to `path`
    pub fn finish(&mut self, path: PathBuf) -> bool {
        if matches!(self.state, AppState::Encoding(_)) {
            self.transition(AppState::Saved(path));
            true
        } else {
            false
        }
    }

    /// Cancelled or failed, return to idle
    pub fn reset(&mut self) {
        self.transition(AppState::Idle);
    }

    fn transition(&mut self, next: AppState) {
        log::debug!(
            "Session {} -> {}",
            self.state.display_text(),
            next.display_text()
        );
        self.state = next;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
