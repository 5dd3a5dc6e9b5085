//! In-memory overlay surface for tests

use crate::selection::{CancellationToken, InputEvent};
use crate::window::{MaskMode, OverlaySurface};
use crate::OverlayResult;
use capture_x11::Rect;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Observable state of a `FakeSurface`, shared with the test body
pub struct FakeState {
    bounds: Rect,
    covered: Vec<bool>,
    pub events: VecDeque<InputEvent>,
    pub mask_ops: Vec<(Rect, MaskMode)>,
    pub releases: usize,
    pub empty_polls: usize,
    pub cancel_when_drained: Option<CancellationToken>,
}

impl FakeState {
    pub fn is_covered(&self, x: i32, y: i32) -> bool {
        let local_x = (x - self.bounds.x) as usize;
        let local_y = (y - self.bounds.y) as usize;
        self.covered[local_y * self.bounds.width as usize + local_x]
    }

    /// The uncovered area, asserting it is a single rectangle
    pub fn visible_hole(&self) -> Option<Rect> {
        let mut min = (i32::MAX, i32::MAX);
        let mut max = (i32::MIN, i32::MIN);
        let mut count = 0u32;

        for y in self.bounds.y..self.bounds.bottom() {
            for x in self.bounds.x..self.bounds.right() {
                if !self.is_covered(x, y) {
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                    count += 1;
                }
            }
        }

        if count == 0 {
            return None;
        }

        let hole = Rect::new(
            min.0,
            min.1,
            (max.0 - min.0 + 1) as u32,
            (max.1 - min.1 + 1) as u32,
        );
        assert_eq!(count, hole.width * hole.height, "uncovered area is not a rectangle");
        Some(hole)
    }

    fn set(&mut self, rect: Rect, covered: bool) {
        let Some(clip) = rect.intersection(&self.bounds) else {
            return;
        };
        for y in clip.y..clip.bottom() {
            for x in clip.x..clip.right() {
                let idx = (y - self.bounds.y) as usize * self.bounds.width as usize
                    + (x - self.bounds.x) as usize;
                self.covered[idx] = covered;
            }
        }
    }
}

pub struct FakeSurface {
    state: Rc<RefCell<FakeState>>,
}

impl FakeSurface {
    pub fn new(bounds: Rect) -> Self {
        let state = FakeState {
            bounds,
            covered: vec![true; (bounds.width * bounds.height) as usize],
            events: VecDeque::new(),
            mask_ops: Vec::new(),
            releases: 0,
            empty_polls: 0,
            cancel_when_drained: None,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with_events(bounds: Rect, events: impl IntoIterator<Item = InputEvent>) -> Self {
        let surface = Self::new(bounds);
        surface.state.borrow_mut().events.extend(events);
        surface
    }

    pub fn state(&self) -> Rc<RefCell<FakeState>> {
        Rc::clone(&self.state)
    }
}

impl OverlaySurface for FakeSurface {
    fn bounds(&self) -> Rect {
        self.state.borrow().bounds
    }

    fn apply_mask(&mut self, rect: Rect, mode: MaskMode) -> OverlayResult<()> {
        let mut state = self.state.borrow_mut();
        state.mask_ops.push((rect, mode));
        match mode {
            MaskMode::Restore => {
                state.covered.iter_mut().for_each(|c| *c = false);
                state.set(rect, true);
            }
            MaskMode::Carve => state.set(rect, false),
        }
        Ok(())
    }

    fn poll_event(&mut self, _timeout: Duration) -> OverlayResult<Option<InputEvent>> {
        let mut state = self.state.borrow_mut();
        let event = state.events.pop_front();
        if event.is_none() {
            state.empty_polls += 1;
            if let Some(token) = &state.cancel_when_drained {
                token.cancel();
            }
        }
        Ok(event)
    }

    fn release(&mut self) -> OverlayResult<()> {
        self.state.borrow_mut().releases += 1;
        Ok(())
    }
}
