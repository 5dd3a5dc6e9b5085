//! Root-surface frame grabbing

use crate::{CaptureError, CaptureResult, PixelBuffer, PixelFormat, Rect};
use std::thread;
use std::time::Duration;

/// Pause between overlay teardown and sampling so the desktop can repaint
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Drawable holding the full screen contents
pub trait RootSurface {
    /// Screen area covered by the surface
    fn bounds(&self) -> Rect;

    /// Channel layout of samples returned by `read_pixels`
    fn pixel_format(&self) -> CaptureResult<PixelFormat>;

    /// Read the pixels of `rect`, which lies within `bounds()`
    fn read_pixels(&self, rect: Rect) -> CaptureResult<PixelBuffer>;
}

/// Captures finalized selections from a root surface
pub struct FrameGrabber<'a, S: RootSurface> {
    surface: &'a S,
    format: PixelFormat,
    settle_delay: Duration,
}

impl<'a, S: RootSurface> FrameGrabber<'a, S> {
    /// Create a grabber, deriving the pixel format once for the whole capture
    pub fn new(surface: &'a S) -> CaptureResult<Self> {
        let format = surface.pixel_format()?;
        log::debug!("Capture pixel format: {:?}", format);

        Ok(Self {
            surface,
            format,
            settle_delay: SETTLE_DELAY,
        })
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Capture `rect`. The selection overlay must already be closed.
    pub fn capture(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
        if rect.is_empty() {
            return Err(CaptureError::EmptySelection {
                width: rect.width,
                height: rect.height,
            });
        }

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        let clipped = rect
            .intersection(&self.surface.bounds())
            .filter(|r| !r.is_empty())
            .ok_or(CaptureError::EmptySelection { width: 0, height: 0 })?;

        if clipped != rect {
            log::warn!("Selection {:?} clipped to screen bounds {:?}", rect, clipped);
        }

        let buffer = self.surface.read_pixels(clipped)?;
        if buffer.is_empty() {
            return Err(CaptureError::Read("surface returned no data".into()));
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Instant;

    /// In-memory screen filled with one sample value
    struct SyntheticScreen {
        bounds: Rect,
        fill: u32,
        reads: RefCell<Vec<Rect>>,
        read_at: RefCell<Option<Instant>>,
        fail: bool,
    }

    impl SyntheticScreen {
        fn new(width: u32, height: u32, fill: u32) -> Self {
            Self {
                bounds: Rect::new(0, 0, width, height),
                fill,
                reads: RefCell::new(Vec::new()),
                read_at: RefCell::new(None),
                fail: false,
            }
        }
    }

    impl RootSurface for SyntheticScreen {
        fn bounds(&self) -> Rect {
            self.bounds
        }

        fn pixel_format(&self) -> CaptureResult<PixelFormat> {
            Ok(PixelFormat::XRGB8888)
        }

        fn read_pixels(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
            self.reads.borrow_mut().push(rect);
            *self.read_at.borrow_mut() = Some(Instant::now());
            if self.fail {
                return Err(CaptureError::Read("BadMatch".into()));
            }
            let samples = vec![self.fill; (rect.width * rect.height) as usize];
            PixelBuffer::from_samples(rect.width, rect.height, &samples)
        }
    }

    fn grabber(screen: &SyntheticScreen) -> FrameGrabber<'_, SyntheticScreen> {
        FrameGrabber::new(screen).unwrap().with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn zero_width_is_rejected_before_reading() {
        let screen = SyntheticScreen::new(100, 100, 0);
        let err = grabber(&screen).capture(Rect::new(10, 10, 0, 20)).unwrap_err();
        assert!(matches!(err, CaptureError::EmptySelection { width: 0, height: 20 }));
        assert!(screen.reads.borrow().is_empty());
    }

    #[test]
    fn zero_height_is_rejected_before_reading() {
        let screen = SyntheticScreen::new(100, 100, 0);
        let err = grabber(&screen).capture(Rect::new(10, 10, 20, 0)).unwrap_err();
        assert!(matches!(err, CaptureError::EmptySelection { .. }));
        assert!(screen.reads.borrow().is_empty());
    }

    #[test]
    fn captures_requested_rectangle() {
        let screen = SyntheticScreen::new(100, 100, 0x00FF0000);
        let buf = grabber(&screen).capture(Rect::new(10, 20, 30, 40)).unwrap();
        assert_eq!((buf.width(), buf.height()), (30, 40));
        assert_eq!(buf.sample(29, 39), 0x00FF0000);
        assert_eq!(*screen.reads.borrow(), vec![Rect::new(10, 20, 30, 40)]);
    }

    #[test]
    fn clips_to_screen_bounds() {
        let screen = SyntheticScreen::new(100, 100, 0);
        let buf = grabber(&screen).capture(Rect::new(90, 95, 20, 20)).unwrap();
        assert_eq!((buf.width(), buf.height()), (10, 5));
    }

    #[test]
    fn off_screen_selection_is_empty() {
        let screen = SyntheticScreen::new(100, 100, 0);
        let err = grabber(&screen).capture(Rect::new(200, 200, 20, 20)).unwrap_err();
        assert!(matches!(err, CaptureError::EmptySelection { .. }));
    }

    #[test]
    fn read_failure_is_reported() {
        let mut screen = SyntheticScreen::new(100, 100, 0);
        screen.fail = true;
        let err = grabber(&screen).capture(Rect::new(0, 0, 5, 5)).unwrap_err();
        assert!(matches!(err, CaptureError::Read(_)));
    }

    #[test]
    fn waits_for_settle_delay_before_reading() {
        let delay = Duration::from_millis(30);
        let screen = SyntheticScreen::new(100, 100, 0);
        let grabber = FrameGrabber::new(&screen).unwrap().with_settle_delay(delay);

        let started = Instant::now();
        grabber.capture(Rect::new(0, 0, 10, 10)).unwrap();

        let read_at = screen.read_at.borrow().unwrap();
        assert!(read_at.duration_since(started) >= delay);
    }

    #[test]
    fn empty_rect_returns_without_waiting() {
        let screen = SyntheticScreen::new(100, 100, 0);
        let grabber = FrameGrabber::new(&screen)
            .unwrap()
            .with_settle_delay(Duration::from_secs(5));

        let started = Instant::now();
        let err = grabber.capture(Rect::new(3, 3, 0, 0)).unwrap_err();

        assert!(matches!(err, CaptureError::EmptySelection { .. }));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(screen.read_at.borrow().is_none());
        assert!(screen.reads.borrow().is_empty());
    }
}
