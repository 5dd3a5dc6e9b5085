//! X11 implementation of the overlay surface

use crate::selection::InputEvent;
use crate::window::{MaskMode, OverlaySurface, SelectionOverlay};
use crate::{OverlayError, OverlayResult};
use capture_x11::{Point, Rect, X11Display};
use std::thread;
use std::time::Duration;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::shape::{self, ConnectionExt as _, SK, SO};
use x11rb::protocol::xproto::{
    AtomEnum, ClipOrdering, ColormapAlloc, Colormap, ConnectionExt as _, CreateWindowAux,
    Cursor, EventMask, GrabMode, GrabStatus, Keycode, PropMode, Rectangle, VisualClass, Visualid,
    Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

const OVERLAY_DEPTH: u8 = 32;
const OVERLAY_OPACITY: f64 = 0.5;
const BACKGROUND_PIXEL: u32 = 0xFF00_0000;

/// `XC_crosshair` glyph in the core cursor font
const XC_CROSSHAIR: u16 = 34;
const XK_ESCAPE: u32 = 0xFF1B;

/// Override-redirect, translucent window shaped with the SHAPE extension
pub struct X11Surface<'a> {
    display: &'a X11Display,
    window: Window,
    colormap: Colormap,
    cursor: Cursor,
    bounds: Rect,
    escape_keycodes: Vec<Keycode>,
}

impl<'a> SelectionOverlay<X11Surface<'a>> {
    /// Create and map the overlay over `bounds`, grabbing the pointer
    pub fn show(display: &'a X11Display, bounds: Rect) -> OverlayResult<Self> {
        Ok(SelectionOverlay::with_surface(X11Surface::create(display, bounds)?))
    }
}

impl<'a> X11Surface<'a> {
    pub fn create(display: &'a X11Display, bounds: Rect) -> OverlayResult<Self> {
        let conn = display.connection();

        if conn.extension_information(shape::X11_EXTENSION_NAME)?.is_none() {
            return Err(OverlayError::SurfaceCreation(
                "SHAPE extension not available".into(),
            ));
        }

        let visual = display
            .find_visual(OVERLAY_DEPTH, VisualClass::TRUE_COLOR)
            .ok_or_else(|| {
                OverlayError::SurfaceCreation(format!(
                    "no {}-bit TrueColor visual",
                    OVERLAY_DEPTH
                ))
            })?;

        let mut created = CreatedResources::default();
        let (window, colormap, cursor) =
            match Self::build_window(display, bounds, visual.visual_id, &mut created) {
                Ok(ids) => ids,
                Err(e) => {
                    created.discard(conn);
                    return Err(e);
                }
            };

        let mut surface = Self {
            display,
            window,
            colormap,
            cursor,
            bounds,
            escape_keycodes: Vec::new(),
        };

        if let Err(e) = surface.grab_input() {
            if let Err(release_err) = surface.release() {
                log::warn!("Failed to tear down overlay after grab error: {}", release_err);
            }
            return Err(e);
        }

        log::debug!("Overlay window {:#x} mapped over {:?}", window, bounds);
        Ok(surface)
    }

    /// Create colormap, cursor and window, recording each in `created` as it succeeds
    fn build_window(
        display: &X11Display,
        bounds: Rect,
        visual_id: Visualid,
        created: &mut CreatedResources,
    ) -> OverlayResult<(Window, Colormap, Cursor)> {
        let conn = display.connection();

        let colormap = conn.generate_id()?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, display.root(), visual_id)?;
        created.colormap = Some(colormap);

        let cursor = create_crosshair(conn)?;
        created.cursor = Some(cursor);

        let window = conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .colormap(colormap)
            .background_pixel(BACKGROUND_PIXEL)
            .border_pixel(0)
            .override_redirect(1)
            .cursor(cursor)
            .event_mask(EventMask::EXPOSURE | EventMask::KEY_PRESS);

        let full = to_rectangle(bounds);
        conn.create_window(
            OVERLAY_DEPTH,
            window,
            display.root(),
            full.x,
            full.y,
            full.width,
            full.height,
            0,
            WindowClass::INPUT_OUTPUT,
            visual_id,
            &aux,
        )?
        .check()
        .map_err(|e| OverlayError::SurfaceCreation(e.to_string()))?;
        created.window = Some(window);

        let opacity_atom = conn
            .intern_atom(false, b"_NET_WM_WINDOW_OPACITY")?
            .reply()?
            .atom;
        let opacity = (OVERLAY_OPACITY * u32::MAX as f64) as u32;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            opacity_atom,
            AtomEnum::CARDINAL,
            &[opacity],
        )?;

        conn.map_window(window)?;
        Ok((window, colormap, cursor))
    }

    fn grab_input(&mut self) -> OverlayResult<()> {
        let display = self.display;
        let conn = display.connection();

        let pointer = conn
            .grab_pointer(
                false,
                self.window,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                self.cursor,
                CURRENT_TIME,
            )?
            .reply()?;

        if pointer.status != GrabStatus::SUCCESS {
            return Err(OverlayError::PointerGrab(format!("{:?}", pointer.status)));
        }

        // Keyboard grab only enables Escape; selection works without it
        let keyboard = conn
            .grab_keyboard(false, self.window, CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        if keyboard.status == GrabStatus::SUCCESS {
            self.escape_keycodes = escape_keycodes(conn)?;
        } else {
            log::warn!("Keyboard grab failed ({:?}), Escape disabled", keyboard.status);
        }

        Ok(())
    }

    fn translate(&self, event: Event) -> Option<InputEvent> {
        match event {
            Event::ButtonPress(e) => Some(InputEvent::Press {
                button: e.detail,
                position: Point::new(e.root_x.into(), e.root_y.into()),
            }),
            Event::ButtonRelease(e) => Some(InputEvent::Release {
                button: e.detail,
                position: Point::new(e.root_x.into(), e.root_y.into()),
            }),
            Event::MotionNotify(e) => Some(InputEvent::Motion {
                position: Point::new(e.root_x.into(), e.root_y.into()),
            }),
            Event::KeyPress(e) if self.escape_keycodes.contains(&e.detail) => {
                Some(InputEvent::Cancel)
            }
            Event::Error(e) => {
                log::warn!("X error during selection: {:?}", e.error_kind);
                None
            }
            _ => None,
        }
    }
}

impl OverlaySurface for X11Surface<'_> {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn apply_mask(&mut self, rect: Rect, mode: MaskMode) -> OverlayResult<()> {
        let conn = self.display.connection();
        let local = to_rectangle(rect.relative_to(self.bounds.origin()));
        let operation = match mode {
            MaskMode::Restore => SO::SET,
            MaskMode::Carve => SO::SUBTRACT,
        };

        conn.shape_rectangles(
            operation,
            SK::BOUNDING,
            ClipOrdering::UNSORTED,
            self.window,
            0,
            0,
            &[local],
        )?;

        if mode == MaskMode::Carve {
            conn.flush()?;
        }
        Ok(())
    }

    fn poll_event(&mut self, timeout: Duration) -> OverlayResult<Option<InputEvent>> {
        let conn = self.display.connection();
        loop {
            let Some(event) = conn.poll_for_event()? else {
                thread::sleep(timeout);
                return Ok(None);
            };
            if let Some(input) = self.translate(event) {
                return Ok(Some(input));
            }
        }
    }

    fn release(&mut self) -> OverlayResult<()> {
        let conn = self.display.connection();
        conn.ungrab_pointer(CURRENT_TIME)?;
        conn.ungrab_keyboard(CURRENT_TIME)?;
        conn.unmap_window(self.window)?;
        conn.destroy_window(self.window)?;
        conn.free_colormap(self.colormap)?;
        conn.free_cursor(self.cursor)?;

        // Round trip: the server has processed the teardown once this returns
        conn.get_input_focus()?.reply()?;
        log::debug!("Overlay window {:#x} destroyed", self.window);
        Ok(())
    }
}

/// Server resources made so far while building the overlay
#[derive(Debug, Default)]
struct CreatedResources {
    window: Option<Window>,
    colormap: Option<Colormap>,
    cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Teardown {
    DestroyWindow(Window),
    FreeColormap(Colormap),
    FreeCursor(Cursor),
}

impl CreatedResources {
    /// Requests that undo a partial build, window first
    fn teardown(&self) -> Vec<Teardown> {
        let mut steps = Vec::new();
        if let Some(window) = self.window {
            steps.push(Teardown::DestroyWindow(window));
        }
        if let Some(colormap) = self.colormap {
            steps.push(Teardown::FreeColormap(colormap));
        }
        if let Some(cursor) = self.cursor {
            steps.push(Teardown::FreeCursor(cursor));
        }
        steps
    }

    fn discard(&self, conn: &RustConnection) {
        for step in self.teardown() {
            let sent = match step {
                Teardown::DestroyWindow(window) => conn.destroy_window(window).map(drop),
                Teardown::FreeColormap(colormap) => conn.free_colormap(colormap).map(drop),
                Teardown::FreeCursor(cursor) => conn.free_cursor(cursor).map(drop),
            };
            if let Err(e) = sent {
                log::warn!("Failed to undo {:?}: {}", step, e);
            }
        }
        if let Err(e) = conn.flush() {
            log::warn!("Failed to flush overlay teardown: {}", e);
        }
    }
}

fn to_rectangle(rect: Rect) -> Rectangle {
    Rectangle {
        x: rect.x.clamp(i16::MIN.into(), i16::MAX.into()) as i16,
        y: rect.y.clamp(i16::MIN.into(), i16::MAX.into()) as i16,
        width: rect.width.min(u16::MAX.into()) as u16,
        height: rect.height.min(u16::MAX.into()) as u16,
    }
}

fn create_crosshair(conn: &RustConnection) -> OverlayResult<Cursor> {
    let font = conn.generate_id()?;
    conn.open_font(font, b"cursor")?;

    let cursor = conn.generate_id()?;
    conn.create_glyph_cursor(
        cursor,
        font,
        font,
        XC_CROSSHAIR,
        XC_CROSSHAIR + 1,
        0,
        0,
        0,
        0xFFFF,
        0xFFFF,
        0xFFFF,
    )?;
    conn.close_font(font)?;

    Ok(cursor)
}

fn escape_keycodes(conn: &RustConnection) -> OverlayResult<Vec<Keycode>> {
    let setup = conn.setup();
    let first = setup.min_keycode;
    let count = setup.max_keycode - setup.min_keycode + 1;

    let mapping = conn.get_keyboard_mapping(first, count)?.reply()?;
    let per_keycode = usize::from(mapping.keysyms_per_keycode.max(1));

    Ok(mapping
        .keysyms
        .chunks(per_keycode)
        .enumerate()
        .filter(|(_, syms)| syms.contains(&XK_ESCAPE))
        .map(|(i, _)| first + i as u8)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rectangle_clamps_to_protocol_range() {
        let r = to_rectangle(Rect::new(-40_000, 12, 70_000, 5));
        assert_eq!((r.x, r.y, r.width, r.height), (i16::MIN, 12, u16::MAX, 5));
    }

    #[test]
    fn to_rectangle_keeps_in_range_values() {
        let r = to_rectangle(Rect::new(-5, 7, 300, 200));
        assert_eq!((r.x, r.y, r.width, r.height), (-5, 7, 300, 200));
    }

    #[test]
    fn nothing_created_needs_no_teardown() {
        assert!(CreatedResources::default().teardown().is_empty());
    }

    #[test]
    fn failed_window_frees_colormap_and_cursor() {
        let created = CreatedResources {
            window: None,
            colormap: Some(0x20),
            cursor: Some(0x21),
        };
        assert_eq!(
            created.teardown(),
            vec![Teardown::FreeColormap(0x20), Teardown::FreeCursor(0x21)]
        );
    }

    #[test]
    fn failed_opacity_destroys_window_first() {
        let created = CreatedResources {
            window: Some(0x22),
            colormap: Some(0x20),
            cursor: Some(0x21),
        };
        assert_eq!(
            created.teardown(),
            vec![
                Teardown::DestroyWindow(0x22),
                Teardown::FreeColormap(0x20),
                Teardown::FreeCursor(0x21),
            ]
        );
    }
}
