//! X11 display connection and root window access

use crate::{
    ByteOrder, CaptureError, CaptureResult, PixelBuffer, PixelFormat, Rect, RootSurface,
};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ConnectionExt, ImageFormat, ImageOrder, Screen, VisualClass, Visualid, Visualtype, Window,
};
use x11rb::rust_connection::RustConnection;

/// Open connection to an X server plus the screen in use
pub struct X11Display {
    conn: RustConnection,
    screen_num: usize,
}

impl X11Display {
    /// Connect to `name`, or `$DISPLAY` when `None`
    pub fn open(name: Option<&str>) -> CaptureResult<Self> {
        let (conn, screen_num) = x11rb::connect(name)?;
        log::debug!("Connected to X display, screen {}", screen_num);
        Ok(Self { conn, screen_num })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    pub fn screen(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    pub fn root(&self) -> Window {
        self.screen().root
    }

    /// Find a visual of the given depth and class, e.g. 32-bit TrueColor
    pub fn find_visual(&self, depth: u8, class: VisualClass) -> Option<Visualtype> {
        self.screen()
            .allowed_depths
            .iter()
            .filter(|d| d.depth == depth)
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.class == class)
            .cloned()
    }

    fn visual_by_id(&self, id: Visualid) -> Option<Visualtype> {
        self.screen()
            .allowed_depths
            .iter()
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.visual_id == id)
            .cloned()
    }

    /// Bits per pixel and scanline pad for images of `depth`
    fn image_layout(&self, depth: u8) -> CaptureResult<(u8, u8)> {
        self.conn
            .setup()
            .pixmap_formats
            .iter()
            .find(|f| f.depth == depth)
            .map(|f| (f.bits_per_pixel, f.scanline_pad))
            .ok_or_else(|| {
                CaptureError::UnsupportedFormat(format!("no pixmap format for depth {}", depth))
            })
    }

    fn byte_order(&self) -> ByteOrder {
        if self.conn.setup().image_byte_order == ImageOrder::MSB_FIRST {
            ByteOrder::MsbFirst
        } else {
            ByteOrder::LsbFirst
        }
    }
}

impl RootSurface for X11Display {
    fn bounds(&self) -> Rect {
        let screen = self.screen();
        Rect::new(
            0,
            0,
            screen.width_in_pixels as u32,
            screen.height_in_pixels as u32,
        )
    }

    fn pixel_format(&self) -> CaptureResult<PixelFormat> {
        let screen = self.screen();
        let visual = self.visual_by_id(screen.root_visual).ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!(
                "root visual {:#x} not advertised",
                screen.root_visual
            ))
        })?;

        PixelFormat::from_masks(visual.red_mask, visual.green_mask, visual.blue_mask)
    }

    fn read_pixels(&self, rect: Rect) -> CaptureResult<PixelBuffer> {
        let coord = |v: i32| {
            i16::try_from(v).map_err(|_| CaptureError::Read(format!("coordinate {} out of range", v)))
        };
        let extent = |v: u32| {
            u16::try_from(v).map_err(|_| CaptureError::Read(format!("extent {} out of range", v)))
        };

        let reply = self
            .conn
            .get_image(
                ImageFormat::Z_PIXMAP,
                self.root(),
                coord(rect.x)?,
                coord(rect.y)?,
                extent(rect.width)?,
                extent(rect.height)?,
                u32::MAX,
            )?
            .reply()?;

        if reply.data.is_empty() {
            return Err(CaptureError::Read("server returned no image data".into()));
        }

        let (bits_per_pixel, scanline_pad) = self.image_layout(reply.depth)?;
        let row_bits = rect.width as usize * bits_per_pixel as usize;
        let pad = scanline_pad.max(8) as usize;
        let row_stride = row_bits.div_ceil(pad) * pad / 8;

        log::debug!(
            "GetImage {}x{} depth {} bpp {} stride {}",
            rect.width,
            rect.height,
            reply.depth,
            bits_per_pixel,
            row_stride
        );

        PixelBuffer::new(
            reply.data,
            rect.width,
            rect.height,
            row_stride,
            bits_per_pixel,
            self.byte_order(),
        )
    }
}
