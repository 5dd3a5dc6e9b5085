//! Streaming PNG export of captured pixel buffers

use crate::{ExportError, ExportResult};
use capture_x11::{PixelBuffer, PixelFormat};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// PNG encoder for captured regions
pub struct PngEncoder;

impl PngEncoder {
    /// Write `buffer` as an 8-bit RGB PNG at `dest`.
    ///
    /// The buffer is consumed. On failure no file is left at `dest`.
    pub fn encode(buffer: PixelBuffer, format: &PixelFormat, dest: &Path) -> ExportResult<()> {
        Self::encode_with(buffer, format, dest, BufWriter::new)
    }

    /// `encode` with the file wrapped by `wrap` before any PNG bytes are written
    fn encode_with<W, F>(
        buffer: PixelBuffer,
        format: &PixelFormat,
        dest: &Path,
        wrap: F,
    ) -> ExportResult<()>
    where
        W: Write,
        F: FnOnce(File) -> W,
    {
        if buffer.is_empty() {
            return Err(ExportError::EmptyImage);
        }

        let mut row = allocate_row(buffer.width())?;

        let file = File::create(dest)?;
        let guard = PartialFile::new(dest);
        let mut out = wrap(file);

        Self::write_png(&buffer, format, &mut row, &mut out)?;
        out.flush()?;
        drop(out);

        guard.commit();
        log::debug!(
            "Encoded {}x{} PNG to {}",
            buffer.width(),
            buffer.height(),
            dest.display()
        );
        Ok(())
    }

    /// Encode into any writer, one row at a time
    pub fn write_png<W: Write>(
        buffer: &PixelBuffer,
        format: &PixelFormat,
        row: &mut Vec<u8>,
        out: W,
    ) -> ExportResult<()> {
        let mut encoder = png::Encoder::new(out, buffer.width(), buffer.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        {
            let mut stream = writer.stream_writer()?;
            for y in 0..buffer.height() {
                row.clear();
                for sample in buffer.row_samples(y) {
                    row.extend_from_slice(&format.rgb(sample));
                }
                stream.write_all(row.as_slice())?;
            }
            stream.finish()?;
        }
        writer.finish()?;

        Ok(())
    }
}

/// Reserve one RGB row up front so allocation failure is reported, not fatal
fn allocate_row(width: u32) -> ExportResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(3)
        .ok_or_else(|| ExportError::Allocation(format!("row of {} pixels", width)))?;

    let mut row = Vec::new();
    row.try_reserve_exact(len)
        .map_err(|e| ExportError::Allocation(e.to_string()))?;
    Ok(row)
}

/// Removes the destination file on drop unless committed
struct PartialFile<'a> {
    path: &'a Path,
    committed: bool,
}

impl<'a> PartialFile<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        match fs::remove_file(self.path) {
            Ok(()) => log::warn!("Removed partial output {}", self.path.display()),
            Err(e) => log::error!(
                "Failed to remove partial output {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
