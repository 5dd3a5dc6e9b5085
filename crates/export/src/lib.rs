//! Export module for sct
//!
//! Provides lossless PNG export of captured regions.

mod encoder;

pub use encoder::PngEncoder;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encoding(String),

    #[error("Row buffer allocation failed: {0}")]
    Allocation(String),

    #[error("Image has no pixels")]
    EmptyImage,
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        match err {
            png::EncodingError::IoError(e) => ExportError::Io(e),
            other => ExportError::Encoding(other.to_string()),
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Extension of every exported file
pub const EXTENSION: &str = "png";

/// `dir/name.png`, without doubling an existing `.png` suffix
pub fn destination(dir: &Path, name: &str) -> PathBuf {
    let has_extension = Path::new(name)
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case(EXTENSION));

    if has_extension {
        dir.join(name)
    } else {
        dir.join(format!("{}.{}", name, EXTENSION))
    }
}

/// Create the output directory tree
pub fn prepare_directory(dir: &Path) -> ExportResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}
