//! Clipboard hand-off through xclip

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

const XCLIP: &str = "xclip";

/// Offer the PNG at `path` on the CLIPBOARD selection
pub fn copy_png(path: &Path) -> Result<()> {
    copy_with(XCLIP, path)
}

fn copy_with(program: &str, path: &Path) -> Result<()> {
    // xclip forks a child that keeps serving the selection; the parent exits
    let status = Command::new(program)
        .args(["-selection", "clipboard", "-t", "image/png", "-i"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .status()
        .with_context(|| format!("failed to run {}", program))?;

    if !status.success() {
        bail!("{} exited with {}", program, status);
    }

    log::info!("Copied {} to clipboard", path.display());
    Ok(())
}
