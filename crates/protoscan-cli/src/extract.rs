//! Document text extraction for the CLI.
//!
//! Upload validation and PDF-to-text conversion, kept out of the core: the
//! analysis pipeline only ever sees plain text.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Maximum accepted document size in bytes (20 MB).
pub const MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Whether the path looks like a PDF document.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Reject documents over the size limit.
pub fn validate_size(len: u64) -> Result<()> {
    if len > MAX_FILE_SIZE {
        bail!("file size {} bytes exceeds the 20MB limit", len);
    }
    Ok(())
}

/// Read a protocol document and return its text.
///
/// PDFs are converted page by page; scanned-image PDFs yield no text and
/// are rejected with a clear message (OCR is out of scope). Any other file
/// is treated as plain text. Empty extractions are rejected so the analysis
/// never runs on nothing.
pub fn extract_text(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    validate_size(metadata.len())?;

    let text = if is_pdf(path) {
        let bytes = std::fs::read(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow::anyhow!("invalid or corrupted PDF {}: {}", path.display(), e))?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {} as text", path.display()))?
    };

    if text.trim().is_empty() {
        bail!(
            "no text could be extracted from {}; it may be a scanned image or empty",
            path.display()
        );
    }

    Ok(text)
}
