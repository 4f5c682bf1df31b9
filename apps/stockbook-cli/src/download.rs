//! # File Download
//!
//! Materialises generated CSV text as a file in the download directory.
//!
//! ```text
//! content ──► NamedTempFile (same dir) ──► write + flush ──► persist(<dir>/<filename>)
//!                     │                                          │
//!                     └────────── dropped on any failure ◄───────┘
//! ```
//!
//! The temporary file lives next to the target so the final rename never
//! crosses a filesystem. It is removed whether or not the download succeeds.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use stockbook_core::export::CSV_MIME;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{ErrorCode, ViewError};

/// Writes `content` to `<dir>/<filename>`, replacing any previous file.
pub fn trigger_download(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, ViewError> {
    write_download(dir, filename, content).map_err(|e| {
        tracing::error!(dir = %dir.display(), filename, "Download failed: {}", e);
        ViewError::new(
            ErrorCode::DownloadError,
            format!("Could not save {}", filename),
        )
    })
}

fn write_download(dir: &Path, filename: &str, content: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut artefact = NamedTempFile::new_in(dir)?;
    debug!(path = %artefact.path().display(), "Staging download");

    artefact.write_all(content.as_bytes())?;
    artefact.flush()?;

    let target = dir.join(filename);
    artefact.persist(&target).map_err(|e| e.error)?;

    info!(
        path = %target.display(),
        bytes = content.len(),
        mime = CSV_MIME,
        "Download saved"
    );
    Ok(target)
}
