//! # Configuration State
//!
//! Settings of the command surface itself. Backend and cache settings live
//! in `stockbook_query::QueryConfig`.
//!
//! ## Download Directory (Priority Order)
//! 1. `--download-dir` flag
//! 2. `STOCKBOOK_DOWNLOAD_DIR`
//! 3. The user's download folder
//! 4. The current directory

use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde::Serialize;
use stockbook_core::listing::DEFAULT_PAGE_SIZE;

/// Environment variable naming the download directory.
pub const DOWNLOAD_DIR_ENV: &str = "STOCKBOOK_DOWNLOAD_DIR";

/// Read-only after startup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Where CSV downloads are written.
    pub download_dir: PathBuf,

    /// Rows per page in list views.
    pub page_size: usize,
}

impl ConfigState {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        ConfigState {
            download_dir: download_dir.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Resolves the download directory from an explicit choice (flag or
    /// environment, already merged by the argument parser) or the platform.
    pub fn resolve(download_dir: Option<PathBuf>) -> Self {
        let dir = download_dir
            .or_else(|| UserDirs::new().and_then(|d| d.download_dir().map(Path::to_path_buf)))
            .unwrap_or_else(|| PathBuf::from("."));

        tracing::debug!(download_dir = %dir.display(), "Resolved download directory");
        ConfigState::new(dir)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::resolve(None)
    }
}
