//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace the file's contents. Readers never observe a partial write.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Replace several files. Either every file is replaced or none is.
    fn write_all(&self, files: &[(&Path, &str)]) -> io::Result<()>;
}

/// A remote source could not be fetched or decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl ToString) -> Self {
        Self {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Remote inputs of a roll: the Chromium list and the hstspreload.org queues.
pub trait PreloadSource: Send + Sync {
    /// Current preload list text from Chromium source.
    fn preload_list(&self) -> Result<String, FetchError>;

    /// Domains whose owners requested removal.
    fn pending_removals(&self) -> Result<Vec<String>, FetchError>;

    /// Domains queued for removal by the automated eligibility job.
    fn pending_automated_removals(&self) -> Result<Vec<String>, FetchError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.write_all(&[(path, content)])
    }

    fn write_all(&self, files: &[(&Path, &str)]) -> io::Result<()> {
        // stage everything next to its target before the first rename
        let mut staged = Vec::with_capacity(files.len());
        for (path, content) in files {
            staged.push((*path, stage(path, content)?));
        }
        for (path, tmp) in staged {
            tmp.persist(path).map_err(|e| e.error)?;
        }
        Ok(())
    }
}

fn stage(path: &Path, content: &str) -> io::Result<tempfile::NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    Ok(tmp)
}
