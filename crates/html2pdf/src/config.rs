use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Htm,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "htm" => Some(Self::Htm),
            _ => None,
        }
    }

    /// Detect format from the extension of a path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Shared flag used to abort a running conversion.
///
/// Clones observe the same state, so the flag can be handed to a signal
/// handler while the converter keeps its own copy.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options controlling the conversion process.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Destination PDF path. When `None`, the input path with a `.pdf`
    /// extension is used.
    pub output: Option<PathBuf>,
    /// Checked while the rendering engine runs.
    pub cancel: CancelFlag,
}
