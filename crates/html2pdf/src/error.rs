use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during HTML to PDF conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// No usable rendering engine could be located.
    #[error("no HTML rendering engine available: {0}")]
    MissingEngine(String),

    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("input file must be an HTML file (.html or .htm): {}", .0.display())]
    InvalidInput(PathBuf),

    /// The rendering engine (or the output placement around it) failed.
    #[error("failed to convert HTML to PDF: {message}")]
    ConversionFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("conversion interrupted")]
    Interrupted,
}

impl ConvertError {
    /// A conversion failure with no underlying error value.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::ConversionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// A conversion failure caused by `source`.
    ///
    /// The cause's text is folded into the message so it survives a plain
    /// `Display` of this error.
    pub fn conversion_caused_by(
        context: impl std::fmt::Display,
        source: impl Into<BoxError>,
    ) -> Self {
        let source = source.into();
        Self::ConversionFailed {
            message: format!("{context}: {source}"),
            source: Some(source),
        }
    }
}

/// A non-fatal diagnostic emitted while a conversion still succeeded.
#[derive(Debug, Clone)]
pub struct ConvertWarning {
    /// Which component reported the warning (usually the engine name).
    pub source: String,
    pub message: String,
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Result of a successful conversion.
#[derive(Debug)]
pub struct ConvertResult {
    /// Where the PDF was written.
    pub output: PathBuf,
    /// Warnings collected during conversion (non-fatal issues).
    pub warnings: Vec<ConvertWarning>,
}
