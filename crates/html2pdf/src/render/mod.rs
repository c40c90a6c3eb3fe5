pub mod engine;
mod process;

use std::path::Path;

use crate::config::CancelFlag;
use crate::error::{ConvertError, ConvertWarning};

pub use engine::{Engine, EngineKind};

/// Trait for anything that can turn an HTML file into a PDF file.
pub trait Renderer {
    /// Short name used when reporting warnings and log events.
    fn name(&self) -> &str;

    /// Render `input` into a PDF written at `output`, returning any
    /// non-fatal warnings.
    ///
    /// `output` may already exist and must be overwritten. Implementations
    /// should poll `cancel` while blocked and return
    /// [`ConvertError::Interrupted`] once it is set.
    fn render(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancelFlag,
    ) -> Result<Vec<ConvertWarning>, ConvertError>;
}
