//! Convert HTML files to PDF.
//!
//! Rendering is delegated to an external engine (see [`render::Engine`]);
//! this crate validates the input, decides where the PDF goes, and moves
//! the engine's output into place only once it has been fully written.
//! Outputs that are not plain files (devices, FIFOs) are written directly.

pub mod config;
pub mod error;
pub mod render;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use config::{ConvertOptions, Format};
use error::{ConvertError, ConvertResult};
use render::{Engine, Renderer};

/// Convert an HTML file to PDF with the engine found in the environment.
///
/// Without `output`, the PDF is written next to the input with a `.pdf`
/// extension.
pub fn convert(
    input: impl AsRef<Path>,
    output: Option<&Path>,
) -> Result<ConvertResult, ConvertError> {
    let options = ConvertOptions {
        output: output.map(Path::to_path_buf),
        ..ConvertOptions::default()
    };
    convert_with_options(input, &options)
}

/// Convert an HTML file to PDF with options.
///
/// The input is validated before an engine is looked up, so a bad path is
/// reported as such even on a machine with no engine installed.
pub fn convert_with_options(
    input: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let input = input.as_ref();
    validate_input(input)?;
    let engine = Engine::detect()?;
    convert_with(&engine, input, options)
}

/// Convert an HTML file to PDF using the given renderer.
pub fn convert_with<R: Renderer + ?Sized>(
    renderer: &R,
    input: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConvertResult, ConvertError> {
    let input = input.as_ref();
    let format = validate_input(input)?;
    let output = resolve_output_path(input, options.output.as_deref())?;
    debug!(
        input = %input.display(),
        output = %output.display(),
        ?format,
        renderer = renderer.name(),
        "converting"
    );

    let destination = Destination::for_output(&output)?;
    let warnings = renderer.render(input, destination.render_path(), &options.cancel)?;
    if options.cancel.is_cancelled() {
        return Err(ConvertError::Interrupted);
    }
    destination.commit(renderer.name())?;

    for warning in &warnings {
        debug!(%warning, "rendering engine reported a warning");
    }
    Ok(ConvertResult { output, warnings })
}

/// Check that `input` is an existing `.html`/`.htm` file.
///
/// Only the extension is inspected; the content is left to the engine.
pub fn validate_input(input: &Path) -> Result<Format, ConvertError> {
    if !input.is_file() {
        return Err(ConvertError::NotFound(input.to_path_buf()));
    }
    Format::from_path(input).ok_or_else(|| ConvertError::InvalidInput(input.to_path_buf()))
}

/// Decide where the PDF for `input` is written.
///
/// An explicit `output` is used verbatim and its missing parent directories
/// are created. Otherwise the input's extension is replaced with `.pdf`.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf, ConvertError> {
    let Some(output) = output else {
        return Ok(input.with_extension("pdf"));
    };
    if let Some(parent) = non_empty_parent(output) {
        fs::create_dir_all(parent).map_err(|e| {
            ConvertError::conversion_caused_by(
                format!("failed to create output directory {}", parent.display()),
                e,
            )
        })?;
    }
    Ok(output.to_path_buf())
}

/// Where the renderer writes, and how that reaches the output path.
enum Destination {
    /// Render into a temporary file beside `target`, then rename over it.
    Staged {
        staging: TempPath,
        target: PathBuf,
        /// Mode of the file being replaced.
        permissions: Option<fs::Permissions>,
    },
    /// Render straight into the path.
    Direct(PathBuf),
}

impl Destination {
    /// Staging is only used where a rename is indistinguishable from an
    /// in-place write: a missing or regular file. A symlink is staged at its
    /// resolved target so the link itself survives.
    fn for_output(output: &Path) -> Result<Self, ConvertError> {
        let meta = match fs::symlink_metadata(output) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::staged(output, None),
            Err(e) => {
                return Err(ConvertError::conversion_caused_by(
                    format!("cannot inspect {}", output.display()),
                    e,
                ));
            }
        };

        if meta.file_type().is_symlink() {
            let resolved = fs::canonicalize(output)
                .ok()
                .and_then(|target| fs::metadata(&target).ok().map(|m| (target, m)));
            return match resolved {
                Some((target, m)) if m.is_file() => Self::staged(&target, Some(m.permissions())),
                // Dangling link or special target: write through the link.
                _ => Ok(Self::Direct(output.to_path_buf())),
            };
        }

        if meta.is_file() {
            Self::staged(output, Some(meta.permissions()))
        } else {
            Ok(Self::Direct(output.to_path_buf()))
        }
    }

    fn staged(target: &Path, permissions: Option<fs::Permissions>) -> Result<Self, ConvertError> {
        Ok(Self::Staged {
            staging: staging_path(target)?,
            target: target.to_path_buf(),
            permissions,
        })
    }

    fn render_path(&self) -> &Path {
        match self {
            Self::Staged { staging, .. } => &**staging,
            Self::Direct(path) => path.as_path(),
        }
    }

    fn commit(self, renderer: &str) -> Result<(), ConvertError> {
        match self {
            Self::Staged {
                staging,
                target,
                permissions,
            } => {
                ensure_rendered(&staging, renderer)?;
                if let Some(permissions) = permissions {
                    fs::set_permissions(&staging, permissions).map_err(|e| {
                        ConvertError::conversion_caused_by(
                            format!("failed to set permissions for {}", target.display()),
                            e,
                        )
                    })?;
                }
                debug!(path = %target.display(), "moving rendered PDF into place");
                staging.persist(&target).map_err(|e| {
                    ConvertError::conversion_caused_by(
                        format!("failed to write {}", target.display()),
                        e.error,
                    )
                })
            }
            Self::Direct(path) => {
                // Devices and FIFOs report no meaningful length.
                let is_file = fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
                if is_file {
                    ensure_rendered(&path, renderer)?;
                }
                Ok(())
            }
        }
    }
}

/// A temporary file beside `target` for the engine to write into.
///
/// Living in the same directory keeps the final rename atomic. The file is
/// removed on drop unless persisted.
fn staging_path(target: &Path) -> Result<TempPath, ConvertError> {
    let dir = non_empty_parent(target).unwrap_or(Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".html2pdf-").suffix(".pdf");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Subject to the umask, like a file created directly.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let file = builder.tempfile_in(dir).map_err(|e| {
        ConvertError::conversion_caused_by(
            format!("failed to create temporary file in {}", dir.display()),
            e,
        )
    })?;
    Ok(file.into_temp_path())
}

fn ensure_rendered(staging: &Path, renderer: &str) -> Result<(), ConvertError> {
    let len = fs::metadata(staging)
        .map_err(|e| {
            ConvertError::conversion_caused_by(format!("{renderer} output is unreadable"), e)
        })?
        .len();
    if len == 0 {
        return Err(ConvertError::conversion(format!(
            "{renderer} finished without writing any output"
        )));
    }
    Ok(())
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
