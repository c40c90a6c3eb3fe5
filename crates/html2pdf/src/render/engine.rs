//! External HTML rendering engines.
//!
//! Rendering is delegated to a command-line program found on `PATH`, or
//! named through the `HTML2PDF_ENGINE` environment variable. The supported
//! engines differ only in how the input and output are passed on their
//! command line; parsing, layout and PDF emission all happen inside them.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;
use url::Url;

use super::Renderer;
use super::process;
use crate::config::CancelFlag;
use crate::error::{ConvertError, ConvertWarning};

/// Environment variable selecting the rendering engine.
///
/// Accepts an engine name (`weasyprint`, `wkhtmltopdf`, `chromium`) or a
/// path to an executable.
pub const ENGINE_ENV: &str = "HTML2PDF_ENGINE";

/// The command-line conventions of a supported engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    WeasyPrint,
    Wkhtmltopdf,
    Chromium,
}

impl EngineKind {
    /// All kinds in the order they are searched for.
    pub const ALL: [EngineKind; 3] = [Self::WeasyPrint, Self::Wkhtmltopdf, Self::Chromium];

    /// Parse an engine name as accepted by [`ENGINE_ENV`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "weasyprint" => Some(Self::WeasyPrint),
            "wkhtmltopdf" => Some(Self::Wkhtmltopdf),
            "chromium" | "chrome" | "google-chrome" => Some(Self::Chromium),
            _ => None,
        }
    }

    /// Guess the kind of an explicitly configured executable from its file
    /// name. Unrecognised names get the WeasyPrint layout (`<input> <output>`).
    pub fn infer_from_program(program: &Path) -> Self {
        let stem = program
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if stem.contains("wkhtmltopdf") {
            Self::Wkhtmltopdf
        } else if stem.contains("chrom") {
            Self::Chromium
        } else {
            Self::WeasyPrint
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::WeasyPrint => "weasyprint",
            Self::Wkhtmltopdf => "wkhtmltopdf",
            Self::Chromium => "chromium",
        }
    }

    /// Executable names searched on `PATH`, in preference order.
    pub fn executable_names(self) -> &'static [&'static str] {
        match self {
            Self::WeasyPrint => &["weasyprint"],
            Self::Wkhtmltopdf => &["wkhtmltopdf"],
            Self::Chromium => &[
                "chromium",
                "chromium-browser",
                "google-chrome",
                "google-chrome-stable",
            ],
        }
    }

    /// Whether stderr from a successful run carries warnings about the
    /// document. Chromium logs progress and browser diagnostics there
    /// instead.
    pub fn reports_warnings(self) -> bool {
        !matches!(self, Self::Chromium)
    }

    /// Command-line arguments rendering `input` into `output`.
    pub fn arguments(self, input: &Path, output: &Path) -> Result<Vec<OsString>, ConvertError> {
        let args: Vec<OsString> = match self {
            Self::WeasyPrint => vec![input.into(), output.into()],
            Self::Wkhtmltopdf => vec!["--quiet".into(), input.into(), output.into()],
            Self::Chromium => {
                // Chromium loads a URL and resolves the output against its own
                // working directory, so both must be absolute.
                let input = absolute(input)?;
                let output = absolute(output)?;
                let mut print_to = OsString::from("--print-to-pdf=");
                print_to.push(&output);
                vec![
                    "--headless".into(),
                    "--disable-gpu".into(),
                    "--no-pdf-header-footer".into(),
                    print_to,
                    file_url(&input)?.as_str().into(),
                ]
            }
        };
        Ok(args)
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Full stderr of a failed engine run, attached as the error source.
#[derive(Debug, Error)]
#[error("{0}")]
struct EngineOutput(String);

/// A located rendering engine executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    kind: EngineKind,
    program: PathBuf,
}

impl Engine {
    pub fn new(kind: EngineKind, program: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            program: program.into(),
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Locate an engine using the process environment.
    pub fn detect() -> Result<Self, ConvertError> {
        let selection = env::var_os(ENGINE_ENV);
        let search_path = env::var_os("PATH");
        Self::detect_from(selection.as_deref(), search_path.as_deref())
    }

    /// Locate an engine from an explicit [`ENGINE_ENV`] value and `PATH`.
    pub fn detect_from(
        selection: Option<&OsStr>,
        search_path: Option<&OsStr>,
    ) -> Result<Self, ConvertError> {
        let dirs = search_dirs(search_path);
        let engine = match selection.filter(|s| !s.is_empty()) {
            None => Self::search(&EngineKind::ALL, &dirs).ok_or_else(|| {
                ConvertError::MissingEngine(format!(
                    "none of {} found on PATH; install WeasyPrint (pip install weasyprint) \
                     or set {ENGINE_ENV} to an engine executable",
                    candidate_list(&EngineKind::ALL)
                ))
            })?,
            Some(selection) => match selection.to_str().and_then(EngineKind::from_name) {
                Some(kind) => Self::search(&[kind], &dirs).ok_or_else(|| {
                    ConvertError::MissingEngine(format!(
                        "{ENGINE_ENV} selects {kind}, but none of {} found on PATH",
                        candidate_list(&[kind])
                    ))
                })?,
                None => {
                    let program = PathBuf::from(selection);
                    if !is_executable(&program) {
                        return Err(ConvertError::MissingEngine(format!(
                            "{ENGINE_ENV} points to {}, which is not an executable file",
                            program.display()
                        )));
                    }
                    Self::new(EngineKind::infer_from_program(&program), program)
                }
            },
        };
        debug!(kind = %engine.kind, program = %engine.program.display(), "rendering engine selected");
        Ok(engine)
    }

    fn search(kinds: &[EngineKind], dirs: &[PathBuf]) -> Option<Self> {
        kinds.iter().find_map(|&kind| {
            kind.executable_names()
                .iter()
                .find_map(|name| find_executable(dirs, name))
                .map(|program| Self::new(kind, program))
        })
    }
}

impl Renderer for Engine {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn render(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancelFlag,
    ) -> Result<Vec<ConvertWarning>, ConvertError> {
        let mut command = Command::new(&self.program);
        command.args(self.kind.arguments(input, output)?);
        debug!(
            program = %self.program.display(),
            input = %input.display(),
            output = %output.display(),
            "spawning rendering engine"
        );

        let finished = process::run(command, cancel)?;
        let lines: Vec<&str> = finished
            .stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if !finished.status.success() {
            let message = match lines.last() {
                Some(last) => format!("{} exited with {}: {last}", self.kind, finished.status),
                None => format!("{} exited with {}", self.kind, finished.status),
            };
            return Err(ConvertError::ConversionFailed {
                message,
                source: (!lines.is_empty())
                    .then(|| EngineOutput(lines.join("\n")).into()),
            });
        }

        if !self.kind.reports_warnings() {
            for line in lines {
                debug!(engine = %self.kind, line, "rendering engine diagnostic");
            }
            return Ok(Vec::new());
        }

        Ok(lines
            .into_iter()
            .map(|line| ConvertWarning {
                source: self.kind.name().to_string(),
                message: line.to_string(),
            })
            .collect())
    }
}

fn search_dirs(search_path: Option<&OsStr>) -> Vec<PathBuf> {
    search_path
        .map(|p| {
            env::split_paths(p)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn find_executable(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    let file_name = format!("{name}{}", env::consts::EXE_SUFFIX);
    dirs.iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn candidate_list(kinds: &[EngineKind]) -> String {
    kinds
        .iter()
        .flat_map(|kind| kind.executable_names())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

fn absolute(path: &Path) -> Result<PathBuf, ConvertError> {
    std::path::absolute(path).map_err(|e| {
        ConvertError::conversion_caused_by(format!("cannot resolve {}", path.display()), e)
    })
}

fn file_url(path: &Path) -> Result<Url, ConvertError> {
    Url::from_file_path(path).map_err(|()| {
        ConvertError::conversion(format!("cannot express {} as a file URL", path.display()))
    })
}
