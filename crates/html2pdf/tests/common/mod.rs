//! Shared test utilities for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use html2pdf::config::CancelFlag;
use html2pdf::error::{ConvertError, ConvertWarning};
use html2pdf::render::Renderer;

/// Minimal bytes that pass for a PDF in these tests.
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n1 0 obj <<>> endobj\n%%EOF\n";

pub const SAMPLE_HTML: &str = "<!DOCTYPE html>\n<html><head><title>Sample</title></head>\
<body><h1>Sample</h1><p>Hello, World!</p></body></html>\n";

/// Write [`SAMPLE_HTML`] to `dir/name`.
pub fn write_html(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, SAMPLE_HTML).expect("should write HTML fixture");
    path
}

/// What a [`ScriptedRenderer`] does when invoked.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Write the given bytes to the output path.
    Write(Vec<u8>),
    /// Write the bytes and report the warnings.
    WriteWithWarnings(Vec<u8>, Vec<String>),
    /// Write a partial file, then fail with the message.
    Fail(String),
    /// Succeed without touching the output.
    NoOutput,
    /// Write a partial file, then observe a cancellation request.
    Cancelled,
}

/// Renderer driven by a fixed [`Behavior`] that records every call.
pub struct ScriptedRenderer {
    behavior: Behavior,
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl ScriptedRenderer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn writing_pdf() -> Self {
        Self::new(Behavior::Write(FAKE_PDF.to_vec()))
    }

    /// `(input, output)` pairs passed to `render`, in call order.
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Renderer for ScriptedRenderer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn render(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancelFlag,
    ) -> Result<Vec<ConvertWarning>, ConvertError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf()));

        match &self.behavior {
            Behavior::Write(bytes) => {
                fs::write(output, bytes).unwrap();
                Ok(vec![])
            }
            Behavior::WriteWithWarnings(bytes, warnings) => {
                fs::write(output, bytes).unwrap();
                Ok(warnings
                    .iter()
                    .map(|message| ConvertWarning {
                        source: self.name().to_string(),
                        message: message.clone(),
                    })
                    .collect())
            }
            Behavior::Fail(message) => {
                fs::write(output, b"%PDF-1.7\n%partial").unwrap();
                Err(ConvertError::conversion(message.clone()))
            }
            Behavior::NoOutput => Ok(vec![]),
            Behavior::Cancelled => {
                fs::write(output, b"%PDF-1.7\n%partial").unwrap();
                cancel.cancel();
                Ok(vec![])
            }
        }
    }
}

/// File names in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("should list directory")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Write an executable shell script standing in for a rendering engine.
#[cfg(unix)]
pub fn fake_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("should write engine script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("should make engine script executable");
    path
}
