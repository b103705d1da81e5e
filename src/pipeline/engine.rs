//! Running external engines (`docling`, `tesseract`) as subprocesses.
//!
//! A binary that cannot be spawned is reported as
//! [`TableExtractError::DependencyMissing`] with the caller's install hint;
//! a non-zero exit becomes [`TableExtractError::EngineFailed`] with the tail
//! of stderr.

use crate::error::TableExtractError;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Bytes of stderr kept in [`TableExtractError::EngineFailed`].
const STDERR_TAIL: usize = 2000;

/// An external command-line engine.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    /// Name used in errors and logs, e.g. `"tesseract"`.
    pub name: &'a str,
    pub bin: &'a Path,
    pub install_hint: &'a str,
}

impl Engine<'_> {
    /// Run to completion and return stdout.
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<u8>, TableExtractError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TableExtractError::EngineFailed {
                engine: self.name.to_string(),
                status: output.status.to_string(),
                stderr: tail(stderr.trim(), STDERR_TAIL).to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// `true` when `<bin> --version` runs and exits successfully.
    pub async fn probe(&self) -> bool {
        match self.output(["--version"]).await {
            Ok(out) => out.status.success(),
            Err(e) => {
                debug!("{} probe failed: {}", self.name, e);
                false
            }
        }
    }

    async fn output<I, S>(&self, args: I) -> Result<Output, TableExtractError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(self.bin);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("Running {:?}", cmd.as_std());

        cmd.output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                TableExtractError::DependencyMissing {
                    dependency: self.name.to_string(),
                    hint: self.install_hint.to_string(),
                }
            }
            _ => TableExtractError::Io(e),
        })
    }
}

/// The last `max` bytes of `s`, cut at a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
