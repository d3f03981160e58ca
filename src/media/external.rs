//! Collaborators backed by external programs.
//!
//! The program reads an input file and writes a PNG. Arguments may contain
//! `{input}` and `{output}`, replaced by temporary paths. A call that
//! exceeds its timeout has its process killed.

use super::{TableAsset, TableRenderer, VectorRasterizer};
use crate::error::{Error, Result};
use crossbeam_channel::{after, select, tick};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Vector-to-raster conversion through an external program.
#[derive(Debug, Clone)]
pub struct CommandRasterizer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRasterizer {
    /// Run `program {input} {output}`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the argument template.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl VectorRasterizer for CommandRasterizer {
    fn rasterize(&self, data: &[u8], format_hint: &str) -> Result<Vec<u8>> {
        run_converter(
            "vector rasterizer",
            &self.program,
            &self.args,
            self.timeout,
            data,
            &format!("input.{}", format_hint),
        )
    }
}

/// HTML table rendering through an external program (a headless browser
/// or an HTML-to-image tool).
#[derive(Debug, Clone)]
pub struct CommandTableRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTableRenderer {
    /// Run `program {input} {output}` with an HTML input file.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec!["{input}".to_string(), "{output}".to_string()],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the argument template.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TableRenderer for CommandTableRenderer {
    fn render(&self, table: &TableAsset) -> Result<Vec<u8>> {
        let page = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n{}\n</body></html>\n",
            table.html
        );
        run_converter(
            "table renderer",
            &self.program,
            &self.args,
            self.timeout,
            page.as_bytes(),
            "table.html",
        )
    }
}

fn run_converter(
    collaborator: &'static str,
    program: &str,
    args: &[String],
    timeout: Duration,
    input: &[u8],
    input_name: &str,
) -> Result<Vec<u8>> {
    let io_err = |e: std::io::Error| Error::collaborator(collaborator, e.to_string());

    let dir = tempfile::tempdir().map_err(io_err)?;
    let input_path = dir.path().join(input_name);
    let output_path = dir.path().join("output.png");
    fs::write(&input_path, input).map_err(io_err)?;

    run_with_timeout(collaborator, program, args, &input_path, &output_path, timeout)?;

    fs::read(&output_path)
        .map_err(|_| Error::collaborator(collaborator, format!("{} produced no output", program)))
}

fn run_with_timeout(
    collaborator: &'static str,
    program: &str,
    args: &[String],
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> Result<()> {
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();
    let args: Vec<String> = args
        .iter()
        .map(|a| a.replace("{input}", &input).replace("{output}", &output))
        .collect();

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::collaborator(collaborator, format!("cannot start {}: {}", program, e)))?;

    let deadline = after(timeout);
    let ticker = tick(POLL_INTERVAL);
    loop {
        select! {
            recv(deadline) -> _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout { collaborator, timeout });
            }
            recv(ticker) -> _ => {
                let status = child
                    .try_wait()
                    .map_err(|e| Error::collaborator(collaborator, e.to_string()))?;
                match status {
                    Some(status) if status.success() => return Ok(()),
                    Some(status) => {
                        return Err(Error::collaborator(
                            collaborator,
                            format!("{} exited with {}", program, status),
                        ))
                    }
                    None => {}
                }
            }
        }
    }
}
