use std::{
    io::{self, ErrorKind, Write},
    num::NonZeroUsize,
    path::Path,
    process::{Command, Stdio},
    time::Instant,
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ImageFormat;

use super::pool::PermitPool;

/// Directories searched for a bare command name, in order. Launcher
/// environments often inherit a PATH that misses the common Graphviz install
/// locations, so a fixed list beats the ambient one.
const LIKELY_LOCATIONS: &str = "/usr/local/bin:/opt/homebrew/bin:/snap/bin:/bin:/usr/bin";
const PATH_SEARCH_UTILITY: &str = "/usr/bin/env";
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// One external invocation produces exactly one of these or the payload.
#[derive(Debug, Error)]
pub enum DotInvokeError {
    #[error("failed to stage diagram input: {0}")]
    Io(#[from] io::Error),
    #[error("spawn [{command_line}] failed: {reason}")]
    Spawn { command_line: String, reason: String },
    #[error("spawn [{command_line}] failed, {detail}. Check the dot executable path is correct.")]
    NotFound { command_line: String, detail: String },
    #[error("dot exited with code {code}, stderr: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("dot terminated without an exit code, stderr: {stderr}")]
    Signaled { stderr: String },
}

/// Invokes the Graphviz CLI for one diagram source at a time, staging the
/// source through a temporary file and capturing stdout as the image payload.
#[derive(Debug, Clone)]
pub struct DotInvoker {
    dot_path: String,
    image_format: ImageFormat,
    pool: PermitPool,
}

impl DotInvoker {
    pub fn new(
        dot_path: impl Into<String>,
        image_format: ImageFormat,
        max_concurrent: NonZeroUsize,
    ) -> Self {
        Self {
            dot_path: dot_path.into(),
            image_format,
            pool: PermitPool::new(max_concurrent),
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        self.image_format
    }

    /// Render one diagram source to image bytes.
    ///
    /// Stages the source through a temporary file that is deleted on every
    /// exit path when its guard drops, then invokes the CLI on that path.
    pub fn render(&self, source: &str) -> Result<Vec<u8>, DotInvokeError> {
        let mut input_file = NamedTempFile::new()?;
        input_file.write_all(source.as_bytes())?;
        input_file.flush()?;

        self.render_input(input_file.path())
    }

    /// Invoke the Graphviz CLI on an existing input file.
    ///
    /// The permit bounds how many dot processes run at once.
    pub fn render_input(&self, input: &Path) -> Result<Vec<u8>, DotInvokeError> {
        let started_at = Instant::now();
        let _permit = self.pool.acquire();

        let mut command_line = resolve_command(self.dot_path.trim(), cfg!(windows));
        command_line.push(format!("-T{}", self.image_format.as_str()));
        command_line.push(input.display().to_string());
        let rendered_command = command_line.join(" ");

        debug!(
            target: "render::dot",
            op = "dot::render",
            command = %rendered_command,
            "starting dot process"
        );

        let output = Command::new(&command_line[0])
            .args(&command_line[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                warn!(
                    target: "render::dot",
                    op = "dot::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error_code = "spawn",
                    command = %rendered_command,
                    error = %err,
                    "failed to spawn dot process"
                );
                if err.kind() == ErrorKind::NotFound {
                    DotInvokeError::NotFound {
                        command_line: rendered_command.clone(),
                        detail: err.to_string(),
                    }
                } else {
                    DotInvokeError::Spawn {
                        command_line: rendered_command.clone(),
                        reason: err.to_string(),
                    }
                }
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        match output.status.code() {
            Some(0) => {
                info!(
                    target: "render::dot",
                    op = "dot::render",
                    result = "ok",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    payload_bytes = output.stdout.len(),
                    "dot process finished"
                );
                Ok(output.stdout)
            }
            Some(EXIT_COMMAND_NOT_FOUND) => {
                warn!(
                    target: "render::dot",
                    op = "dot::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    exit_code = EXIT_COMMAND_NOT_FOUND,
                    error_code = "not_found",
                    command = %rendered_command,
                    stderr = %stderr,
                    "dot command not found"
                );
                Err(DotInvokeError::NotFound {
                    command_line: rendered_command,
                    detail: format!("stderr: {stderr}"),
                })
            }
            Some(code) => {
                warn!(
                    target: "render::dot",
                    op = "dot::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    exit_code = code,
                    error_code = "nonzero_exit",
                    stderr = %stderr,
                    "dot process reported an error"
                );
                Err(DotInvokeError::NonZeroExit { code, stderr })
            }
            None => {
                warn!(
                    target: "render::dot",
                    op = "dot::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error_code = "signaled",
                    stderr = %stderr,
                    "dot process terminated without an exit code"
                );
                Err(DotInvokeError::Signaled { stderr })
            }
        }
    }
}

/// Resolve the configured executable into the leading command-line tokens.
///
/// Qualified paths are invoked directly on every platform; Windows resolves
/// bare names itself; elsewhere a bare name goes through the PATH-search
/// utility with the fixed directory list.
fn resolve_command(dot_path: &str, windows_like: bool) -> Vec<String> {
    let already_qualified = dot_path.contains('/') || dot_path.contains('\\');
    if already_qualified || windows_like {
        vec![dot_path.to_string()]
    } else {
        vec![
            PATH_SEARCH_UTILITY.to_string(),
            "-P".to_string(),
            LIKELY_LOCATIONS.to_string(),
            dot_path.to_string(),
        ]
    }
}
