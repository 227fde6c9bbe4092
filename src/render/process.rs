use std::{
    ffi::{OsStr, OsString},
    io::{BufRead as _, BufReader, Read},
    process::{Command, Stdio},
    thread::JoinHandle,
};

use crate::foundation::error::{LayercompError, LayercompResult};

/// Launches external programs on behalf of the renderer.
///
/// Output is for diagnostics only; success is decided by the exit status alone.
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` and block until it exits.
    fn run(&self, program: &str, args: &[OsString]) -> LayercompResult<()>;
}

/// [`ProcessRunner`] backed by `std::process::Command`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> LayercompResult<()> {
        tracing::debug!(program, ?args, "spawning");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LayercompError::render(format!(
                    "failed to spawn {program} (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            LayercompError::render(format!("failed to open {program} stdout (unexpected)"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            LayercompError::render(format!("failed to open {program} stderr (unexpected)"))
        })?;
        let drains = [
            spawn_log_drain(program, "stdout", stdout),
            spawn_log_drain(program, "stderr", stderr),
        ];

        let status = child
            .wait()
            .map_err(|e| LayercompError::render(format!("failed to wait for {program}: {e}")))?;
        for drain in drains {
            drain
                .join()
                .map_err(|_| LayercompError::render(format!("{program} log drain panicked")))?;
        }

        if status.success() {
            Ok(())
        } else {
            tracing::debug!(program, code = ?status.code(), "non-zero exit");
            Err(LayercompError::process(program, status.code()))
        }
    }
}

fn spawn_log_drain<R: Read + Send + 'static>(
    program: &str,
    stream: &'static str,
    reader: R,
) -> JoinHandle<()> {
    let program = program.to_string();
    std::thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&line);
                    tracing::debug!(program = %program, stream, "{}", text.trim_end());
                }
            }
        }
    })
}

/// Return `true` when `program` can be invoked from `PATH`.
pub fn is_program_on_path(program: impl AsRef<OsStr>) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/render/process.rs"]
mod tests;
