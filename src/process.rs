//! External program execution.
//!
//! Every adapter that shells out goes through [`run_tool`], which runs the
//! program to completion on the Tokio runtime and turns a non-zero exit into
//! a [`ProcessFailure`] carrying the tail of its stderr.

use std::ffi::OsString;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::Error as IoError;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

/// Number of trailing stderr lines kept in a failure reason.
const STDERR_TAIL_LINES: usize = 5;

/// Why an external program did not succeed.
#[derive(Debug)]
pub(crate) enum ProcessFailure {
    /// The program could not be started.
    Launch { program: String, source: IoError },
    /// The program ran and exited unsuccessfully.
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl Display for ProcessFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessFailure::Launch { program, source } => {
                write!(f, "failed to launch {program}: {source}")
            }
            ProcessFailure::Exit {
                program,
                status,
                stderr,
            } if stderr.is_empty() => write!(f, "{program} exited with {status}"),
            ProcessFailure::Exit {
                program,
                status,
                stderr,
            } => write!(f, "{program} exited with {status}: {stderr}"),
        }
    }
}

/// Split a program specification such as `gm convert` into the executable
/// and its leading arguments.
pub(crate) fn split_program(program: &str) -> (String, Vec<OsString>) {
    let mut parts = program.split_whitespace();
    let executable = parts.next().unwrap_or_default().to_string();
    (executable, parts.map(OsString::from).collect())
}

/// Run `program` with `arguments` and wait for it to exit.
///
/// Stdout is discarded; stderr is captured for the failure reason. The
/// child is killed if the returned future is dropped.
pub(crate) async fn run_tool(program: &str, arguments: &[OsString]) -> Result<(), ProcessFailure> {
    let (executable, leading) = split_program(program);
    log::trace!("Running {program} {arguments:?}");

    let output = Command::new(&executable)
        .args(&leading)
        .args(arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProcessFailure::Launch {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(ProcessFailure::Exit {
        program: program.to_string(),
        status: output.status,
        stderr: stderr_tail(&output.stderr),
    })
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}
