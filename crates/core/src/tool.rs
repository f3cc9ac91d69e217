//! Thin abstraction over the external media binaries.
//! The tools only ever need "run this command, give me status and output",
//! so that seam is a trait the tests can mock.

use crate::error::{Error, Result};
use std::io;
use std::process::Command;
use tracing::trace;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit status code, -1 when the process died without one.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// True when the tool exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs external tools. Production code uses [`SystemRunner`]; tests swap in
/// a mock so planner logic runs without the real binaries present.
pub trait ToolRunner {
    /// Run `tool` with `args`, blocking until it exits, capturing output.
    fn run(&self, tool: &str, args: &[String]) -> Result<ToolOutput>;
}

/// Runner backed by [`std::process::Command`].
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, tool: &str, args: &[String]) -> Result<ToolOutput> {
        trace!("running {} {}", tool, args.join(" "));
        let output = Command::new(tool).args(args).output().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::ToolMissing {
                    tool: tool.to_string(),
                }
            } else {
                Error::Io(err)
            }
        })?;
        Ok(ToolOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a tool and turn a non-zero exit into an error carrying its stderr.
pub fn run_checked(runner: &dyn ToolRunner, tool: &str, args: &[String]) -> Result<ToolOutput> {
    let output = runner.run(tool, args)?;
    if !output.success() {
        return Err(Error::ToolFailed {
            tool: tool.to_string(),
            status: output.status,
            stderr: output.stderr.trim().to_string(),
        });
    }
    Ok(output)
}


#[cfg(test)]
mod tests {
    use super::testing::MockRunner;
    use super::*;

    /// Ensure a non-zero exit surfaces the tool name and captured stderr.
    #[test]
    fn checked_run_reports_failure() {
        let runner = MockRunner::new(vec![MockRunner::fail("boom")]);
        let err = run_checked(&runner, "mkvmerge", &["-J".to_string()]).unwrap_err();
        match err {
            Error::ToolFailed {
                tool,
                status,
                stderr,
            } => {
                assert_eq!(tool, "mkvmerge");
                assert_eq!(status, 2);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
