//! External helper programs configured as a single command string.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A configured program, resolved on `PATH` once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl CommandLine {
    /// Split `command` on whitespace and look the program up on `PATH`.
    ///
    /// Returns `None` for a blank command or a program that cannot be found.
    pub fn resolve(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace();
        let name = parts.next()?;
        match which::which(name) {
            Ok(program) => Some(Self {
                program,
                args: parts.map(str::to_string).collect(),
            }),
            Err(e) => {
                tracing::warn!(program = name, error = %e, "Configured program not found");
                None
            }
        }
    }

    /// A `tokio` command for this program. The child is killed when dropped.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        cmd
    }

    /// Run the program with `extra_args`, write `input` to its stdin and wait.
    /// Fails on a non-zero exit.
    pub async fn pipe(&self, extra_args: &[&str], input: &str) -> std::io::Result<()> {
        let status = self.pipe_status(extra_args, input).await?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!("{} exited with {}", self, status)))
        }
    }

    /// Like `pipe`, but hands the exit status back to the caller.
    pub async fn pipe_status(
        &self,
        extra_args: &[&str],
        input: &str,
    ) -> std::io::Result<ExitStatus> {
        let mut child = self
            .command()
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // A program may exit without reading its input; the exit status decides.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
        }

        child.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_command_is_none() {
        assert!(CommandLine::resolve("").is_none());
        assert!(CommandLine::resolve("   ").is_none());
    }

    #[test]
    fn test_missing_program_is_none() {
        assert!(CommandLine::resolve("voqit-no-such-program-here --flag").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_keeps_args() {
        let cmd = CommandLine::resolve("sh -c true").unwrap();
        assert_eq!(cmd.args, vec!["-c", "true"]);
        assert!(cmd.to_string().ends_with("sh -c true"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_reports_exit_status() {
        let ok = CommandLine::resolve("cat").unwrap();
        assert!(ok.pipe(&[], "hello").await.is_ok());

        let failing = CommandLine::resolve("sh -c").unwrap();
        assert!(failing.pipe(&["exit 3"], "hello").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_status_keeps_exit_code() {
        let cmd = CommandLine::resolve("sh -c").unwrap();
        let status = cmd.pipe_status(&["exit 130"], "hello").await.unwrap();
        assert_eq!(status.code(), Some(130));
    }
}
