//! Build verification after a version rewrite
//!
//! This module provides:
//! - The `BuildVerifier` trait the update engine runs after writing
//! - `CommandVerifier`, which runs a build command (by default
//!   `mvn clean compile`) in the manifest's directory
//!
//! Output from stdout and stderr is merged line by line in arrival order.
//! Bytes that are not valid UTF-8 are replaced rather than rejected.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Result of one build run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// The command line that was executed
    pub command: String,
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr
    pub output: String,
}

impl BuildOutput {
    /// Returns true if the build exited with code zero
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The last `max_chars` characters of the output
    pub fn tail(&self, max_chars: usize) -> &str {
        tail_chars(&self.output, max_chars)
    }
}

/// Runs a build to check that a rewritten manifest still compiles
///
/// An `Err` means the build could not be run or did not finish; a build that
/// ran and failed is an `Ok` with a non-zero exit code.
#[async_trait]
pub trait BuildVerifier: Send + Sync {
    /// Run the build in `project_dir`
    async fn verify(&self, project_dir: &Path) -> std::io::Result<BuildOutput>;
}

/// Verifier that executes an external command
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandVerifier {
    /// Create a verifier from a program and its arguments
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Create a verifier from a full command line, `None` if it is empty
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// `mvn clean compile`
    pub fn maven() -> Self {
        Self::new("mvn", vec!["clean".to_string(), "compile".to_string()])
    }

    /// Kill the build if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line as displayed to users
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self, project_dir: &Path) -> std::io::Result<BuildOutput> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut output = String::new();
        if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
            let mut stdout = BufReader::new(stdout);
            let mut stderr = BufReader::new(stderr);
            let (mut stdout_buf, mut stderr_buf) = (Vec::new(), Vec::new());
            let (mut stdout_open, mut stderr_open) = (true, true);

            // Build tools may print in a non-UTF-8 locale; read raw bytes
            while stdout_open || stderr_open {
                let (from_stdout, read) = tokio::select! {
                    read = stdout.read_until(b'\n', &mut stdout_buf), if stdout_open => (true, read?),
                    read = stderr.read_until(b'\n', &mut stderr_buf), if stderr_open => (false, read?),
                };
                let (buf, open) = if from_stdout {
                    (&mut stdout_buf, &mut stdout_open)
                } else {
                    (&mut stderr_buf, &mut stderr_open)
                };
                if read == 0 {
                    *open = false;
                } else {
                    push_line(&mut output, buf);
                    buf.clear();
                }
            }
        }

        let status = child.wait().await?;
        Ok(BuildOutput {
            command: self.command_line(),
            exit_code: status.code(),
            output,
        })
    }
}

#[async_trait]
impl BuildVerifier for CommandVerifier {
    async fn verify(&self, project_dir: &Path) -> std::io::Result<BuildOutput> {
        tracing::debug!(command = %self.command_line(), dir = %project_dir.display(), "running build");

        match self.timeout {
            None => self.run(project_dir).await,
            // Dropping the run future drops the child, which kills it
            Some(timeout) => tokio::time::timeout(timeout, self.run(project_dir))
                .await
                .map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!(
                            "'{}' did not finish within {}s and was killed",
                            self.command_line(),
                            timeout.as_secs()
                        ),
                    )
                })?,
        }
    }
}

/// Append one raw output line, decoded lossily and without its terminator
fn push_line(output: &mut String, raw: &[u8]) {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    output.push_str(&String::from_utf8_lossy(raw));
    output.push('\n');
}

/// The last `max_chars` characters of `text`, on a char boundary
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("héllo", 4), "éllo");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn test_from_command() {
        let verifier = CommandVerifier::from_command(&[
            "./mvnw".to_string(),
            "-q".to_string(),
            "compile".to_string(),
        ])
        .unwrap();
        assert_eq!(verifier.command_line(), "./mvnw -q compile");
        assert!(CommandVerifier::from_command(&[]).is_none());
    }

    #[test]
    fn test_maven_default() {
        assert_eq!(CommandVerifier::maven().command_line(), "mvn clean compile");
    }

    #[test]
    fn test_build_output_success() {
        let ok = BuildOutput {
            command: "x".to_string(),
            exit_code: Some(0),
            output: String::new(),
        };
        assert!(ok.success());
        let killed = BuildOutput {
            exit_code: None,
            ..ok.clone()
        };
        assert!(!killed.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_is_merged() {
        let temp_dir = TempDir::new().unwrap();
        let verifier = CommandVerifier::new(
            "sh",
            vec!["-c".to_string(), "echo out; echo err 1>&2; exit 3".to_string()],
        );

        let result = verifier.verify(temp_dir.path()).await.unwrap();
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.success());
        assert!(result.output.contains("out\n"));
        assert!(result.output.contains("err\n"));
    }

    #[test]
    fn test_push_line_decodes_lossily() {
        let mut output = String::new();
        push_line(&mut output, b"Fehler: ung\xfcltig\r\n");
        push_line(&mut output, b"no newline");
        assert_eq!(output, "Fehler: ung\u{FFFD}ltig\nno newline\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_utf8_output_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let verifier = CommandVerifier::new(
            "sh",
            vec![
                "-c".to_string(),
                "printf 'Fehler: ung\\374ltig\\n'; exit 1".to_string(),
            ],
        );

        let result = verifier.verify(temp_dir.path()).await.unwrap();
        assert_eq!(result.exit_code, Some(1));
        assert!(result.output.contains("Fehler: ung"));
        assert!(result.output.contains("ltig\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runs_in_project_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("marker.txt"), "here").unwrap();
        let verifier = CommandVerifier::new("cat", vec!["marker.txt".to_string()]);

        let result = verifier.verify(temp_dir.path()).await.unwrap();
        assert!(result.success());
        assert_eq!(result.output, "here\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let verifier = CommandVerifier::new("feraldeps-no-such-build-tool", vec![]);
        assert!(verifier.verify(temp_dir.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_build() {
        let temp_dir = TempDir::new().unwrap();
        let verifier = CommandVerifier::new("sleep", vec!["30".to_string()])
            .with_timeout(Some(Duration::from_millis(200)));

        let err = verifier.verify(temp_dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }
}
