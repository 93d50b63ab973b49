//! Toolchain backed by external commands.
//!
//! The source is written to the command's stdin. Exit status 0 means success
//! and stdout is the result. Otherwise each non-empty stderr line is one
//! diagnostic, which matches what `sgo translate` emits.
//!
//! Children are spawned with `kill_on_drop`, so a call abandoned by the
//! handler's timeout does not leave the process running.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::ToolchainConfig;
use crate::toolchain::{Toolchain, ToolchainError};

/// Runs the configured translate and format commands.
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    translate_command: Vec<String>,
    format_command: Vec<String>,
}

impl CommandToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        Self {
            translate_command: config.translate_command.clone(),
            format_command: config.format_command.clone(),
        }
    }

    async fn run(argv: &[String], source: &str) -> Result<String, ToolchainError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ToolchainError::Failed("empty toolchain command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        tracing::debug!(program = %program, pid = ?child.id(), "Toolchain command spawned");

        // stdin is fed while stdout and stderr are drained.
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            stdin.write_all(source.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        match fed {
            Ok(()) => {}
            // Child exited without reading all input; its exit status decides.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Err(e) => return Err(ToolchainError::Io(e)),
        }

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics: Vec<String> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if diagnostics.is_empty() {
            Err(ToolchainError::Failed(format!("{} exited with {}", program, output.status)))
        } else {
            Err(ToolchainError::Diagnostics(diagnostics))
        }
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn format(&self, source: &str) -> Result<String, ToolchainError> {
        Self::run(&self.format_command, source).await
    }

    async fn translate(&self, source: &str) -> Result<String, ToolchainError> {
        Self::run(&self.translate_command, source).await
    }
}
