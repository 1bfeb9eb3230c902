// Clipboard access through external programs (wl-copy, xclip, pbcopy)
use crate::application::platform::{ClipboardService, ExportError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClipboard {
    /// `command` is `[program, args...]`; an empty command yields `None`
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: COMMAND_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn failure(&self, reason: impl Into<String>) -> ExportError {
        ExportError::Strategy {
            strategy: self.program.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ClipboardService for CommandClipboard {
    fn name(&self) -> &str {
        &self.program
    }

    async fn write_text(&self, text: &str) -> Result<(), ExportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(e.to_string()))?;

        let exchange = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(text.as_bytes())
                    .await
                    .map_err(|e| self.failure(e.to_string()))?;
                // closing stdin lets the program finish
            }
            let status = child.wait().await?;
            Ok::<_, ExportError>(status)
        };

        // the timeout covers the stdin write as well as the exit
        let status = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| self.failure("timed out"))??;

        if status.success() {
            Ok(())
        } else {
            Err(self.failure(format!("exited with {}", status)))
        }
    }
}
