//! External-command provider: the prompt goes to a program's stdin and the
//! completion is read from its stdout.
//!
//! Works with any local CLI that behaves this way, e.g. `ollama run llama3.2`
//! or `llm -m gpt-4o-mini`.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use lectern_core::config::ProviderConfig;
use lectern_core::error::{LecternError, Result};
use lectern_core::traits::Provider;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub struct CommandProvider {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        Self {
            name: format!("command:{program}"),
            program,
            args,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        if config.command.trim().is_empty() {
            return Err(LecternError::Config("provider.command is empty".into()));
        }
        Ok(Self::new(
            shellexpand::tilde(&config.command).to_string(),
            config.args.clone(),
        )
        .with_timeout(Duration::from_secs(config.timeout_secs.max(1))))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    LecternError::Provider(format!("{} not found", self.program))
                }
                _ => LecternError::Provider(format!("failed to start {}: {e}", self.program)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program may exit without reading its input; its exit status decides.
            let written = match stdin.write_all(prompt.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(LecternError::Provider(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(LecternError::Provider(format!(
                "{} returned an empty completion",
                self.program
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for CommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!("🤖 {} ← {} chars", self.name, prompt.len());
        match tokio::time::timeout(self.timeout, self.run(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LecternError::Provider(format!(
                "{} timed out after {}s",
                self.program,
                self.timeout.as_secs()
            ))),
        }
    }
}
