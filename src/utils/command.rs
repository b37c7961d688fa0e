/// Command execution utilities to reduce code duplication
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Result from command execution with captured output
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandOutput {
    /// Create from tokio Command output
    fn from_output(output: std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }

    /// Return trimmed stdout if successful, otherwise error with stderr
    pub fn into_result(self) -> Result<String> {
        if self.success {
            Ok(self.stdout.trim().to_string())
        } else {
            anyhow::bail!("{}", self.stderr.trim())
        }
    }
}

/// Builder for executing external commands with common patterns
pub struct CommandBuilder {
    command: Command,
    display: Vec<String>,
    sensitive: bool,
    context_msg: Option<String>,
}

impl CommandBuilder {
    /// Create a new command builder
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        let display = vec![program.as_ref().to_string_lossy().into_owned()];
        let mut command = Command::new(program);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        Self {
            command,
            display,
            sensitive: false,
            context_msg: None,
        }
    }

    /// Add a single argument
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.display.push(arg.as_ref().to_string_lossy().into_owned());
        self.command.arg(arg);
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Keep arguments out of the logs (they carry credentials)
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Set context message for error reporting
    pub fn context<S: Into<String>>(mut self, msg: S) -> Self {
        self.context_msg = Some(msg.into());
        self
    }

    /// Command line as it appears in logs
    pub fn display(&self) -> String {
        if self.sensitive {
            format!("{} <redacted>", self.display[0])
        } else {
            self.display.join(" ")
        }
    }

    /// Execute and return raw output
    pub async fn output(mut self) -> Result<CommandOutput> {
        debug!("Running command: {}", self.display());
        let output = if let Some(ctx) = &self.context_msg {
            self.command.output().await.context(ctx.clone())?
        } else {
            self.command.output().await?
        };
        Ok(CommandOutput::from_output(output))
    }

    /// Execute and return stdout on success, error on failure
    pub async fn run(self) -> Result<String> {
        let line = self.display();
        self.output()
            .await?
            .into_result()
            .with_context(|| format!("Command failed: {}", line))
    }

    /// Execute and ignore output (just check success)
    pub async fn run_silent(self) -> Result<()> {
        self.run().await.map(|_| ())
    }
}

/// Check if a command-line tool is installed
pub async fn check_tool_installed(
    tool_name: &str,
    version_args: &[&str],
    install_url: &str,
) -> Result<()> {
    let output = CommandBuilder::new(tool_name)
        .args(version_args)
        .output()
        .await;

    match output {
        Ok(out) if out.success => Ok(()),
        _ => anyhow::bail!(
            "{} is not installed or not in PATH. Please install from {}",
            tool_name,
            install_url
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_builder_basic() {
        // Test with a simple command that should exist on all systems
        let result = CommandBuilder::new("echo")
            .arg("test")
            .context("Testing echo command")
            .output()
            .await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.success);
        assert!(output.stdout.contains("test"));
    }

    #[tokio::test]
    async fn test_run_reports_stderr_on_failure() {
        let err = CommandBuilder::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .run()
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("Command failed: sh -c"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_sensitive_display_hides_arguments() {
        let builder = CommandBuilder::new("docker")
            .args(["login", "harbor.local", "-u", "admin", "-p", "hunter2"])
            .sensitive();

        assert_eq!(builder.display(), "docker <redacted>");

        let plain = CommandBuilder::new("docker").args(["pull", "nginx:latest"]);
        assert_eq!(plain.display(), "docker pull nginx:latest");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let result =
            check_tool_installed("definitely-not-a-real-tool-xyz", &["--version"], "https://example.com").await;
        assert!(result.is_err());
    }
}
