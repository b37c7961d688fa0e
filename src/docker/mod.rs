/// Container runtime access through the `docker` CLI
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::utils::command::{check_tool_installed, CommandBuilder};

/// Operations needed to mirror an image
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Authenticate against a registry
    async fn login(&self, registry: &str, username: &str, password: &str) -> Result<()>;

    /// Pull an image from its source registry
    async fn pull(&self, image: &str) -> Result<()>;

    /// Add `target` as another name for `source`
    async fn tag(&self, source: &str, target: &str) -> Result<()>;

    /// Push an image to its registry
    async fn push(&self, image: &str) -> Result<()>;
}

/// `docker` command-line client
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    /// Create a client for the given docker binary
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check if docker is installed
    pub async fn check_installed(&self) -> Result<()> {
        check_tool_installed(
            &self.binary,
            &["--version"],
            "https://docs.docker.com/engine/install/",
        )
        .await
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn login(&self, registry: &str, username: &str, password: &str) -> Result<()> {
        info!("Logging into Harbor...");

        CommandBuilder::new(&self.binary)
            .args(["login", registry, "-u", username, "-p", password])
            .sensitive()
            .context(format!("Failed to run docker login for {}", registry))
            .run_silent()
            .await?;

        info!("Docker login successful.");
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<()> {
        CommandBuilder::new(&self.binary)
            .args(["pull", image])
            .context("Failed to run docker pull")
            .run_silent()
            .await
    }

    async fn tag(&self, source: &str, target: &str) -> Result<()> {
        CommandBuilder::new(&self.binary)
            .args(["tag", source, target])
            .context("Failed to run docker tag")
            .run_silent()
            .await
    }

    async fn push(&self, image: &str) -> Result<()> {
        CommandBuilder::new(&self.binary)
            .args(["push", image])
            .context("Failed to run docker push")
            .run_silent()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_fails_every_step() {
        let docker = DockerCli::new("definitely-not-docker-xyz");

        assert!(docker.check_installed().await.is_err());
        assert!(docker.pull("nginx:latest").await.is_err());
        assert!(docker
            .tag("nginx:latest", "harbor.local/mirror/nginx:latest")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        // `false` ignores its arguments and exits 1
        let runtime = DockerCli::new("false");
        let err = runtime.push("harbor.local/mirror/nginx:latest").await.unwrap_err();
        assert!(format!("{:#}", err).contains("Command failed: false push"));
    }

    #[tokio::test]
    async fn test_successful_steps() {
        // `true` ignores its arguments and exits 0
        let runtime = DockerCli::new("true");
        assert!(runtime.login("harbor.local", "admin", "secret").await.is_ok());
        assert!(runtime.pull("nginx:latest").await.is_ok());
    }
}
