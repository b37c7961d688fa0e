/// The `images.yaml` manifest shared by the scanner and the mirror
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MANIFEST: &str = "images.yaml";

/// List of images to mirror
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageManifest {
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

/// One manifest entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    #[serde(default)]
    pub name: Option<String>,
}

impl ImageManifest {
    /// Build a manifest; entries are emitted in iteration order
    pub fn from_images<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: images
                .into_iter()
                .map(|name| ImageEntry {
                    name: Some(name.into()),
                })
                .collect(),
        }
    }

    /// Load a manifest from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("{} not found", path.display());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse image manifest {}", path.display()))
    }

    /// Write the manifest as YAML
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Image names in manifest order; entries without a name yield ""
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(|entry| entry.name.as_deref().unwrap_or_default())
    }
}
