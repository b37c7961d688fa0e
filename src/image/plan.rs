/// Source to destination mapping for a single mirrored image
use std::fmt;

use super::reference::{compute_destination, is_digest, normalize, normalize_with_tag};

/// Registry and project images are mirrored into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    pub registry: String,
    pub project: String,
}

impl MirrorTarget {
    pub fn new(registry: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            project: project.into(),
        }
    }
}

/// Why an image was left out of a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Manifest entry without a name
    EmptyName,
    /// Digest-pinned reference, cannot be retagged
    Digest,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyName => write!(f, "empty image name"),
            SkipReason::Digest => write!(f, "digest-based image (cannot retag)"),
        }
    }
}

/// A pull/tag/push step for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPlan {
    pub source: String,
    pub destination: String,
}

impl PushPlan {
    /// Plan a manifest entry, defaulting untagged references to `latest`
    pub fn for_image(image: &str, target: &MirrorTarget) -> Result<Self, SkipReason> {
        if image.trim().is_empty() {
            return Err(SkipReason::EmptyName);
        }
        Self::from_normalized(normalize(image), target)
    }

    /// Plan an ad-hoc image whose tag is supplied separately
    pub fn for_tagged(image: &str, tag: &str, target: &MirrorTarget) -> Result<Self, SkipReason> {
        if image.trim().is_empty() {
            return Err(SkipReason::EmptyName);
        }
        Self::from_normalized(normalize_with_tag(image, tag), target)
    }

    fn from_normalized(source: String, target: &MirrorTarget) -> Result<Self, SkipReason> {
        if is_digest(&source) {
            return Err(SkipReason::Digest);
        }
        let destination = compute_destination(&source, &target.registry, &target.project);
        Ok(Self {
            source,
            destination,
        })
    }
}
