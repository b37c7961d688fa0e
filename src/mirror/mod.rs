/// Mirroring images into the target registry
pub mod report;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::docker::ContainerRuntime;
use crate::image::{MirrorTarget, PushPlan, SkipReason};
use crate::scanner::ImageManifest;

pub use report::{BatchReport, ImageOutcome};

/// Drives pull/tag/push for images through a container runtime
pub struct Mirror<R: ContainerRuntime> {
    runtime: R,
    target: MirrorTarget,
}

impl<R: ContainerRuntime> Mirror<R> {
    /// Create a new mirror
    pub fn new(runtime: R, target: MirrorTarget) -> Self {
        Self { runtime, target }
    }

    /// Log into the target registry
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.runtime
            .login(&self.target.registry, username, password)
            .await
            .context("Docker login failed")
    }

    /// Pull, tag and push a planned image
    pub async fn push_plan(&self, plan: &PushPlan) -> Result<()> {
        info!("Pushing → {}  →  {}", plan.source, plan.destination);

        self.runtime.pull(&plan.source).await?;
        self.runtime.tag(&plan.source, &plan.destination).await?;
        self.runtime.push(&plan.destination).await?;

        info!("[OK] {} → {}", plan.source, plan.destination);
        Ok(())
    }

    /// Mirror every manifest entry in order.
    ///
    /// A failing image is recorded and the batch moves on to the next one.
    pub async fn push_all(&self, manifest: &ImageManifest) -> BatchReport {
        info!("Found {} images to process.", manifest.images.len());
        let mut report = BatchReport::default();

        for name in manifest.names() {
            let plan = match PushPlan::for_image(name, &self.target) {
                Ok(plan) => plan,
                Err(reason) => {
                    if reason == SkipReason::Digest {
                        warn!("Skipping digest-based image (cannot retag): {}", name.trim());
                    }
                    report.record(ImageOutcome::Skipped {
                        image: name.trim().to_string(),
                        reason,
                    });
                    continue;
                }
            };

            match self.push_plan(&plan).await {
                Ok(()) => report.record(ImageOutcome::Pushed {
                    source: plan.source,
                    destination: plan.destination,
                }),
                Err(e) => {
                    error!("[ERROR] {}: {:#}", plan.source, e);
                    report.record(ImageOutcome::Failed {
                        source: plan.source,
                        destination: plan.destination,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            "Processed {} images: {} pushed, {} skipped, {} failed",
            report.outcomes.len(),
            report.pushed(),
            report.skipped(),
            report.failed()
        );
        report
    }

    /// Push one image with an explicit tag; any failure is returned
    pub async fn push_single(&self, image: &str, tag: &str) -> Result<PushPlan> {
        let plan = PushPlan::for_tagged(image, tag, &self.target)
            .map_err(|reason| anyhow::anyhow!("Cannot push {:?}: {}", image.trim(), reason))?;

        self.push_plan(&plan)
            .await
            .with_context(|| format!("[ERROR] {}", plan.source))?;
        Ok(plan)
    }
}
