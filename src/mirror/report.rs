/// Per-image results of a mirror run
use std::fmt;

use crate::image::SkipReason;

/// Result of mirroring one manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Pushed {
        source: String,
        destination: String,
    },
    Skipped {
        image: String,
        reason: SkipReason,
    },
    Failed {
        source: String,
        destination: String,
        error: String,
    },
}

impl fmt::Display for ImageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageOutcome::Pushed {
                source,
                destination,
            } => write!(f, "[OK] {} → {}", source, destination),
            ImageOutcome::Skipped { image, reason } => write!(f, "[SKIP] {:?}: {}", image, reason),
            ImageOutcome::Failed {
                source,
                destination,
                error,
            } => write!(f, "[FAIL] {} → {}: {}", source, destination, error),
        }
    }
}

/// Outcomes of a batch, in manifest order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ImageOutcome>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: ImageOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn pushed(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::Pushed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ImageOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Sources of the images that failed
    pub fn failed_images(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ImageOutcome::Failed { source, .. } => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&ImageOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}
