/// Image reference handling
pub mod plan;
pub mod reference;

pub use plan::{MirrorTarget, PushPlan, SkipReason};
