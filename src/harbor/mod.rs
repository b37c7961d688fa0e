/// Harbor registry API
pub mod client;
pub mod project;

pub use client::HarborClient;
pub use project::ensure_project_exists;
